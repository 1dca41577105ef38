//! Configuration for an attack session.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Secret key used when none is configured.
pub const DEFAULT_SECRET: &str = "my-super-secret-key-123";

/// Message signed when none is configured.
pub const DEFAULT_MESSAGE: &str = "This is a test file for the timing attack.";

/// Configuration forwarded from the front end into the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HMAC key held by the victim.
    pub secret: String,

    /// Message whose signature is being recovered.
    pub message: String,

    /// Comparator delay per matching byte in milliseconds (default: 25.0).
    ///
    /// Larger delays raise the signal-to-noise ratio of the oracle at the
    /// cost of wall-clock run time. Zero is allowed and leaves only noise.
    pub delay_per_byte_ms: f64,

    /// Timed comparator calls per candidate byte (default: 5).
    ///
    /// The median of these samples is the candidate's latency estimate.
    pub samples_per_byte: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            secret: DEFAULT_SECRET.to_string(),
            message: DEFAULT_MESSAGE.to_string(),
            delay_per_byte_ms: 25.0,
            samples_per_byte: 5,
        }
    }
}

impl Config {
    /// Fast preset: 1 ms per byte, 3 samples.
    pub fn quick() -> Self {
        Self {
            delay_per_byte_ms: 1.0,
            samples_per_byte: 3,
            ..Self::default()
        }
    }

    /// Slow but robust preset for noisy machines: 50 ms per byte, 9 samples.
    pub fn thorough() -> Self {
        Self {
            delay_per_byte_ms: 50.0,
            samples_per_byte: 9,
            ..Self::default()
        }
    }

    /// Set the secret key.
    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = secret.into();
        self
    }

    /// Set the signed message.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Set the per-matching-byte delay in milliseconds.
    pub fn delay_per_byte_ms(mut self, ms: f64) -> Self {
        self.delay_per_byte_ms = ms;
        self
    }

    /// Set the number of samples per candidate.
    pub fn samples_per_byte(mut self, n: usize) -> Self {
        self.samples_per_byte = n;
        self
    }

    /// The per-byte delay as a `Duration`.
    ///
    /// Call [`validate`](Self::validate) first; invalid values map to zero.
    pub fn delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.delay_per_byte_ms / 1_000.0).unwrap_or(Duration::ZERO)
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if !self.delay_per_byte_ms.is_finite() || self.delay_per_byte_ms < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "delay_per_byte_ms must be a finite, non-negative number (got {})",
                self.delay_per_byte_ms
            )));
        }
        if self.samples_per_byte == 0 {
            return Err(Error::InvalidConfig(
                "samples_per_byte must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse a JSON configuration; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&text)
    }
}
