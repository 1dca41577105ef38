//! Digest, timing record and phase types.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

/// A keyed digest, or a candidate signature shaped like one.
///
/// Externally a digest is always lowercase hex with two digits per byte.
/// An empty digest means "not yet computed" and blocks attack actions.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Digest(Vec<u8>);

impl Digest {
    /// The "not yet computed" digest.
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Decode a hex string into a digest.
    ///
    /// Accepts upper or lower case; the digest always re-encodes as lowercase.
    pub fn from_hex(s: &str) -> Result<Self> {
        hex::decode(s)
            .map(Self)
            .map_err(|e| Error::InvalidHex(format!("{:?}: {}", s, e)))
    }

    /// Lowercase hex encoding, `2 * len()` characters.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Placeholder used when the correct signature should not be revealed.
    pub fn masked(&self) -> String {
        "*".repeat(self.0.len() * 2)
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Digest length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether this is the "not yet computed" digest.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for Digest {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for Digest {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Digest::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Two-digit lowercase hex for a single byte.
pub fn byte_hex(byte: u8) -> String {
    format!("{:02x}", byte)
}

fn serialize_byte_hex<S: Serializer>(byte: &u8, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&byte_hex(*byte))
}

/// Aggregated latency for one candidate byte at the position under attack.
///
/// Serializes as `{"byte": "0a", "time": 12.5}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ByteTiming {
    /// Candidate byte value.
    #[serde(serialize_with = "serialize_byte_hex")]
    pub byte: u8,
    /// Median comparator latency in milliseconds.
    #[serde(rename = "time")]
    pub time_ms: f64,
}

impl ByteTiming {
    /// Create a new record.
    pub fn new(byte: u8, time_ms: f64) -> Self {
        Self { byte, time_ms }
    }
}

/// Lifecycle phase of an attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttackPhase {
    /// No run in progress; initial state and the state after cancellation.
    #[default]
    Idle,
    /// Recovering bytes.
    Running,
    /// Every position resolved.
    Complete,
    /// The run was refused or aborted by an error.
    Error,
}

impl AttackPhase {
    /// Complete and Error can only be left through an explicit reset.
    pub fn is_terminal(self) -> bool {
        matches!(self, AttackPhase::Complete | AttackPhase::Error)
    }
}

impl fmt::Display for AttackPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AttackPhase::Idle => "idle",
            AttackPhase::Running => "running",
            AttackPhase::Complete => "complete",
            AttackPhase::Error => "error",
        };
        f.write_str(s)
    }
}
