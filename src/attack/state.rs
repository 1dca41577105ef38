//! Recovery state and its phase transitions.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::types::{byte_hex, AttackPhase, ByteTiming, Digest};

/// Everything an observer needs to render an attack in progress.
///
/// The attack engine is the only writer. Observers receive clones and must
/// expect them to be stale by the time they look.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecoveryState {
    phase: AttackPhase,
    total_bytes: usize,
    recovered: Vec<u8>,
    current_byte: usize,
    /// Records for the position under attack only.
    timings: Vec<ByteTiming>,
    best: Option<u8>,
    message: Option<String>,
}

impl RecoveryState {
    /// Fresh idle state for a digest of `total_bytes`.
    pub fn new(total_bytes: usize) -> Self {
        Self {
            phase: AttackPhase::Idle,
            total_bytes,
            recovered: Vec::with_capacity(total_bytes),
            current_byte: 0,
            timings: Vec::new(),
            best: None,
            message: None,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> AttackPhase {
        self.phase
    }

    /// Number of positions being recovered.
    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    /// Index of the position under attack.
    pub fn current_byte(&self) -> usize {
        self.current_byte
    }

    /// Bytes recovered so far.
    pub fn recovered(&self) -> Digest {
        Digest::from(self.recovered.as_slice())
    }

    /// Hex of the bytes recovered so far.
    pub fn recovered_hex(&self) -> String {
        hex::encode(&self.recovered)
    }

    /// Candidate timings collected for the current position.
    pub fn timings(&self) -> &[ByteTiming] {
        &self.timings
    }

    /// Best candidate so far at the current position.
    pub fn best(&self) -> Option<u8> {
        self.best
    }

    /// Best candidate as two hex digits.
    pub fn best_hex(&self) -> Option<String> {
        self.best.map(byte_hex)
    }

    /// Human-readable reason for the `Error` phase.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Fraction of positions resolved, in [0, 1].
    pub fn progress(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        self.recovered.len() as f64 / self.total_bytes as f64
    }

    /// `idle -> running`.
    pub(crate) fn begin(&mut self) -> Result<()> {
        match self.phase {
            AttackPhase::Idle => {}
            AttackPhase::Running => return Err(Error::AlreadyRunning),
            terminal => return Err(Error::TerminalState(terminal)),
        }
        let total = self.total_bytes;
        *self = Self::new(total);
        self.phase = AttackPhase::Running;
        Ok(())
    }

    /// Start a new position, discarding the previous position's records.
    pub(crate) fn start_position(&mut self) {
        debug_assert_eq!(self.recovered.len(), self.current_byte);
        self.timings.clear();
        self.best = None;
    }

    pub(crate) fn record(&mut self, timing: ByteTiming, best: Option<u8>) {
        self.timings.push(timing);
        self.best = best;
    }

    /// Append a recovered byte and advance to the next position.
    pub(crate) fn resolve(&mut self, byte: u8) {
        self.recovered.push(byte);
        self.current_byte = self.recovered.len();
    }

    /// `running -> complete`.
    pub(crate) fn complete(&mut self) {
        self.phase = AttackPhase::Complete;
    }

    /// `* -> error`, keeping whatever was recovered.
    pub(crate) fn fail(&mut self, message: impl Into<String>) {
        self.phase = AttackPhase::Error;
        self.message = Some(message.into());
    }

    /// `running -> idle`. Partial progress is discarded.
    pub(crate) fn cancel(&mut self) {
        *self = Self::new(self.total_bytes);
    }

    /// Back to an empty idle state from any phase.
    pub fn reset(&mut self) {
        *self = Self::new(self.total_bytes);
    }
}

impl Default for RecoveryState {
    fn default() -> Self {
        Self::new(0)
    }
}
