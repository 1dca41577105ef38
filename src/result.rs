//! Attack report types.

use serde::{Deserialize, Serialize};

use crate::types::Digest;

/// Summary of a finished attack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackReport {
    /// Signature the engine recovered.
    pub recovered: Digest,

    /// The real signature.
    pub actual: Digest,

    /// Whether `recovered == actual`.
    pub success: bool,

    /// Number of positions that were recovered correctly.
    pub correct_bytes: usize,

    /// Comparator calls issued (`positions * 256 * samples_per_byte`).
    pub comparator_calls: u64,

    /// Wall-clock duration of the run in milliseconds.
    pub elapsed_ms: f64,

    /// Delay per matching byte used for the run.
    pub delay_per_byte_ms: f64,

    /// Samples per candidate used for the run.
    pub samples_per_byte: usize,
}

impl AttackReport {
    /// Build a report, comparing `recovered` against `actual`.
    pub fn new(
        recovered: Digest,
        actual: Digest,
        comparator_calls: u64,
        elapsed_ms: f64,
        delay_per_byte_ms: f64,
        samples_per_byte: usize,
    ) -> Self {
        let correct_bytes = recovered
            .as_bytes()
            .iter()
            .zip(actual.as_bytes())
            .filter(|(a, b)| a == b)
            .count();
        Self {
            success: !actual.is_empty() && recovered == actual,
            correct_bytes,
            recovered,
            actual,
            comparator_calls,
            elapsed_ms,
            delay_per_byte_ms,
            samples_per_byte,
        }
    }
}

/// How a session run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    /// Every position was resolved; see [`AttackReport::success`].
    Completed(AttackReport),

    /// The run was cancelled before finishing.
    Cancelled {
        /// Bytes resolved before cancellation.
        recovered_prefix: Digest,
    },
}

impl SessionOutcome {
    /// The report, if the run completed.
    pub fn report(&self) -> Option<&AttackReport> {
        match self {
            SessionOutcome::Completed(report) => Some(report),
            SessionOutcome::Cancelled { .. } => None,
        }
    }

    /// Whether the run was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SessionOutcome::Cancelled { .. })
    }
}
