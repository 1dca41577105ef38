//! Progress events emitted while an attack runs.

use serde::Serialize;

use crate::types::{byte_hex, AttackPhase, ByteTiming, Digest};

/// A single progress update from the attack engine.
///
/// Events arrive in the order they were produced. `CandidateTimed` carries
/// the full record set for the position so a chart can be redrawn from any
/// single event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AttackEvent {
    /// The engine moved to a new phase.
    PhaseChanged {
        /// New phase.
        phase: AttackPhase,
    },

    /// A new byte position is under attack.
    ByteStarted {
        /// Zero-based position.
        position: usize,
        /// Number of positions in the digest.
        total: usize,
    },

    /// Another candidate was measured at the current position.
    CandidateTimed {
        /// Zero-based position.
        position: usize,
        /// Every record collected at this position so far, in candidate order.
        timings: Vec<ByteTiming>,
        /// Best candidate so far.
        best: Option<u8>,
    },

    /// The byte at `position` was chosen.
    ByteResolved {
        /// Zero-based position.
        position: usize,
        /// Chosen byte.
        byte: u8,
        /// Everything recovered so far, including `byte`.
        recovered: Digest,
    },

    /// The run refused to start or was aborted.
    Failed {
        /// Human-readable reason.
        message: String,
    },
}

impl AttackEvent {
    /// Best candidate of a `CandidateTimed` event as two hex digits.
    pub fn best_hex(&self) -> Option<String> {
        match self {
            AttackEvent::CandidateTimed { best, .. } => best.map(byte_hex),
            _ => None,
        }
    }
}
