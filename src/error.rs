//! Error type shared by the digest service, attack engine and session.

use crate::types::AttackPhase;

/// Errors surfaced to callers of the attack pipeline.
///
/// Length mismatches inside the comparator and cooperative cancellation are
/// deliberately absent: the former is a plain non-match and the latter ends a
/// run with [`RunOutcome::Cancelled`](crate::attack::RunOutcome::Cancelled).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// The keyed digest could not be computed, so there is nothing to attack.
    #[error("reference digest is unavailable; refusing to start the attack")]
    DigestUnavailable,

    /// A run is already in flight for this session.
    #[error("an attack is already running")]
    AlreadyRunning,

    /// The engine finished (or failed) and must be reset before another run.
    #[error("attack is {0}; reset before starting again")]
    TerminalState(AttackPhase),

    /// Configuration rejected by [`Config::validate`](crate::Config::validate).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Input that was expected to be lowercase hex was not.
    #[error("invalid hex digest: {0}")]
    InvalidHex(String),

    /// The background attack task panicked or was aborted.
    #[error("attack task failed: {0}")]
    Join(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
