//! # hmac-timing-attack
//!
//! Simulate a byte-at-a-time timing attack against a non-constant-time
//! HMAC comparison.
//!
//! The victim signs a message with HMAC-SHA1 and checks candidate signatures
//! with [`comparator::insecure_compare`], which sleeps once per matching byte
//! and returns at the first mismatch. The attacker ([`attack::AttackEngine`])
//! times every possible value of the next byte, takes the median of a few
//! samples per candidate and keeps the slowest one. Twenty rounds later it
//! holds the full signature without ever knowing the key.
//!
//! ## Components
//!
//! - [`digest`]: reference HMAC-SHA1 digest
//! - [`comparator`]: the leaky comparison (the oracle)
//! - [`measurement`]: timing and median sampling
//! - [`attack`]: recovery loop, state machine and progress events
//! - [`session`]: controller for front ends (config changes, start, cancel, reset)
//! - [`output`]: terminal and JSON rendering
//!
//! ## Quick Start
//!
//! ```ignore
//! use hmac_timing_attack::{recover_signature, Config, SessionOutcome};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let config = Config::quick().secret("k").message("m");
//!     if let Ok(SessionOutcome::Completed(report)) = recover_signature(&config).await {
//!         println!("recovered {} (success: {})", report.recovered, report.success);
//!     }
//! }
//! ```
//!
//! ## Measurement
//!
//! Every comparator call is timed on the tokio clock and calls never overlap.
//! Under a paused clock (`#[tokio::test(start_paused = true)]`) the measured
//! latency is exactly `matched_prefix_len * delay`, which makes the attack
//! fully deterministic in tests.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
mod config;
mod error;
mod result;
mod types;

// Functional modules
pub mod attack;
pub mod comparator;
pub mod digest;
pub mod measurement;
pub mod output;
pub mod session;
pub mod statistics;

// Re-exports for public API
pub use attack::{AttackEngine, AttackEvent, RecoveryState, RunOutcome};
pub use comparator::{insecure_compare, Oracle, VulnerableComparator};
pub use config::{Config, DEFAULT_MESSAGE, DEFAULT_SECRET};
pub use error::{Error, Result};
pub use result::{AttackReport, SessionOutcome};
pub use session::{AttackHandle, AttackSession};
pub use types::{byte_hex, AttackPhase, ByteTiming, Digest};

use tokio_util::sync::CancellationToken;

/// Run a complete attack for `config` on the current task.
///
/// Computes the digest, recovers it through the vulnerable comparator and
/// reports whether the recovered signature matches. No progress events are
/// emitted; use [`AttackSession`] for live updates and cancellation.
///
/// # Errors
///
/// Returns [`Error::InvalidConfig`] for a rejected configuration and
/// [`Error::DigestUnavailable`] if the digest cannot be computed.
pub async fn recover_signature(config: &Config) -> Result<SessionOutcome> {
    config.validate()?;
    let actual = digest::compute(config.secret.as_bytes(), config.message.as_bytes());
    let oracle = VulnerableComparator::new(actual.clone(), config.delay());
    session::execute(
        AttackEngine::new(),
        &oracle,
        &actual,
        config,
        &CancellationToken::new(),
    )
    .await
}
