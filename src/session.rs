//! Session controller tying configuration, digest and attack runs together.
//!
//! A front end owns one [`AttackSession`]. It edits the configuration,
//! starts runs, listens to their events and cancels or resets them. The
//! session keeps the reference digest in sync with the secret and message
//! and guarantees at most one run at a time.
//!
//! A configuration change or [`AttackSession::reset`] retires the current run
//! on the spot: the session is immediately idle and ready to start again.
//! The retired task stops at its next candidate boundary, no longer
//! publishes snapshots, and a new run waits for it to finish before issuing
//! its first comparator call, so two runs never time the oracle at once.

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::attack::{AttackEngine, AttackEvent, RecoveryState, RunOutcome};
use crate::comparator::{Oracle, VulnerableComparator};
use crate::config::{Config, DEFAULT_MESSAGE};
use crate::digest;
use crate::error::{Error, Result};
use crate::measurement::elapsed_ms;
use crate::result::{AttackReport, SessionOutcome};
use crate::types::Digest;

/// Stateful controller for attack runs.
#[derive(Debug)]
pub struct AttackSession {
    config: Config,
    digest: Digest,
    snapshots: watch::Sender<RecoveryState>,
    run: Option<RunTokens>,
}

/// Control tokens of the most recently started run.
#[derive(Debug)]
struct RunTokens {
    /// Fired by the user to stop the run; the run then publishes its idle state.
    cancel: CancellationToken,
    /// Fired by the session; also cancels `cancel` and detaches snapshots.
    retired: CancellationToken,
    /// Fired when the run task ends, including by panic.
    finished: CancellationToken,
}

impl AttackSession {
    /// Create a session, computing the reference digest for `config`.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let digest = digest::compute(config.secret.as_bytes(), config.message.as_bytes());
        let (snapshots, _) = watch::channel(RecoveryState::new(digest.len()));
        Ok(Self {
            config,
            digest,
            snapshots,
            run: None,
        })
    }

    /// Current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The real signature of the configured message. Empty if unavailable.
    pub fn digest(&self) -> &Digest {
        &self.digest
    }

    /// Whether a run is in flight.
    pub fn is_active(&self) -> bool {
        self.run
            .as_ref()
            .is_some_and(|run| !run.retired.is_cancelled() && !run.finished.is_cancelled())
    }

    /// Latest published recovery state.
    pub fn snapshot(&self) -> RecoveryState {
        self.snapshots.borrow().clone()
    }

    /// Receive every future recovery state.
    pub fn subscribe(&self) -> watch::Receiver<RecoveryState> {
        self.snapshots.subscribe()
    }

    /// Change the secret. Recomputes the digest and resets the attack.
    pub fn set_secret(&mut self, secret: impl Into<String>) {
        self.config.secret = secret.into();
        self.refresh();
    }

    /// Change the message. Recomputes the digest and resets the attack.
    pub fn set_message(&mut self, message: impl Into<String>) {
        self.config.message = message.into();
        self.refresh();
    }

    /// Change the comparator delay. Resets the attack.
    pub fn set_delay_per_byte_ms(&mut self, ms: f64) -> Result<()> {
        let updated = self.config.clone().delay_per_byte_ms(ms);
        updated.validate()?;
        self.config = updated;
        self.refresh();
        Ok(())
    }

    /// Change the samples per candidate. Resets the attack.
    pub fn set_samples_per_byte(&mut self, n: usize) -> Result<()> {
        let updated = self.config.clone().samples_per_byte(n);
        updated.validate()?;
        self.config = updated;
        self.refresh();
        Ok(())
    }

    /// Start a run on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// - [`Error::DigestUnavailable`] if the digest is empty (the published
    ///   state moves to `Error`).
    /// - [`Error::AlreadyRunning`] if a previous run is still active. A run
    ///   retired by a config change or [`reset`](Self::reset) does not count.
    pub fn start(&mut self) -> Result<AttackHandle> {
        if self.digest.is_empty() {
            let mut state = RecoveryState::new(0);
            state.fail(Error::DigestUnavailable.to_string());
            self.snapshots.send_replace(state);
            tracing::warn!("start refused: digest unavailable");
            return Err(Error::DigestUnavailable);
        }

        if self.is_active() {
            return Err(Error::AlreadyRunning);
        }
        let previous = self.run.take().map(|run| run.finished);

        let retired = CancellationToken::new();
        let cancel = retired.child_token();
        let finished = CancellationToken::new();

        let (tx, rx) = mpsc::unbounded_channel();
        let engine = AttackEngine::new()
            .with_events(tx)
            .with_snapshots(self.snapshots.clone())
            .detach_snapshots_on(retired.clone());
        let oracle = VulnerableComparator::new(self.digest.clone(), self.config.delay());
        let config = self.config.clone();
        let token = cancel.clone();
        let done = finished.clone().drop_guard();

        let task = tokio::spawn(async move {
            let _done = done;
            if let Some(previous) = previous {
                previous.cancelled().await;
            }
            let actual = oracle.reference().clone();
            execute(engine, &oracle, &actual, &config, &token).await
        });

        self.run = Some(RunTokens {
            cancel: cancel.clone(),
            retired,
            finished,
        });

        Ok(AttackHandle {
            events: rx,
            cancel,
            task,
        })
    }

    /// Ask the in-flight run, if any, to stop at the next candidate.
    pub fn cancel(&self) {
        if let Some(run) = &self.run {
            run.cancel.cancel();
        }
    }

    /// Cancel any run, restore the default message and clear the state.
    pub fn reset(&mut self) {
        self.config.message = DEFAULT_MESSAGE.to_string();
        self.refresh();
    }

    fn refresh(&mut self) {
        // Retire before publishing, so the old run cannot overwrite the fresh state
        if let Some(run) = &self.run {
            run.retired.cancel();
        }
        self.digest = digest::compute(self.config.secret.as_bytes(), self.config.message.as_bytes());
        self.snapshots.send_replace(RecoveryState::new(self.digest.len()));
    }
}

/// A run started by [`AttackSession::start`].
#[derive(Debug)]
pub struct AttackHandle {
    /// Progress events; closes when the run ends.
    pub events: mpsc::UnboundedReceiver<AttackEvent>,
    cancel: CancellationToken,
    task: JoinHandle<Result<SessionOutcome>>,
}

impl AttackHandle {
    /// Next progress event, or `None` once the run has ended.
    pub async fn next_event(&mut self) -> Option<AttackEvent> {
        self.events.recv().await
    }

    /// Ask the run to stop at the next candidate.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token controlling this run.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Wait for the run to end.
    pub async fn join(self) -> Result<SessionOutcome> {
        self.task.await.map_err(|e| Error::Join(e.to_string()))?
    }
}

/// Run `engine` against `oracle` and turn the result into a report.
pub(crate) async fn execute<O: Oracle>(
    mut engine: AttackEngine,
    oracle: &O,
    actual: &Digest,
    config: &Config,
    cancel: &CancellationToken,
) -> Result<SessionOutcome> {
    let started = Instant::now();
    let outcome = engine
        .run(oracle, actual.len(), config.samples_per_byte, cancel)
        .await?;

    Ok(match outcome {
        RunOutcome::Completed {
            recovered,
            comparator_calls,
        } => SessionOutcome::Completed(AttackReport::new(
            recovered,
            actual.clone(),
            comparator_calls,
            elapsed_ms(started),
            config.delay_per_byte_ms,
            config.samples_per_byte,
        )),
        RunOutcome::Cancelled {
            recovered_prefix, ..
        } => SessionOutcome::Cancelled { recovered_prefix },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AttackPhase;

    #[test]
    fn test_new_computes_digest() {
        let session = AttackSession::new(Config::default().secret("k").message("m")).unwrap();
        assert_eq!(session.digest(), &digest::compute(b"k", b"m"));
        assert_eq!(session.snapshot().phase(), AttackPhase::Idle);
        assert_eq!(session.snapshot().total_bytes(), 20);
        assert!(!session.is_active());
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        assert!(AttackSession::new(Config::default().samples_per_byte(0)).is_err());
    }

    #[test]
    fn test_config_changes_recompute_digest() {
        let mut session = AttackSession::new(Config::default().secret("k").message("m")).unwrap();
        let before = session.digest().clone();

        session.set_message("other");
        assert_ne!(session.digest(), &before);
        assert_eq!(session.digest(), &digest::compute(b"k", b"other"));

        session.set_secret("k2");
        assert_eq!(session.digest(), &digest::compute(b"k2", b"other"));
    }

    #[test]
    fn test_tuning_setters_validate() {
        let mut session = AttackSession::new(Config::default()).unwrap();
        assert!(session.set_samples_per_byte(0).is_err());
        assert_eq!(session.config().samples_per_byte, 5);
        assert!(session.set_delay_per_byte_ms(-3.0).is_err());
        session.set_delay_per_byte_ms(2.0).unwrap();
        assert_eq!(session.config().delay_per_byte_ms, 2.0);
    }

    #[test]
    fn test_reset_restores_default_message() {
        let mut session = AttackSession::new(Config::default().message("custom")).unwrap();
        session.reset();
        assert_eq!(session.config().message, DEFAULT_MESSAGE);
        assert_eq!(session.snapshot().phase(), AttackPhase::Idle);
    }
}
