//! Session controller behaviour: single active run, events, snapshots,
//! cancellation through configuration changes.

use hmac_timing_attack::{
    digest, AttackEvent, AttackPhase, AttackSession, Config, Error, SessionOutcome,
    DEFAULT_MESSAGE,
};

fn quick_session() -> AttackSession {
    AttackSession::new(Config::quick().secret("k").message("m")).unwrap()
}

#[tokio::test(start_paused = true)]
async fn quick_run_recovers_signature_and_completes() {
    let mut session = quick_session();
    let snapshots = session.subscribe();

    let handle = session.start().unwrap();
    assert!(session.is_active());

    let outcome = handle.join().await.unwrap();
    let report = outcome.report().expect("run should complete").clone();

    assert!(report.success);
    assert_eq!(report.recovered, digest::compute(b"k", b"m"));
    assert_eq!(report.comparator_calls, 20 * 256 * 3);
    assert_eq!(report.samples_per_byte, 3);
    assert!(report.elapsed_ms > 0.0);

    assert!(!session.is_active());
    let state = snapshots.borrow().clone();
    assert_eq!(state.phase(), AttackPhase::Complete);
    assert_eq!(state.recovered(), report.recovered);
    assert_eq!(state.progress(), 1.0);
}

#[tokio::test(start_paused = true)]
async fn event_stream_follows_the_run() {
    let mut session = quick_session();
    let mut handle = session.start().unwrap();

    let mut events = Vec::new();
    while let Some(event) = handle.next_event().await {
        events.push(event);
    }
    let outcome = handle.join().await.unwrap();
    assert!(matches!(outcome, SessionOutcome::Completed(ref r) if r.success));

    assert_eq!(
        events.first(),
        Some(&AttackEvent::PhaseChanged {
            phase: AttackPhase::Running
        })
    );
    assert_eq!(
        events.last(),
        Some(&AttackEvent::PhaseChanged {
            phase: AttackPhase::Complete
        })
    );

    let started = events
        .iter()
        .filter(|e| matches!(e, AttackEvent::ByteStarted { .. }))
        .count();
    let timed = events
        .iter()
        .filter(|e| matches!(e, AttackEvent::CandidateTimed { .. }))
        .count();
    let resolved: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            AttackEvent::ByteResolved { recovered, .. } => Some(recovered.len()),
            _ => None,
        })
        .collect();

    assert_eq!(started, 20);
    assert_eq!(timed, 20 * 256);
    assert_eq!(resolved, (1..=20).collect::<Vec<_>>());
    assert!(!events.iter().any(|e| matches!(e, AttackEvent::Failed { .. })));
}

#[tokio::test(start_paused = true)]
async fn second_start_is_rejected_while_active() {
    let mut session = quick_session();
    let handle = session.start().unwrap();

    assert_eq!(session.start().unwrap_err(), Error::AlreadyRunning);

    handle.cancel();
    let outcome = handle.join().await.unwrap();
    assert!(outcome.is_cancelled());
    assert!(!session.is_active());
    assert_eq!(session.snapshot().phase(), AttackPhase::Idle);

    // Idle again, so a new run is accepted
    let handle = session.start().unwrap();
    session.cancel();
    assert!(handle.join().await.unwrap().is_cancelled());
}

#[tokio::test(start_paused = true)]
async fn changing_the_message_cancels_the_run() {
    let mut session = quick_session();
    let mut handle = session.start().unwrap();

    // Let a couple of bytes resolve first
    while let Some(event) = handle.next_event().await {
        if let AttackEvent::ByteResolved { position: 1, .. } = event {
            break;
        }
    }

    session.set_message("a different message");
    assert_eq!(session.digest(), &digest::compute(b"k", b"a different message"));

    match handle.join().await.unwrap() {
        SessionOutcome::Cancelled { recovered_prefix } => {
            let old = digest::compute(b"k", b"m");
            assert!(recovered_prefix.len() >= 2);
            assert_eq!(
                recovered_prefix.as_bytes(),
                &old.as_bytes()[..recovered_prefix.len()]
            );
        }
        other => panic!("expected cancellation, got {:?}", other),
    }

    assert!(!session.is_active());
    let state = session.snapshot();
    assert_eq!(state.phase(), AttackPhase::Idle);
    assert!(state.recovered().is_empty());
}

#[tokio::test(start_paused = true)]
async fn reset_restores_default_message_and_allows_new_run() {
    let mut session = quick_session();
    let handle = session.start().unwrap();

    session.reset();
    assert!(handle.join().await.unwrap().is_cancelled());
    assert_eq!(session.config().message, DEFAULT_MESSAGE);
    assert_eq!(
        session.digest(),
        &digest::compute(b"k", DEFAULT_MESSAGE.as_bytes())
    );

    session.set_samples_per_byte(1).unwrap();
    let outcome = session.start().unwrap().join().await.unwrap();
    assert!(matches!(outcome, SessionOutcome::Completed(ref r) if r.success));
}

async fn wait_for_byte(handle: &mut hmac_timing_attack::AttackHandle, position: usize) {
    while let Some(event) = handle.next_event().await {
        if matches!(event, AttackEvent::ByteResolved { position: p, .. } if p == position) {
            return;
        }
    }
    panic!("run ended before byte {} resolved", position);
}

#[tokio::test(start_paused = true)]
async fn start_is_accepted_immediately_after_reset() {
    let mut session = quick_session();
    let snapshots = session.subscribe();
    let mut first = session.start().unwrap();
    wait_for_byte(&mut first, 1).await;

    session.reset();
    assert!(!session.is_active());
    assert_eq!(session.snapshot().phase(), AttackPhase::Idle);

    let second = session.start().unwrap();
    assert!(session.is_active());

    assert!(first.join().await.unwrap().is_cancelled());
    let outcome = second.join().await.unwrap();
    let report = outcome.report().expect("second run should complete");

    assert!(report.success);
    assert_eq!(report.actual, digest::compute(b"k", DEFAULT_MESSAGE.as_bytes()));
    assert_eq!(report.comparator_calls, 20 * 256 * 3);
    assert!(!session.is_active());
    assert_eq!(snapshots.borrow().phase(), AttackPhase::Complete);
    assert_eq!(snapshots.borrow().recovered(), report.actual);
}

#[tokio::test(start_paused = true)]
async fn start_is_accepted_immediately_after_message_change() {
    let mut session = quick_session();
    let mut first = session.start().unwrap();
    wait_for_byte(&mut first, 0).await;

    session.set_message("next");
    assert!(!session.is_active());
    let mut second = session.start().unwrap();
    assert_eq!(session.start().unwrap_err(), Error::AlreadyRunning);

    // The retired run must be gone before the new one times anything
    let mut first_events = 0;
    while first.next_event().await.is_some() {
        first_events += 1;
    }
    assert!(first_events < 256 + 4, "retired run kept going: {}", first_events);
    assert!(first.join().await.unwrap().is_cancelled());

    assert_eq!(
        second.next_event().await,
        Some(AttackEvent::PhaseChanged {
            phase: AttackPhase::Running
        })
    );
    let outcome = second.join().await.unwrap();
    let report = outcome.report().expect("second run should complete");
    assert!(report.success);
    assert_eq!(report.recovered, digest::compute(b"k", b"next"));
}

#[tokio::test]
async fn zero_delay_run_can_be_cancelled() {
    let config = Config::default()
        .secret("k")
        .message("m")
        .delay_per_byte_ms(0.0)
        .samples_per_byte(20);
    let mut session = AttackSession::new(config).unwrap();
    let mut handle = session.start().unwrap();

    assert!(handle.next_event().await.is_some());
    handle.cancel();

    let mut remaining = 0;
    while handle.next_event().await.is_some() {
        remaining += 1;
    }
    assert!(remaining < 256, "run ignored cancellation: {} more events", remaining);
    assert!(handle.join().await.unwrap().is_cancelled());
    assert_eq!(session.snapshot().phase(), AttackPhase::Idle);
}
