//! Timing behaviour of the vulnerable comparator and the sampler.
//!
//! All tests run on a paused tokio clock, so every sleep advances virtual
//! time by exactly its duration and latencies can be compared exactly.

use std::time::Duration;

use hmac_timing_attack::comparator::matched_prefix_len;
use hmac_timing_attack::measurement::{estimate, Timer};
use hmac_timing_attack::{digest, insecure_compare, Digest, VulnerableComparator};
use rand::Rng;

const DELAY: Duration = Duration::from_millis(3);

fn rand_digest(len: usize) -> Vec<u8> {
    let mut rng = rand::rng();
    (0..len).map(|_| rng.random()).collect()
}

// ============================================================================
// Leak shape
// ============================================================================

/// Latency equals matched prefix length times the delay, for every prefix length.
#[tokio::test(start_paused = true)]
async fn latency_is_matched_prefix_times_delay() {
    let reference = rand_digest(20);
    let timer = Timer::new();

    for k in 0..=20usize {
        let mut candidate = reference.clone();
        if k < 20 {
            candidate[k] ^= 0x01;
        }

        let (matched, ms) = timer
            .measure_ms(insecure_compare(&reference, &candidate, DELAY))
            .await;

        assert_eq!(matched_prefix_len(&reference, &candidate), k);
        assert_eq!(matched, k == 20, "prefix {}", k);
        assert_eq!(ms, (k as f64) * 3.0, "prefix {}", k);
    }
}

/// Random equal-length pairs: true iff equal, latency tracks the shared prefix.
#[tokio::test(start_paused = true)]
async fn random_pairs_match_iff_equal() {
    let timer = Timer::new();
    for _ in 0..50 {
        let a = rand_digest(20);
        let mut b = a.clone();
        let split = rand::rng().random_range(0..=20usize);
        for byte in b.iter_mut().skip(split) {
            *byte = rand::random();
        }

        let (matched, ms) = timer.measure_ms(insecure_compare(&a, &b, DELAY)).await;
        let k = matched_prefix_len(&a, &b);

        assert_eq!(matched, a == b);
        assert_eq!(ms, k as f64 * 3.0);
    }
}

/// Unequal lengths return false without sleeping, even if one is a prefix of the other.
#[tokio::test(start_paused = true)]
async fn unequal_lengths_are_rejected_immediately() {
    let timer = Timer::new();
    let reference = rand_digest(20);

    for len in [0usize, 1, 19, 21, 40] {
        let mut candidate = reference.clone();
        candidate.resize(len, 0);
        let (matched, ms) = timer
            .measure_ms(insecure_compare(&reference, &candidate, DELAY))
            .await;
        assert!(!matched, "len {}", len);
        assert_eq!(ms, 0.0, "len {}", len);
    }
}

// ============================================================================
// Sampler
// ============================================================================

/// The median over several samples equals the single-call latency on a quiet clock.
#[tokio::test(start_paused = true)]
async fn sampler_median_on_real_digest() {
    let reference = digest::compute(b"k", b"m");
    let oracle = VulnerableComparator::new(reference.clone(), DELAY);

    let mut candidate = vec![0u8; 20];
    candidate[..5].copy_from_slice(&reference.as_bytes()[..5]);
    if candidate[5] == reference.as_bytes()[5] {
        candidate[5] ^= 0xff;
    }

    assert_eq!(estimate(&oracle, &candidate, 5).await, 15.0);
    assert_eq!(estimate(&oracle, reference.as_bytes(), 4).await, 60.0);
    assert_eq!(estimate(&oracle, &candidate, 0).await, 0.0);
}

/// An empty reference never matches and never sleeps.
#[tokio::test(start_paused = true)]
async fn empty_reference_never_matches() {
    let oracle = VulnerableComparator::new(Digest::empty(), DELAY);
    assert_eq!(estimate(&oracle, &[0u8; 20], 3).await, 0.0);
}

/// On the real clock the leak is still visible: a longer prefix is slower.
#[tokio::test]
async fn real_clock_longer_prefix_is_slower() {
    let reference = rand_digest(8);
    let oracle = VulnerableComparator::new(Digest::from(reference.clone()), Duration::from_millis(5));

    let mut short = vec![0u8; 8];
    short[0] = reference[0] ^ 0x01;
    let mut long = reference.clone();
    long[4] ^= 0x01;

    let fast = estimate(&oracle, &short, 3).await;
    let slow = estimate(&oracle, &long, 3).await;

    eprintln!("[real_clock_longer_prefix_is_slower] fast={:.3}ms slow={:.3}ms", fast, slow);
    assert!(slow >= 20.0, "slow = {}", slow);
    assert!(slow > fast, "fast = {}, slow = {}", fast, slow);
}
