//! The vulnerable signature comparator.
//!
//! [`insecure_compare`] walks both signatures left to right, sleeping once for
//! every matching byte and returning at the first mismatch. Its latency is
//! therefore `matched_prefix_len * delay`, which is exactly what the attack
//! engine measures.

use std::future::Future;
use std::time::Duration;

use crate::types::Digest;

/// Something that accepts or rejects candidate signatures and can be timed.
///
/// The attack engine only ever talks to the victim through this trait, so
/// tests can substitute oracles with synthetic latency profiles.
pub trait Oracle {
    /// Length in bytes of the signature the oracle checks against.
    ///
    /// Zero means the reference digest is unavailable.
    fn digest_len(&self) -> usize;

    /// Check `candidate` against the reference signature.
    fn compare(&self, candidate: &[u8]) -> impl Future<Output = bool> + Send;
}

/// Byte-at-a-time comparison with a delay per matching byte.
///
/// Returns `false` immediately on a length mismatch, `false` at the first
/// differing byte, and `true` only if every byte matched.
pub async fn insecure_compare(reference: &[u8], candidate: &[u8], delay_per_matched_byte: Duration) -> bool {
    if reference.len() != candidate.len() {
        return false;
    }

    for (r, c) in reference.iter().zip(candidate) {
        if r != c {
            return false;
        }
        if delay_per_matched_byte.is_zero() {
            // Still suspend, so a zero-delay run never monopolises the runtime
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(delay_per_matched_byte).await;
        }
    }

    true
}

/// The victim: a reference digest plus the per-byte delay it leaks.
#[derive(Debug, Clone)]
pub struct VulnerableComparator {
    reference: Digest,
    delay: Duration,
}

impl VulnerableComparator {
    /// Create a comparator for `reference`.
    pub fn new(reference: Digest, delay_per_matched_byte: Duration) -> Self {
        Self {
            reference,
            delay: delay_per_matched_byte,
        }
    }

    /// The digest being protected.
    pub fn reference(&self) -> &Digest {
        &self.reference
    }

    /// Delay added for each matching byte.
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Oracle for VulnerableComparator {
    fn digest_len(&self) -> usize {
        self.reference.len()
    }

    fn compare(&self, candidate: &[u8]) -> impl Future<Output = bool> + Send {
        insecure_compare(self.reference.as_bytes(), candidate, self.delay)
    }
}

/// Number of leading bytes shared by `a` and `b`.
pub fn matched_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}
