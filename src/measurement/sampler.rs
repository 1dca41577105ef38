//! Repeated timing of one candidate, reduced to a median.
//!
//! Samples are taken strictly one after another. Running them concurrently
//! would put several comparator calls in flight at once and let scheduler
//! contention leak into every measurement.

use crate::comparator::Oracle;
use crate::statistics::median_in_place;

use super::timer::Timer;

/// Issues timed comparator calls and aggregates them.
#[derive(Debug)]
pub struct Sampler<'a, O> {
    oracle: &'a O,
    timer: Timer,
    samples_per_candidate: usize,
    /// Reused across candidates to avoid an allocation per estimate.
    buffer: Vec<f64>,
    calls: u64,
}

impl<'a, O: Oracle> Sampler<'a, O> {
    /// Create a sampler taking `samples_per_candidate` measurements per estimate.
    pub fn new(oracle: &'a O, samples_per_candidate: usize) -> Self {
        Self {
            oracle,
            timer: Timer::new(),
            samples_per_candidate,
            buffer: Vec::with_capacity(samples_per_candidate),
            calls: 0,
        }
    }

    /// Measurements taken per estimate.
    pub fn samples_per_candidate(&self) -> usize {
        self.samples_per_candidate
    }

    /// Total comparator calls issued so far.
    pub fn calls(&self) -> u64 {
        self.calls
    }

    /// Median latency in milliseconds of `candidate` against the oracle.
    ///
    /// With zero samples configured no call is made and 0.0 is returned.
    pub async fn estimate(&mut self, candidate: &[u8]) -> f64 {
        self.buffer.clear();

        for _ in 0..self.samples_per_candidate {
            let (_, ms) = self.timer.measure_ms(self.oracle.compare(candidate)).await;
            self.calls += 1;
            self.buffer.push(ms);
        }

        median_in_place(&mut self.buffer)
    }
}

/// One-shot form of [`Sampler::estimate`].
pub async fn estimate<O: Oracle>(oracle: &O, candidate: &[u8], sample_count: usize) -> f64 {
    Sampler::new(oracle, sample_count).estimate(candidate).await
}
