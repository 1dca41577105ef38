//! Wall-clock timing of asynchronous operations.
//!
//! Durations are read from `tokio::time::Instant`, so a runtime with a paused
//! clock (`start_paused = true` or `tokio::time::pause()`) gives exact,
//! noise-free measurements of the comparator's sleeps.

use std::future::Future;
use std::hint::black_box as std_black_box;

use tokio::time::Instant;

/// Wrapper around `std::hint::black_box` for preventing compiler optimizations.
#[inline]
pub fn black_box<T>(x: T) -> T {
    std_black_box(x)
}

/// Timer for measuring how long a future takes to complete.
#[derive(Debug, Clone, Copy, Default)]
pub struct Timer;

impl Timer {
    /// Create a new timer.
    pub fn new() -> Self {
        Self
    }

    /// Await `fut` and return its output with the elapsed time in milliseconds.
    pub async fn measure_ms<F>(&self, fut: F) -> (F::Output, f64)
    where
        F: Future,
    {
        let start = Instant::now();
        let output = black_box(fut.await);
        (output, elapsed_ms(start))
    }
}

/// Milliseconds elapsed since `start`, as a float.
///
/// Whole milliseconds convert exactly.
#[inline]
pub fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_nanos() as f64 / 1_000_000.0
}
