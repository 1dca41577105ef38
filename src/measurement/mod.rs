//! Measurement infrastructure for the attack.
//!
//! This module provides:
//! - Wall-clock timing of async comparator calls on the tokio clock
//! - A sampler that repeats a measurement and reduces it to a median

mod sampler;
mod timer;

pub use sampler::{estimate, Sampler};
pub use timer::{black_box, elapsed_ms, Timer};
