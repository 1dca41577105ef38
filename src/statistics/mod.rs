//! Statistical reduction of timing samples.

mod quantile;

pub use quantile::{compute_quantile, median, median_in_place};
