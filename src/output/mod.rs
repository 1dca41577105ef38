//! Output formatting for attack results.

mod json;
mod terminal;

pub use json::{event_to_json, to_json, to_json_pretty};
pub use terminal::{format_progress, format_report, format_timing_chart};
