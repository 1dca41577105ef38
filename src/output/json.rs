//! JSON serialization for attack reports and progress events.

use crate::attack::AttackEvent;
use crate::result::AttackReport;

/// Serialize an AttackReport to a compact JSON string.
///
/// # Errors
///
/// Returns an error if serialization fails (should not happen for AttackReport).
pub fn to_json(report: &AttackReport) -> Result<String, serde_json::Error> {
    serde_json::to_string(report)
}

/// Serialize an AttackReport to a pretty-printed JSON string.
///
/// # Errors
///
/// Returns an error if serialization fails (should not happen for AttackReport).
pub fn to_json_pretty(report: &AttackReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

/// Serialize one progress event as a single JSON line.
pub fn event_to_json(event: &AttackEvent) -> Result<String, serde_json::Error> {
    serde_json::to_string(event)
}
