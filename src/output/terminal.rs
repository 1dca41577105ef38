//! Terminal output formatting with colors and box drawing.

use colored::Colorize;

use crate::attack::RecoveryState;
use crate::result::AttackReport;
use crate::types::{byte_hex, AttackPhase, ByteTiming, Digest};

const BAR_WIDTH: usize = 40;

/// Format an AttackReport for human-readable terminal output.
///
/// The actual signature is shown only when `reveal` is set.
pub fn format_report(report: &AttackReport, reveal: bool) -> String {
    let mut output = String::new();
    let sep = "\u{2500}".repeat(62);

    output.push_str("hmac-timing-attack\n");
    output.push_str(&sep);
    output.push('\n');
    output.push('\n');

    output.push_str(&format!(
        "  Delay: {} ms per matching byte, {} samples per candidate\n",
        report.delay_per_byte_ms, report.samples_per_byte
    ));
    output.push_str(&format!(
        "  Comparator calls: {} in {:.1} s\n",
        report.comparator_calls,
        report.elapsed_ms / 1_000.0
    ));
    output.push('\n');

    let actual = if reveal {
        report.actual.to_hex()
    } else {
        report.actual.masked()
    };
    output.push_str(&format!("    Correct signature:   {}\n", actual));
    output.push_str(&format!(
        "    Recovered signature: {}\n",
        highlight_recovered(&report.recovered, &report.actual)
    ));
    output.push_str(&format!(
        "    Correct bytes:       {}/{}\n",
        report.correct_bytes,
        report.actual.len()
    ));
    output.push('\n');

    if report.success {
        output.push_str(&format!(
            "  {}\n",
            "\u{2713} Attack successful! Signature recovered.".green().bold()
        ));
    } else {
        output.push_str(&format!(
            "  {}\n",
            "\u{2717} Attack failed! Signature mismatch.".red().bold()
        ));
    }

    output.push('\n');
    output.push_str(&sep);
    output.push('\n');

    output
}

/// One-line status, e.g. `Status: RUNNING  Testing byte 3 of 20  [####....]`.
pub fn format_progress(state: &RecoveryState) -> String {
    let mut line = format!("Status: {}", format_phase(state.phase()));

    if state.phase() == AttackPhase::Running {
        let filled = (state.progress() * 20.0).round() as usize;
        line.push_str(&format!(
            "  Testing byte {} of {}  [{}{}]",
            (state.current_byte() + 1).min(state.total_bytes()),
            state.total_bytes(),
            "#".repeat(filled).cyan(),
            ".".repeat(20 - filled.min(20))
        ));
    }

    let recovered = state.recovered_hex();
    line.push_str(&format!(
        "  Recovered: {}",
        if recovered.is_empty() { "..." } else { recovered.as_str() }
    ));

    if let Some(message) = state.message() {
        line.push_str(&format!("  ({})", message.red()));
    }

    line
}

/// Horizontal bar chart of the `top` slowest candidates at one position.
///
/// `best` is drawn in a highlight color.
pub fn format_timing_chart(timings: &[ByteTiming], best: Option<u8>, top: usize) -> String {
    let mut ranked: Vec<ByteTiming> = timings.to_vec();
    // Stable sort keeps candidate order among equal latencies
    ranked.sort_by(|a, b| b.time_ms.total_cmp(&a.time_ms));
    ranked.truncate(top);

    let max = ranked.first().map(|t| t.time_ms).unwrap_or(0.0);
    let mut output = String::new();

    for timing in &ranked {
        let len = if max > 0.0 {
            ((timing.time_ms / max) * BAR_WIDTH as f64).round() as usize
        } else {
            0
        };
        let bar = "\u{2588}".repeat(len);
        let bar = if Some(timing.byte) == best {
            bar.cyan().bold().to_string()
        } else {
            bar.dimmed().to_string()
        };
        output.push_str(&format!(
            "  {} {:>9.3} ms {}\n",
            byte_hex(timing.byte),
            timing.time_ms,
            bar
        ));
    }

    output
}

/// Format AttackPhase for display.
fn format_phase(phase: AttackPhase) -> String {
    let label = phase.to_string().to_uppercase();
    match phase {
        AttackPhase::Idle => label.dimmed().to_string(),
        AttackPhase::Running => label.yellow().to_string(),
        AttackPhase::Complete => label.green().to_string(),
        AttackPhase::Error => label.red().to_string(),
    }
}

/// Recovered hex with correct bytes in green and wrong bytes in red.
fn highlight_recovered(recovered: &Digest, actual: &Digest) -> String {
    recovered
        .as_bytes()
        .iter()
        .enumerate()
        .map(|(i, b)| {
            let hex = byte_hex(*b);
            if actual.as_bytes().get(i) == Some(b) {
                hex.green().to_string()
            } else {
                hex.red().to_string()
            }
        })
        .collect()
}
