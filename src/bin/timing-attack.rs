//! Command-line front end for the timing attack simulator.
//!
//! # Usage
//!
//! ```bash
//! # Default configuration (25 ms per byte, 5 samples; slow but reliable)
//! cargo run --bin timing-attack
//!
//! # Fast run with a custom message, showing the timing chart per byte
//! cargo run --bin timing-attack -- --quick --message "hello" --chart
//!
//! # Load settings from JSON and print the report as JSON
//! cargo run --bin timing-attack -- --config attack.json --json
//! ```
//!
//! Progress goes to stderr, the final report to stdout. Ctrl-C stops the
//! attack at the next candidate.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use hmac_timing_attack::output::{format_progress, format_report, format_timing_chart, to_json_pretty};
use hmac_timing_attack::{AttackEvent, AttackSession, ByteTiming, Config, SessionOutcome};

/// Byte-at-a-time timing attack against a leaky HMAC-SHA1 comparison
#[derive(Parser, Debug)]
#[command(name = "timing-attack")]
#[command(about = "Recover an HMAC-SHA1 signature through response-time analysis")]
#[command(version)]
struct Args {
    /// JSON configuration file (flags override its values)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Start from the quick preset (1 ms per byte, 3 samples)
    #[arg(long)]
    quick: bool,

    /// Secret HMAC key held by the victim
    #[arg(long)]
    secret: Option<String>,

    /// Message whose signature is recovered
    #[arg(short, long)]
    message: Option<String>,

    /// Comparator delay per matching byte in milliseconds
    #[arg(short, long)]
    delay_ms: Option<f64>,

    /// Timed comparator calls per candidate byte
    #[arg(short, long)]
    samples: Option<usize>,

    /// Print the correct signature instead of masking it
    #[arg(long)]
    show_digest: bool,

    /// Print the slowest candidates after each resolved byte
    #[arg(long)]
    chart: bool,

    /// Print the final report as JSON
    #[arg(long)]
    json: bool,
}

impl Args {
    fn to_config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None if self.quick => Config::quick(),
            None => Config::default(),
        };
        if let Some(secret) = &self.secret {
            config = config.secret(secret.clone());
        }
        if let Some(message) = &self.message {
            config = config.message(message.clone());
        }
        if let Some(ms) = self.delay_ms {
            config = config.delay_per_byte_ms(ms);
        }
        if let Some(n) = self.samples {
            config = config.samples_per_byte(n);
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = args.to_config()?;

    let mut session = AttackSession::new(config).context("failed to set up attack session")?;
    let snapshots = session.subscribe();
    let mut handle = session.start()?;

    let mut last_timings: Vec<ByteTiming> = Vec::new();
    let mut last_best = None;
    let mut stderr = std::io::stderr();

    loop {
        tokio::select! {
            event = handle.next_event() => {
                let Some(event) = event else { break };
                match event {
                    AttackEvent::CandidateTimed { timings, best, .. } => {
                        last_timings = timings;
                        last_best = best;
                    }
                    AttackEvent::ByteResolved { .. } => {
                        if args.chart {
                            eprintln!();
                            eprint!("{}", format_timing_chart(&last_timings, last_best, 8));
                        }
                    }
                    AttackEvent::Failed { message } => {
                        eprintln!("\nattack failed: {}", message);
                    }
                    AttackEvent::PhaseChanged { .. } | AttackEvent::ByteStarted { .. } => {}
                }
                let _ = write!(stderr, "\r{}", format_progress(&snapshots.borrow()));
                let _ = stderr.flush();
            }
            _ = tokio::signal::ctrl_c() => {
                eprintln!("\ncancelling...");
                handle.cancel();
            }
        }
    }
    eprintln!();

    match handle.join().await? {
        SessionOutcome::Completed(report) => {
            if args.json {
                println!("{}", to_json_pretty(&report)?);
            } else {
                print!("{}", format_report(&report, args.show_digest));
            }
            if !report.success {
                std::process::exit(1);
            }
        }
        SessionOutcome::Cancelled { recovered_prefix } => {
            println!("Attack cancelled after {} bytes: {}", recovered_prefix.len(), recovered_prefix);
        }
    }

    Ok(())
}
