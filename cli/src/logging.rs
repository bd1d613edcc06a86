//! # Structured Logging
//!
//! Installs the `tracing` subscriber for one CLI invocation. Output always
//! goes to stderr so stdout carries only command results, including
//! `--json` output meant for piping.
//!
//! The default filter is scoped to the two vault crates and raised with
//! `-v`. Storage internals stay at `warn`. `RUST_LOG`, when set, replaces
//! the whole filter.

use clap::ValueEnum;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Crates whose events the default filter admits at the chosen level.
const VAULT_TARGETS: [&str; 2] = ["tokenvault", "tokenvault_contracts"];

/// Log output format, selected with `--log-format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines without targets.
    Pretty,
    /// One JSON object per event, carrying the call's structured fields.
    Json,
}

/// Level for the vault crates given the number of `-v` flags.
fn vault_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Filter directives used when `RUST_LOG` is unset.
pub fn default_directives(verbose: u8) -> String {
    let level = vault_level(verbose);
    let mut directives: Vec<String> = VAULT_TARGETS.iter().map(|target| format!("{target}={level}")).collect();
    directives.push("sled=warn".to_string());
    directives.join(",")
}

/// Initialize the global tracing subscriber. Call once, before the command
/// runs.
pub fn init_logging(format: LogFormat, verbose: u8) {
    let directives = default_directives(verbose);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&directives));

    match format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr).with_target(false).compact())
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .with_current_span(false),
                )
                .init();
        }
    }

    tracing::debug!(format = ?format, %directives, "logging initialized");
}
