//! # Structured Logging Module
//!
//! Environment-aware structured logging for the slow-check runtime.
//!
//! Filter precedence: `TALLY_LOG`, then `RUST_LOG`, then a level derived from
//! `TALLY_ENV` (`debug` for development and test, `info` for production).
//! `TALLY_LOG_FORMAT=json` switches the console output to JSON lines.

use crate::constants::env as env_keys;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Output format for log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Initialize structured logging once per process
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let filter = get_log_filter(&environment);
        let format = get_log_format();

        let layer = match format {
            LogFormat::Json => fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .json()
                .with_filter(EnvFilter::new(&filter))
                .boxed(),
            LogFormat::Pretty => fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true)
                .with_filter(EnvFilter::new(&filter))
                .boxed(),
        };

        // An existing global subscriber (e.g. an embedding tool's) is fine
        if tracing_subscriber::registry().with(layer).try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized");
            return;
        }

        tracing::debug!(
            environment = %environment,
            filter = %filter,
            format = ?format,
            "Structured logging initialized"
        );
    });
}

fn get_environment() -> String {
    std::env::var(env_keys::ENVIRONMENT).unwrap_or_else(|_| "development".to_string())
}

fn get_log_filter(environment: &str) -> String {
    std::env::var(env_keys::LOG_FILTER)
        .or_else(|_| std::env::var("RUST_LOG"))
        .ok()
        .filter(|filter| !filter.trim().is_empty())
        .unwrap_or_else(|| get_log_level(environment).to_string())
}

fn get_log_format() -> LogFormat {
    parse_log_format(std::env::var(env_keys::LOG_FORMAT).ok().as_deref())
}

fn parse_log_format(value: Option<&str>) -> LogFormat {
    match value {
        Some(v) if v.trim().eq_ignore_ascii_case("json") => LogFormat::Json,
        _ => LogFormat::Pretty,
    }
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> &'static str {
    match environment {
        "production" => "info",
        _ => "debug",
    }
}
