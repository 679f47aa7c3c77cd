//! # System Constants
//!
//! Defaults and identifiers that define the operational boundaries of the
//! slow-check runtime.

use std::time::Duration;

/// Concurrency used when the configured limit is unset or not positive
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Run-wide budget applied when no per-file slow-check timeout is larger
pub const DEFAULT_SLOW_CHECK_TIMEOUT: Duration = Duration::from_secs(20);

/// Duration string matching [`DEFAULT_SLOW_CHECK_TIMEOUT`]
pub const DEFAULT_SLOW_CHECK_TIMEOUT_STR: &str = "20s";

/// Resolver identifiers
pub mod resolvers {
    /// Resolver id for registry-based image resolution
    pub const REGISTRY: &str = "registry";
}

/// Retry defaults for registry lookups
pub mod retry {
    /// 1 original attempt + 2 retries
    pub const MAX_ATTEMPTS: u32 = 3;
    pub const INITIAL_INTERVAL_MS: u64 = 500;
    pub const MAX_INTERVAL_MS: u64 = 5_000;
    pub const MULTIPLIER: f64 = 2.0;
    pub const RANDOMIZATION_FACTOR: f64 = 0.5;
}

/// Environment variables read by the logging and configuration layers
pub mod env {
    pub const ENVIRONMENT: &str = "TALLY_ENV";
    pub const LOG_FILTER: &str = "TALLY_LOG";
    pub const LOG_FORMAT: &str = "TALLY_LOG_FORMAT";
    pub const CONFIG_PREFIX: &str = "TALLY";
    pub const CONFIG_SEPARATOR: &str = "__";
}
