//! # Tally Configuration System
//!
//! Settings for slow checks, the runtime, and registry retries.
//!
//! ## Sources (later wins)
//!
//! 1. Built-in defaults
//! 2. TOML files, in the order given (missing files are skipped)
//! 3. `TALLY_` environment variables, `__` separating nested keys
//!    (`TALLY_SLOW_CHECKS__MODE=off`, `TALLY_RUNTIME__CONCURRENCY=8`)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tally_slow_checks::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load_from_files(&[".tally.toml"])?;
//!
//! let runtime = manager.config().runtime.clone();
//! let slow_checks = &manager.config().slow_checks;
//! println!("concurrency={} mode={:?}", runtime.concurrency, slow_checks.mode);
//! # Ok(())
//! # }
//! ```

pub mod ci;
pub mod duration;
pub mod error;
pub mod loader;

pub use ci::CiEnvironment;
pub use duration::{format_duration, parse_duration};
pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

use crate::checks::RuntimeConfig;
use crate::constants::DEFAULT_SLOW_CHECK_TIMEOUT_STR;
use crate::resilience::BackoffConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TallyConfig {
    pub slow_checks: SlowChecksConfig,
    pub runtime: RuntimeConfig,
    pub retry: BackoffConfig,
}

impl TallyConfig {
    /// Check every section, reporting the first invalid value
    pub fn validate(&self) -> ConfigResult<()> {
        self.slow_checks.validate()?;

        self.retry.validate().map_err(|context| {
            ConfigurationError::invalid_value(
                "retry",
                format!("{:?}", self.retry),
                context,
            )
        })?;

        Ok(())
    }
}

/// When slow checks run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlowChecksMode {
    /// Run unless a CI system is detected
    #[default]
    Auto,
    On,
    Off,
}

impl SlowChecksMode {
    /// Whether slow checks run under this mode given the detected CI system
    pub fn enabled(&self, ci: Option<CiEnvironment>) -> bool {
        match self {
            SlowChecksMode::On => true,
            SlowChecksMode::Off => false,
            SlowChecksMode::Auto => ci.is_none(),
        }
    }
}

/// Per-file slow-check policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlowChecksConfig {
    pub mode: SlowChecksMode,
    /// Skip slow checks for files whose fast checks already found errors
    pub fail_fast: bool,
    /// Per-request budget as a duration string
    pub timeout: String,
}

impl Default for SlowChecksConfig {
    fn default() -> Self {
        Self {
            mode: SlowChecksMode::Auto,
            fail_fast: true,
            timeout: DEFAULT_SLOW_CHECK_TIMEOUT_STR.to_string(),
        }
    }
}

impl SlowChecksConfig {
    /// The timeout when it parses to a positive duration
    pub fn timeout_duration(&self) -> Option<Duration> {
        parse_duration(&self.timeout)
            .ok()
            .filter(|timeout| !timeout.is_zero())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if !self.timeout.trim().is_empty() {
            parse_duration(&self.timeout).map_err(|context| {
                ConfigurationError::invalid_value(
                    "slow_checks.timeout",
                    self.timeout.clone(),
                    context,
                )
            })?;
        }
        Ok(())
    }
}
