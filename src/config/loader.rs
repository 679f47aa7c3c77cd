//! Configuration Loader
//!
//! Layers defaults, TOML files and `TALLY_` environment variables with the
//! `config` crate, then validates the merged result.

use super::error::{ConfigResult, ConfigurationError};
use super::TallyConfig;
use crate::constants::env as env_keys;
use config::{Config, Environment, File, FileFormat};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

/// Loaded, validated configuration plus the files it came from
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: TallyConfig,
    sources: Vec<PathBuf>,
}

impl ConfigManager {
    /// Defaults overlaid with the process environment
    pub fn load() -> ConfigResult<ConfigManager> {
        Self::load_from_files::<PathBuf>(&[])
    }

    /// Defaults, then `paths` in order, then the process environment
    pub fn load_from_files<P: AsRef<Path>>(paths: &[P]) -> ConfigResult<ConfigManager> {
        Self::load_with_environment(paths, None)
    }

    /// Like [`ConfigManager::load_from_files`], reading variables from `env`
    /// instead of the process environment when given. Useful for tests.
    pub fn load_with_environment<P: AsRef<Path>>(
        paths: &[P],
        env: Option<HashMap<String, String>>,
    ) -> ConfigResult<ConfigManager> {
        let defaults = Config::try_from(&TallyConfig::default())
            .map_err(|e| ConfigurationError::source_error("defaults", e))?;
        let mut builder = Config::builder().add_source(defaults);

        let mut sources = Vec::new();
        for path in paths {
            let path = path.as_ref();
            if !path.exists() {
                debug!(path = %path.display(), "Skipping missing configuration file");
                continue;
            }
            builder = builder.add_source(File::from(path).format(FileFormat::Toml));
            sources.push(path.to_path_buf());
        }

        builder = builder.add_source(
            Environment::with_prefix(env_keys::CONFIG_PREFIX)
                .prefix_separator("_")
                .separator(env_keys::CONFIG_SEPARATOR)
                .try_parsing(true)
                .source(env),
        );

        let merged = builder.build()?;
        let config: TallyConfig = merged.try_deserialize()?;
        config.validate()?;

        debug!(
            files = sources.len(),
            mode = ?config.slow_checks.mode,
            concurrency = config.runtime.concurrency,
            "Configuration loaded successfully"
        );

        Ok(ConfigManager { config, sources })
    }

    pub fn config(&self) -> &TallyConfig {
        &self.config
    }

    /// Files that contributed, in load order
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    pub fn into_config(self) -> TallyConfig {
        self.config
    }
}

static GLOBAL_CONFIG: OnceLock<Arc<ConfigManager>> = OnceLock::new();

impl ConfigManager {
    /// Process-wide configuration, loaded from the environment on first use.
    /// Falls back to defaults if loading fails.
    pub fn global() -> Arc<ConfigManager> {
        GLOBAL_CONFIG
            .get_or_init(|| {
                Arc::new(ConfigManager::load().unwrap_or_else(|e| {
                    warn!(error = %e, "Configuration loading failed, using defaults");
                    ConfigManager {
                        config: TallyConfig::default(),
                        sources: Vec::new(),
                    }
                }))
            })
            .clone()
    }
}
