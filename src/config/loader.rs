//! Configuration Loader
//!
//! Environment-aware loading: built-in defaults, a base TOML file, an
//! environment-specific TOML file, then environment variables.

use config::{Config, Environment, File, FileFormat};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use super::BoardConfig;
use crate::constants::{DEFAULT_ENVIRONMENT, ENV_PREFIX};
use crate::error::Result;

const BASE_FILE: &str = "taskboard.toml";

#[derive(Debug)]
pub struct ConfigManager {
    config: BoardConfig,
    environment: String,
    config_directory: PathBuf,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load() -> Result<Arc<ConfigManager>> {
        Self::load_from_directory(None)
    }

    /// Load configuration from a specific directory
    pub fn load_from_directory(config_dir: Option<PathBuf>) -> Result<Arc<ConfigManager>> {
        let environment = Self::detect_environment();
        Self::load_from_directory_with_env(config_dir, &environment)
    }

    /// Load configuration from a specific directory with an explicit environment.
    /// Useful in tests that must not touch process environment variables.
    pub fn load_from_directory_with_env(
        config_dir: Option<PathBuf>,
        environment: &str,
    ) -> Result<Arc<ConfigManager>> {
        let config_directory = config_dir.unwrap_or_else(Self::default_config_directory);

        debug!(
            "Loading configuration for environment '{}' from directory: {}",
            environment,
            config_directory.display()
        );

        let config: BoardConfig = Config::builder()
            .add_source(File::from(config_directory.join(BASE_FILE)).required(false))
            .add_source(
                File::from(Self::environment_file(&config_directory, environment))
                    .required(false),
            )
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;

        info!(
            environment = %environment,
            max_tasks = config.executor.max_tasks,
            tick_interval_ms = config.executor.tick_interval_ms,
            "Configuration loaded successfully"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory,
        }))
    }

    /// Parse and validate a configuration from TOML text, applying defaults
    /// for anything it leaves out. Environment variables are not consulted.
    pub fn from_toml_str(toml: &str) -> Result<BoardConfig> {
        let config: BoardConfig = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn into_config(self: Arc<Self>) -> BoardConfig {
        Arc::try_unwrap(self)
            .map(|manager| manager.config)
            .unwrap_or_else(|shared| shared.config.clone())
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn config_directory(&self) -> &Path {
        &self.config_directory
    }

    pub fn detect_environment() -> String {
        env::var("TASKBOARD_ENV").unwrap_or_else(|_| DEFAULT_ENVIRONMENT.to_string())
    }

    fn default_config_directory() -> PathBuf {
        PathBuf::from("config")
    }

    fn environment_file(config_directory: &Path, environment: &str) -> PathBuf {
        config_directory.join(format!("taskboard.{environment}.toml"))
    }
}
