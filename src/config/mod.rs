//! Application configuration.
//!
//! Aggregates the rate table, bonus plan, storage and batch settings into a
//! single Config struct that can be loaded from YAML files or environment
//! variables.

mod storage;

pub use storage::{SqliteConfig, StorageConfig, StorageType};

use serde::Deserialize;

use crate::attainment::{BonusConfig, BonusPlan};
use crate::error::Result;
use crate::rates::{RateTable, RateTableConfig};

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "commission.yaml";
/// Environment variable for configuration file path.
pub const CONFIG_ENV_VAR: &str = "COMMISSION_CONFIG";
/// Prefix for configuration environment variables.
pub const CONFIG_ENV_PREFIX: &str = "COMMISSION";
/// Environment variable for logging configuration.
pub const LOG_ENV_VAR: &str = "COMMISSION_LOG";
/// Default number of entries written per store batch.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 400;

/// Bulk recalculation settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Upper bound on entries per atomic store write.
    pub max_batch_size: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Versioned commission rate table.
    pub rate_table: RateTableConfig,
    /// Quarterly bonus plan.
    pub bonus: BonusConfig,
    /// Bulk recalculation settings.
    pub batch: BatchConfig,
}

impl Config {
    /// Load configuration from file and environment.
    ///
    /// Configuration sources (in order of priority, later overrides earlier):
    /// 1. `commission.yaml` in current directory (if exists)
    /// 2. File specified by `path` argument (if provided)
    /// 3. File specified by `COMMISSION_CONFIG` environment variable (if set)
    /// 4. Environment variables with `COMMISSION__` prefix
    pub fn load(path: Option<&str>) -> std::result::Result<Self, Box<dyn std::error::Error>> {
        use ::config::{Config as ConfigLib, Environment, File, FileFormat};

        let mut builder = ConfigLib::builder()
            .add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false));

        if let Some(config_path) = path {
            builder = builder.add_source(File::new(config_path, FileFormat::Yaml).required(true));
        }

        if let Ok(config_path) = std::env::var(CONFIG_ENV_VAR) {
            builder = builder.add_source(File::new(&config_path, FileFormat::Yaml).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        Ok(config)
    }

    /// Validated rate table. Fails if any (title, segment, status) is
    /// unreachable.
    pub fn rate_table(&self) -> Result<RateTable> {
        RateTable::from_config(&self.rate_table)
    }

    /// Validated bonus plan.
    pub fn bonus_plan(&self) -> Result<BonusPlan> {
        BonusPlan::from_config(&self.bonus)
    }
}
