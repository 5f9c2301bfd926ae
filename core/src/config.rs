use crate::error::{DiffError, Result};
use crate::staging::DEFAULT_PAGE_SIZE;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the project-local configuration file
pub const CONFIG_FILE_NAME: &str = "tablediff.toml";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub staging: StagingConfig,
    #[serde(default)]
    pub compare: CompareConfig,
}

/// Where and how the external sort spills batches to disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StagingConfig {
    /// Parent directory for per-merge staging directories (system temp dir if unset)
    pub directory: Option<PathBuf>,

    /// Rows decoded per page when reading a staged chunk back
    pub page_size: usize,

    /// Name prefix of the per-merge staging directory
    pub prefix: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareConfig {
    /// Sort inputs before comparing (disable only for pre-sorted inputs)
    pub sort: bool,

    /// Rows per batch when loading inputs for the external sort (None = single table)
    pub batch_size: Option<usize>,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            directory: None,
            page_size: DEFAULT_PAGE_SIZE,
            prefix: "tablediff-".to_string(),
        }
    }
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            sort: true,
            batch_size: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.staging.page_size == 0 {
            return Err(DiffError::Config(
                "staging.page_size must be greater than zero".to_string(),
            ));
        }
        if self.compare.batch_size == Some(0) {
            return Err(DiffError::Config(
                "compare.batch_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply TABLEDIFF_* environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(dir) = env::var("TABLEDIFF_STAGING_DIR") {
            self.staging.directory = Some(PathBuf::from(dir));
        }
        if let Ok(page_size) = env::var("TABLEDIFF_PAGE_SIZE") {
            self.staging.page_size = page_size.parse().map_err(|_| {
                DiffError::Config(format!("TABLEDIFF_PAGE_SIZE is not a number: {page_size}"))
            })?;
        }
        if let Ok(batch_size) = env::var("TABLEDIFF_BATCH_SIZE") {
            let parsed = batch_size.parse().map_err(|_| {
                DiffError::Config(format!("TABLEDIFF_BATCH_SIZE is not a number: {batch_size}"))
            })?;
            self.compare.batch_size = Some(parsed);
        }
        self.validate()
    }
}

pub fn get_config() -> Result<Config> {
    // Priority order (highest to lowest):
    // 1. Explicit config file via TABLEDIFF_CONFIG env var
    // 2. Local config file (tablediff.toml)
    // 3. Default configuration
    // Environment overrides are applied on top of whichever was found.

    let mut config = if let Ok(config_path) = env::var("TABLEDIFF_CONFIG") {
        Config::load_from_file(Path::new(&config_path))?
    } else {
        let local_config_path = env::current_dir()?.join(CONFIG_FILE_NAME);
        if local_config_path.exists() {
            log::debug!("Loading config from {}", local_config_path.display());
            Config::load_from_file(&local_config_path)?
        } else {
            Config::default()
        }
    };

    config.apply_env_overrides()?;
    Ok(config)
}
