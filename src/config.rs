//! Configuration file and environment overrides
//!
//! Read from `$XDG_CONFIG_HOME/taxas/config.toml` when present. Every field
//! is optional:
//!
//! ```toml
//! base_url = "http://www.ipeadata.gov.br/api/odata4"
//! timeout_secs = 30
//! data_dir = "/srv/ipeadata-exports"
//!
//! [series]
//! cdi = "BM12_TJCDI12"
//! ```
//!
//! `TAXAS_BASE_URL` and `TAXAS_DATA_DIR` override the file.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::provider::ipea::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use crate::rates::SeriesCodes;

const CONFIG_FILENAME: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Ipeadata OData root
    pub base_url: String,
    pub timeout_secs: u64,
    /// Read series from CSV exports in this directory instead of Ipeadata
    pub data_dir: Option<PathBuf>,
    pub series: SeriesCodes,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            data_dir: None,
            series: SeriesCodes::default(),
        }
    }
}

pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(dir_spec::config_home)
        .ok_or_else(|| anyhow!("Could not determine config directory"))?;
    Ok(config_dir.join("taxas"))
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config file")
    }

    /// Load `path`, or the default config file when `path` is `None`.
    ///
    /// An explicit path must exist; a missing default file means defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (get_config_dir()?.join(CONFIG_FILENAME), false),
        };

        if !path.exists() {
            if required {
                return Err(anyhow!("Config file not found: {}", path.display()));
            }
            debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        debug!("Loading config from {}", path.display());
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Apply `TAXAS_*` overrides looked up through `lookup`
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup("TAXAS_BASE_URL").filter(|v| !v.is_empty()) {
            self.base_url = url;
        }
        if let Some(dir) = lookup("TAXAS_DATA_DIR").filter(|v| !v.is_empty()) {
            self.data_dir = Some(PathBuf::from(dir));
        }
        self
    }
}
