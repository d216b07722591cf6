//! Configuration types for taxalink

use crate::TaxaError;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Escalate keys the local store could not resolve to the remote authority
    #[serde(default = "default_remote_fallback")]
    pub remote_fallback: bool,
    /// Deadline covering a whole batch (store and remote phases), in milliseconds
    #[serde(default)]
    pub deadline_ms: Option<u64>,
    /// Hard bound on parent-chain walks
    #[serde(default = "default_max_lineage_depth")]
    pub max_lineage_depth: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the remote authority; remote lookups are disabled when unset
    #[serde(default)]
    pub base_url: Option<String>,
    /// Contact address sent with every request, required by the authority's usage policy
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default = "default_tool")]
    pub tool: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoreConfig {
    /// Directory with nodes.dmp / names.dmp / merged.dmp (defaults to TAXALINK_HOME/taxonomy)
    #[serde(default)]
    pub taxonomy_dir: Option<String>,
    /// accession2taxid tables, plain or gzip compressed
    #[serde(default)]
    pub accession_files: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_remote_fallback() -> bool { false }
fn default_max_lineage_depth() -> usize { 256 }
fn default_tool() -> String { "taxalink".to_string() }
fn default_timeout_secs() -> u64 { 30 }
fn default_max_batch_size() -> usize { 10_000 }
fn default_max_attempts() -> u32 { 3 }
fn default_initial_backoff_ms() -> u64 { 1000 }
fn default_max_backoff_ms() -> u64 { 30_000 }
fn default_log_level() -> String { "warn".to_string() }

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            remote_fallback: default_remote_fallback(),
            deadline_ms: None,
            max_lineage_depth: default_max_lineage_depth(),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            email: None,
            tool: default_tool(),
            timeout_secs: default_timeout_secs(),
            max_batch_size: default_max_batch_size(),
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl RemoteConfig {
    /// A remote client can only be built when both the endpoint and the contact are known
    pub fn is_configured(&self) -> bool {
        self.base_url.is_some() && self.email.is_some()
    }
}

pub fn default_config() -> Config {
    Config::default()
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, TaxaError> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)
        .map_err(|e| TaxaError::Configuration(format!("Failed to parse config: {}", e)))?;
    Ok(config)
}

/// Load the config at `path` if it exists, defaults otherwise
pub fn load_config_or_default<P: AsRef<Path>>(path: P) -> Result<Config, TaxaError> {
    if path.as_ref().exists() {
        load_config(path)
    } else {
        Ok(Config::default())
    }
}

pub fn save_config<P: AsRef<Path>>(path: P, config: &Config) -> Result<(), TaxaError> {
    let contents = toml::to_string_pretty(config)
        .map_err(|e| TaxaError::Configuration(format!("Failed to serialize config: {}", e)))?;
    std::fs::write(path, contents)?;
    Ok(())
}
