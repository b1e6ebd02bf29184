//! Application configuration.
//!
//! Loaded from a `config.toml` file; every field has a default so a partial or
//! missing file is fine.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}, time::Duration};
use tracing::{debug, info};

use crate::host::fs::DEFAULT_DOCUMENT_CAPACITY;
use crate::search::context::{ContextMargins, DEFAULT_CONTEXT_LINES};
use crate::server::ServerConfig;

const APP_NAME: &str = "codesearch-bridge";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
/// Settings for symbol and text searches.
pub struct SearchConfig {
    /// Lines of context before a text hit when the request leaves it unset.
    #[serde(default = "default_context_lines")]
    pub context_lines_before: u32,
    /// Lines of context after a text hit when the request leaves it unset.
    #[serde(default = "default_context_lines")]
    pub context_lines_after: u32,
    /// Lines added around a symbol's enclosing function.
    #[serde(default = "default_context_lines")]
    pub symbol_context_lines: u32,
    /// File filter for text searches that do not name one.
    #[serde(default = "default_file_filter")]
    pub default_file_filter: String,
    /// Files scanned for symbol declarations.
    #[serde(default = "default_index_file_filter")]
    pub index_file_filter: String,
    /// Upper bound on waiting for a background search to signal completion.
    #[serde(default = "default_find_timeout_ms")]
    pub find_timeout_ms: u64,
    /// Ask the find engine to finish before returning from `execute`.
    #[serde(default = "default_wait_for_completion")]
    pub wait_for_completion: bool,
    /// Stop collecting text hits after this long. Unset means no limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_time_limit_ms: Option<u64>,
    /// Documents the filesystem host keeps open before closing the least
    /// recently used one.
    #[serde(default = "default_max_open_documents")]
    pub max_open_documents: usize,
}

fn default_context_lines() -> u32 {
    DEFAULT_CONTEXT_LINES
}

fn default_file_filter() -> String {
    "*.h;*.cpp".to_string()
}

fn default_index_file_filter() -> String {
    "*.h;*.hpp;*.c;*.cc;*.cpp;*.rs;*.py".to_string()
}

fn default_find_timeout_ms() -> u64 {
    30_000
}

fn default_wait_for_completion() -> bool {
    true
}

fn default_max_open_documents() -> usize {
    DEFAULT_DOCUMENT_CAPACITY
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            context_lines_before: default_context_lines(),
            context_lines_after: default_context_lines(),
            symbol_context_lines: default_context_lines(),
            default_file_filter: default_file_filter(),
            index_file_filter: default_index_file_filter(),
            find_timeout_ms: default_find_timeout_ms(),
            wait_for_completion: default_wait_for_completion(),
            result_time_limit_ms: None,
            max_open_documents: default_max_open_documents(),
        }
    }
}

impl SearchConfig {
    pub fn find_timeout(&self) -> Duration {
        Duration::from_millis(self.find_timeout_ms)
    }

    pub fn result_time_limit(&self) -> Option<Duration> {
        self.result_time_limit_ms.map(Duration::from_millis)
    }

    pub fn default_margins(&self) -> ContextMargins {
        ContextMargins::new(self.context_lines_before, self.context_lines_after)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
/// Top-level configuration.
pub struct AppConfig {
    /// Workspace opened on startup when no `--workspace` is given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

/// Returns the default path to the configuration file.
pub fn get_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| anyhow!("Could not find config directory"))?
        .join(APP_NAME);
    Ok(config_dir.join(CONFIG_FILE_NAME))
}

/// Loads the configuration from `override_path` or the default location.
///
/// A missing file yields the defaults. A file that exists but cannot be read
/// or parsed is an error.
pub fn load_config(override_path: Option<&Path>) -> Result<AppConfig> {
    let config_file_path = match override_path {
        Some(path) => path.to_path_buf(),
        None => get_config_path()?,
    };

    if !config_file_path.exists() {
        info!(
            "Config file not found at '{}', using defaults",
            config_file_path.display()
        );
        return Ok(AppConfig::default());
    }

    info!("Loading config from '{}'", config_file_path.display());
    let config_content = fs::read_to_string(&config_file_path)
        .with_context(|| format!("Failed to read config file at '{}'", config_file_path.display()))?;
    let config: AppConfig = toml::from_str(&config_content)
        .with_context(|| format!("Failed to parse config file at '{}'", config_file_path.display()))?;
    debug!("Parsed config: {:?}", config);
    Ok(config)
}

/// Writes `config` to `override_path` or the default location, creating the
/// directory if needed.
pub fn save_config(config: &AppConfig, override_path: Option<&Path>) -> Result<()> {
    let config_file_path = match override_path {
        Some(path) => path.to_path_buf(),
        None => get_config_path()?,
    };
    if let Some(dir) = config_file_path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;
    }

    let config_content = toml::to_string_pretty(config)
        .with_context(|| "Failed to serialize configuration to TOML")?;
    fs::write(&config_file_path, config_content)
        .with_context(|| format!("Failed to write config file to '{}'", config_file_path.display()))?;

    debug!("Configuration saved to '{}'", config_file_path.display());
    Ok(())
}
