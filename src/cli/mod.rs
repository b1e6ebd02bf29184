//! This module defines the command-line interface structure and handlers.

pub mod commands;
pub mod outline;
pub mod search;
pub mod server;

// Re-export the main handler and the command enum
pub use commands::{handle_command, CliArgs, Commands};

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::AppConfig;
use crate::host::{FileFilter, FsHost};

/// Workspace root from the command line, the configuration or the current
/// directory, in that order.
pub(crate) fn workspace_root(explicit: Option<&Path>, config: &AppConfig) -> Result<PathBuf> {
    match explicit.or(config.workspace_root.as_deref()) {
        Some(root) => Ok(root.to_path_buf()),
        None => std::env::current_dir().context("Failed to determine the current directory"),
    }
}

/// Opens a filesystem host on `root` using the configured index filter.
pub(crate) fn open_host(root: &Path, config: &AppConfig) -> Result<FsHost> {
    let index_filter = FileFilter::parse(&config.search.index_file_filter)
        .context("Invalid index_file_filter in configuration")?;
    let host = FsHost::open(root, index_filter)
        .with_context(|| format!("Failed to open workspace '{}'", root.display()))?;
    Ok(host.with_document_capacity(config.search.max_open_documents))
}
