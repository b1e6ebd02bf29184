use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use std::path::PathBuf;

use crate::config::AppConfig;
use crate::host::FileFilter;
use crate::outline::{outline_workspace, render, DEFAULT_MAX_DEPTH};
use crate::search::text::resolve_search_root;

/// Arguments for the outline command
#[derive(Debug, Clone, Args)]
pub struct OutlineArgs {
    /// Workspace root (defaults to the configured root or the current directory)
    #[arg(short, long)]
    pub workspace: Option<PathBuf>,

    /// Directory to outline, relative to the workspace root
    #[arg(long, default_value = ".")]
    pub path: String,

    /// File-name globs (defaults to the configured index filter)
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Maximum nesting depth to descend into
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    pub max_depth: usize,
}

pub fn handle_outline(args: OutlineArgs, config: &AppConfig) -> Result<()> {
    let root = super::workspace_root(args.workspace.as_deref(), config)?;
    let start = resolve_search_root(&root, &args.path)?;
    let filter_spec = args
        .filter
        .unwrap_or_else(|| config.search.index_file_filter.clone());
    let filter = FileFilter::parse(&filter_spec).context("Invalid --filter")?;

    let outlines = outline_workspace(&start, &filter, args.max_depth);
    if outlines.is_empty() {
        println!("No code elements found under {}", start.display());
        return Ok(());
    }
    for file in outlines {
        let shown = file.path.strip_prefix(&root).unwrap_or(&file.path);
        println!("{}", shown.display().to_string().cyan().bold());
        print!("{}", render(&file.entries));
    }
    Ok(())
}
