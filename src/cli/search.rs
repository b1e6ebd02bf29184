use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use std::path::PathBuf;

use crate::config::AppConfig;
use crate::host::HostAffinity;
use crate::search::{find_symbols, find_text, ContextMargins, SymbolHit, TextHit, TextQuery, TextSearchSettings};

/// Arguments for the symbols command
#[derive(Debug, Clone, Args)]
pub struct SymbolsArgs {
    /// Symbol name to look up (exact match)
    pub name: String,

    /// Lines of context around the declaring function
    #[arg(long)]
    pub context_lines: Option<u32>,

    /// Workspace root (defaults to the configured root or the current directory)
    #[arg(short, long)]
    pub workspace: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the text command
#[derive(Debug, Clone, Args)]
pub struct TextArgs {
    /// Text to search for (whole word, case sensitive)
    pub query: String,

    /// Directory to search, relative to the workspace root
    #[arg(long, default_value = ".")]
    pub path: String,

    /// Lines of context before each hit
    #[arg(short = 'B', long, allow_negative_numbers = true)]
    pub before: Option<i32>,

    /// Lines of context after each hit
    #[arg(short = 'A', long, allow_negative_numbers = true)]
    pub after: Option<i32>,

    /// File-name globs, e.g. "*.h;*.cpp"
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Workspace root (defaults to the configured root or the current directory)
    #[arg(short, long)]
    pub workspace: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn handle_symbols(args: SymbolsArgs, config: &AppConfig) -> Result<()> {
    let root = super::workspace_root(args.workspace.as_deref(), config)?;
    let affinity = HostAffinity::new(super::open_host(&root, config)?);
    let context_lines = args.context_lines.unwrap_or(config.search.symbol_context_lines);

    let hits = {
        let mut host = affinity.enter().await;
        find_symbols(&mut *host, &args.name, context_lines)
    }
    .with_context(|| format!("Symbol search for '{}' failed", args.name))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
    } else {
        print_symbol_hits(&hits, &args.name);
    }
    Ok(())
}

pub async fn handle_text(args: TextArgs, config: &AppConfig) -> Result<()> {
    let root = super::workspace_root(args.workspace.as_deref(), config)?;
    let affinity = HostAffinity::new(super::open_host(&root, config)?);

    let query = TextQuery {
        text: args.query.clone(),
        search_path: args.path.clone(),
        margins: ContextMargins::from_request(args.before, args.after, config.search.default_margins()),
        file_filter: args
            .filter
            .clone()
            .unwrap_or_else(|| config.search.default_file_filter.clone()),
    };
    let settings = TextSearchSettings::from(&config.search);

    let hits = {
        let mut host = affinity.enter().await;
        let hits = find_text(&mut *host, &query, &settings).await;
        hits
    }
    .with_context(|| format!("Text search for '{}' failed", args.query))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
    } else {
        print_text_hits(&hits, &args.query);
    }
    Ok(())
}

fn print_symbol_hits(hits: &[SymbolHit], name: &str) {
    if hits.is_empty() {
        println!("No declarations found for symbol: \"{}\"", name);
        return;
    }
    println!("Found {} declaration(s) of \"{}\":", hits.len(), name.bold());
    for hit in hits {
        println!(
            "\n{} {} {}:{}",
            hit.kind.yellow(),
            hit.name.green().bold(),
            hit.file_path.cyan(),
            hit.line
        );
        println!("{}", hit.context.dimmed());
    }
}

fn print_text_hits(hits: &[TextHit], query: &str) {
    if hits.is_empty() {
        println!("No results found for query: \"{}\"", query);
        return;
    }
    println!("Found {} match(es) for \"{}\":", hits.len(), query.bold());
    for hit in hits {
        println!("\n{}:{}", hit.file_path.cyan(), hit.line.to_string().yellow());
        println!("{}", hit.context.dimmed());
    }
}
