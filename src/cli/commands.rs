use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::AppConfig;

use super::outline::{handle_outline, OutlineArgs};
use super::search::{handle_symbols, handle_text, SymbolsArgs, TextArgs};
use super::server::{handle_serve, ServeArgs};

#[derive(Parser, Debug)]
#[command(author, version, about = "Symbol and text search over a source tree, served over gRPC", long_about = None)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the configuration file (overrides the default location)
    #[arg(short = 'c', long = "config", global = true, env = "CODESEARCH_CONFIG")]
    pub config: Option<PathBuf>,
}

// --- Main Command Enum ---
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the gRPC search server
    Serve(ServeArgs),
    /// Find the functions that declare a symbol
    Symbols(SymbolsArgs),
    /// Find whole-word occurrences of text
    Text(TextArgs),
    /// Print the code-element outline of the workspace
    Outline(OutlineArgs),
}

/// Dispatches a parsed command to its handler.
///
/// # Arguments
/// * `command` - The subcommand to run ([`Commands`]).
/// * `config` - The loaded application configuration ([`AppConfig`]).
pub async fn handle_command(command: Commands, config: AppConfig) -> Result<()> {
    match command {
        Commands::Serve(args) => handle_serve(args, config).await,
        Commands::Symbols(args) => handle_symbols(args, &config).await,
        Commands::Text(args) => handle_text(args, &config).await,
        Commands::Outline(args) => handle_outline(args, &config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_text_command() {
        let args = CliArgs::try_parse_from([
            "codesearch-bridge",
            "text",
            "Render",
            "--path",
            "src/gfx",
            "--before",
            "2",
            "--filter",
            "*.cpp",
            "--config",
            "/tmp/cs.toml",
        ])
        .unwrap();
        assert_eq!(args.config, Some(PathBuf::from("/tmp/cs.toml")));
        match args.command {
            Commands::Text(text) => {
                assert_eq!(text.query, "Render");
                assert_eq!(text.path, "src/gfx");
                assert_eq!(text.before, Some(2));
                assert_eq!(text.after, None);
                assert_eq!(text.filter.as_deref(), Some("*.cpp"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_serve_overrides() {
        let args = CliArgs::try_parse_from(["codesearch-bridge", "serve", "--port", "6000"]).unwrap();
        match args.command {
            Commands::Serve(serve) => {
                assert_eq!(serve.port, Some(6000));
                assert_eq!(serve.host, None);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_symbols_requires_a_name() {
        assert!(CliArgs::try_parse_from(["codesearch-bridge", "symbols"]).is_err());
    }
}
