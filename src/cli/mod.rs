//! CLI module for the paper librarian.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::error::ConfigError;
use crate::models::{Config, OutputFormat};

/// Catalog academic PDFs by asking a local language model for title and authors.
#[derive(Debug, Parser)]
#[command(name = "librarian")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[arg(
        long,
        short = 'f',
        global = true,
        help = "Output format: text, json, or markdown"
    )]
    pub format: Option<OutputFormat>,

    #[arg(long, short = 'v', global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, short = 'c', global = true, help = "Path to a config file")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Path to the SQLite catalog")]
    pub database: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Resolve configuration: file, then environment, then global flags.
    pub fn load_config(&self) -> Result<Config, ConfigError> {
        let mut config = Config::load(self.config.as_deref())?;
        if let Some(ref database) = self.database {
            config.database.path = database.clone();
        }
        Ok(config)
    }
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan the library and record title and authors of new papers
    Scan(commands::ScanArgs),

    /// Show the recorded metadata of one paper
    Show(commands::ShowArgs),

    /// List all recorded papers
    List,

    /// Check the model server and the catalog
    Status,

    /// Write browsable index.html pages into every library directory
    Index(commands::IndexArgs),

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::ConfigCommand),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_scan_with_overrides() {
        let cli = Cli::parse_from([
            "librarian",
            "--database",
            "/tmp/catalog.db",
            "scan",
            "--dir",
            "/srv/papers",
            "--model",
            "llama3.2",
            "--force",
        ]);
        assert_eq!(cli.database, Some(PathBuf::from("/tmp/catalog.db")));
        match cli.command {
            Commands::Scan(args) => {
                assert_eq!(args.dir, Some(PathBuf::from("/srv/papers")));
                assert_eq!(args.model.as_deref(), Some("llama3.2"));
                assert!(args.force);
                assert!(args.paths.is_empty());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_global_format_after_subcommand() {
        let cli = Cli::parse_from(["librarian", "list", "--format", "json"]);
        assert_eq!(cli.format, Some(OutputFormat::Json));
        assert!(matches!(cli.command, Commands::List));
    }

    #[test]
    fn test_parse_config_init_force() {
        let cli = Cli::parse_from(["librarian", "config", "init", "--force"]);
        assert!(matches!(
            cli.command,
            Commands::Config(commands::ConfigCommand::Init { force: true })
        ));

        let cli = Cli::parse_from(["librarian", "-f", "json", "config", "init"]);
        assert_eq!(cli.format, Some(OutputFormat::Json));
    }

    #[test]
    fn test_parse_index() {
        let cli = Cli::parse_from([
            "librarian",
            "index",
            "--root",
            "/srv/papers",
            "--url",
            "http://pi.local",
            "--original-prefix",
            "/mnt/papers",
        ]);
        match cli.command {
            Commands::Index(args) => {
                assert_eq!(args.root, Some(PathBuf::from("/srv/papers")));
                assert_eq!(args.url, "http://pi.local");
                assert_eq!(args.original_prefix.as_deref(), Some("/mnt/papers"));
                assert!(args.template.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }

        assert!(Cli::try_parse_from(["librarian", "index"]).is_err());
    }
}
