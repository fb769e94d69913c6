use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;

use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    #[command(about = "Write a config file with default values")]
    Init {
        #[arg(long, help = "Force overwrite existing config")]
        force: bool,
    },
    #[command(about = "Show the resolved configuration")]
    Show,
    #[command(about = "Show the config file path")]
    Path,
}

pub async fn handle_config(
    cmd: ConfigCommand,
    config: Config,
    explicit: Option<PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    match cmd {
        ConfigCommand::Init { force } => handle_init(explicit, force, format),
        ConfigCommand::Show => handle_show(&config, format),
        ConfigCommand::Path => handle_path(explicit),
    }
}

fn target_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    explicit
        .or_else(Config::config_path)
        .ok_or_else(|| anyhow::anyhow!("could not determine config directory"))
}

fn handle_init(explicit: Option<PathBuf>, force: bool, format: OutputFormat) -> Result<()> {
    let path = target_path(explicit)?;

    if path.exists() && !force {
        anyhow::bail!(
            "Config already exists at: {}\nUse --force to overwrite.",
            path.display()
        );
    }

    Config::default()
        .save(&path)
        .context("failed to write config")?;
    print!(
        "{}",
        get_formatter(format).format_message(&format!("Created config at: {}", path.display()))
    );
    Ok(())
}

fn handle_show(config: &Config, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(config)?);
    } else {
        print!("{}", toml::to_string_pretty(config)?);
    }
    Ok(())
}

fn handle_path(explicit: Option<PathBuf>) -> Result<()> {
    let path = target_path(explicit)?;
    let state = if path.exists() { "active" } else { "would be" };
    println!("Config file ({}): {}", state, path.display());

    if let Ok(cwd) = std::env::current_dir() {
        let env_path = cwd.join(".env");
        if env_path.exists() {
            println!(".env file (active): {}", env_path.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let init = |force| ConfigCommand::Init { force };
        handle_config(init(false), Config::default(), Some(path.clone()), OutputFormat::Text)
            .await
            .unwrap();
        assert!(path.exists());

        let again =
            handle_config(init(false), Config::default(), Some(path.clone()), OutputFormat::Text)
                .await;
        assert!(again.is_err());

        handle_config(init(true), Config::default(), Some(path.clone()), OutputFormat::Text)
            .await
            .unwrap();
        assert!(Config::from_file(&path).is_ok());
    }
}
