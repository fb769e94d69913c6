use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::format::OutputFormat;
use crate::error::ConfigError;

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "qwen2.5";
pub const DEFAULT_DIRECTORY: &str = "../data/pdfs";
pub const DEFAULT_DATABASE: &str = "pdf_files.db";

pub const ENV_OLLAMA_URL: &str = "OLLAMA_URL";
pub const ENV_OLLAMA_MODEL: &str = "OLLAMA_MODEL";
pub const ENV_OLLAMA_TIMEOUT: &str = "OLLAMA_TIMEOUT";
pub const ENV_OLLAMA_RETRIES: &str = "OLLAMA_RETRIES";
pub const ENV_DIRECTORY: &str = "DIRECTORY";
pub const ENV_SKIP_EXISTING: &str = "SKIP_EXISTING";
pub const ENV_DATABASE: &str = "PDF_DATABASE";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub ollama: OllamaConfig,

    #[serde(default)]
    pub library: LibraryConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("paper-librarian").join("config.toml"))
    }

    /// Resolve configuration from file and environment.
    ///
    /// An explicit path must exist; the default path is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match Self::config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Overlay values found through `lookup` (normally the process environment).
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_OLLAMA_URL) {
            self.ollama.url = url;
        }
        if let Some(model) = lookup(ENV_OLLAMA_MODEL) {
            self.ollama.model = model;
        }
        if let Some(timeout) = lookup(ENV_OLLAMA_TIMEOUT) {
            self.ollama.timeout_secs = parse_number(ENV_OLLAMA_TIMEOUT, &timeout)?;
        }
        if let Some(retries) = lookup(ENV_OLLAMA_RETRIES) {
            self.ollama.max_retries = parse_number(ENV_OLLAMA_RETRIES, &retries)?;
        }
        if let Some(directory) = lookup(ENV_DIRECTORY) {
            self.library.directory = PathBuf::from(directory);
        }
        if let Some(skip) = lookup(ENV_SKIP_EXISTING) {
            self.library.skip_existing = parse_bool(ENV_SKIP_EXISTING, &skip)?;
        }
        if let Some(database) = lookup(ENV_DATABASE) {
            self.database.path = PathBuf::from(database);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ollama.url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "ollama.url must not be empty".to_string(),
            ));
        }
        if self.ollama.model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "ollama.model must not be empty".to_string(),
            ));
        }
        if self.ollama.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "ollama.timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| {
        ConfigError::ValidationError(format!("{key} must be a non-negative integer, got '{value}'"))
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::ValidationError(format!(
            "{key} must be a boolean, got '{value}'"
        ))),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    #[serde(default = "default_ollama_url")]
    pub url: String,

    #[serde(default = "default_ollama_model")]
    pub model: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Extra attempts after the first one on transient failures.
    #[serde(default)]
    pub max_retries: u32,

    /// Ask the server to constrain the reply to a JSON schema.
    #[serde(default = "default_true")]
    pub structured_output: bool,
}

fn default_ollama_url() -> String {
    DEFAULT_OLLAMA_URL.to_string()
}

fn default_ollama_model() -> String {
    DEFAULT_OLLAMA_MODEL.to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            url: default_ollama_url(),
            model: default_ollama_model(),
            timeout_secs: default_timeout(),
            max_retries: 0,
            structured_output: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryConfig {
    #[serde(default = "default_directory")]
    pub directory: PathBuf,

    /// Leave files that already have a record untouched.
    #[serde(default = "default_true")]
    pub skip_existing: bool,

    #[serde(default = "default_exclude_patterns")]
    pub exclude_patterns: Vec<String>,
}

fn default_directory() -> PathBuf {
    PathBuf::from(DEFAULT_DIRECTORY)
}

fn default_exclude_patterns() -> Vec<String> {
    vec!["**/.*/**".to_string()]
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            skip_existing: true,
            exclude_patterns: default_exclude_patterns(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database")]
    pub path: PathBuf,
}

fn default_database() -> PathBuf {
    PathBuf::from(DEFAULT_DATABASE)
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub default_format: OutputFormat,
}
