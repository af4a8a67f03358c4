//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.homekey.toml` files.

use crate::cli::{Args, OutputFormat};
use crate::summary::ChatConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".homekey.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Snapshot database settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Summary generation settings.
    #[serde(default)]
    pub summary: SummaryConfig,

    /// Data source settings.
    #[serde(default)]
    pub sources: SourcesConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    /// Output format for one-shot lookups.
    #[serde(default)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Attach a summary to responses unless the request opts out.
    #[serde(default = "default_true")]
    pub include_summary: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            include_summary: true,
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite connection URL.
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Record a snapshot for every lookup.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Pool size.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            enabled: true,
            max_connections: default_max_connections(),
        }
    }
}

fn default_database_url() -> String {
    "sqlite://homekey.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

/// Chat API settings for summaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryConfig {
    /// Call the chat API. When false the built-in summary is always used.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Base URL of the OpenAI-compatible API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// API key. Falls back to the OPENAI_API_KEY environment variable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_base_url(),
            model: default_model(),
            api_key: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    300
}

fn default_timeout() -> u64 {
    30
}

impl SummaryConfig {
    /// Chat client settings derived from this section.
    pub fn chat_config(&self) -> ChatConfig {
        ChatConfig {
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            api_key: self.api_key.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            timeout_seconds: self.timeout_seconds,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Delay simulated sources the way remote APIs would.
    #[serde(default = "default_true")]
    pub simulate_latency: bool,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            simulate_latency: true,
        }
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_if_exists(Path::new(DEFAULT_CONFIG_FILE))
    }

    fn load_if_exists(path: &Path) -> Result<Option<Self>> {
        if path.exists() {
            Ok(Some(Self::load(path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &Args) {
        if let Some(ref bind) = args.bind {
            self.server.bind = bind.clone();
        }

        if let Some(ref url) = args.database_url {
            self.database.url = url.clone();
        }
        if args.no_persist {
            self.database.enabled = false;
        }

        // Summary settings
        if let Some(ref url) = args.llm_url {
            self.summary.base_url = url.clone();
        }
        if let Some(ref model) = args.model {
            self.summary.model = model.clone();
        }
        if let Some(ref key) = args.api_key {
            self.summary.api_key = Some(key.clone());
        }
        if let Some(timeout) = args.timeout {
            self.summary.timeout_seconds = timeout;
        }
        if let Some(temperature) = args.temperature {
            self.summary.temperature = temperature;
        }
        if args.no_summary {
            self.server.include_summary = false;
        }

        if args.no_latency {
            self.sources.simulate_latency = false;
        }

        if let Some(format) = args.format {
            self.general.format = format;
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Log level for the merged configuration. `--quiet` wins over any
    /// verbosity from the command line or the file.
    pub fn log_level(&self, args: &Args) -> tracing::Level {
        if args.quiet {
            tracing::Level::ERROR
        } else if self.general.verbose {
            tracing::Level::DEBUG
        } else {
            args.log_level()
        }
    }

    /// Fill the API key from `OPENAI_API_KEY` when neither the file nor the
    /// command line provided one.
    pub fn apply_env_fallbacks(&mut self) {
        if self.summary.api_key.is_none() {
            self.summary.api_key = std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty());
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.bind, "127.0.0.1:3000");
        assert!(config.server.include_summary);
        assert_eq!(config.database.url, "sqlite://homekey.db");
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.summary.model, "gpt-4o-mini");
        assert_eq!(config.summary.max_tokens, 300);
        assert!(config.sources.simulate_latency);
        assert_eq!(config.general.format, OutputFormat::Markdown);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
verbose = true
format = "json"

[server]
bind = "0.0.0.0:8080"

[summary]
base_url = "http://localhost:11434/v1"
model = "llama3.2"
temperature = 0.2

[sources]
simulate_latency = false
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert!(config.general.verbose);
        assert_eq!(config.general.format, OutputFormat::Json);
        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert!(config.server.include_summary);
        assert_eq!(config.summary.model, "llama3.2");
        assert_eq!(config.summary.temperature, 0.2);
        assert_eq!(config.summary.timeout_seconds, 30);
        assert!(!config.sources.simulate_latency);
        assert!(config.database.enabled);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[database]\nurl = \"sqlite::memory:\"\nenabled = false").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.database.url, "sqlite::memory:");
        assert!(!config.database.enabled);

        assert!(Config::load_if_exists(&file.path().with_extension("missing"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_load_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\nbind = ").unwrap();
        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn test_merge_with_args() {
        let args = Args::try_parse_from([
            "homekey",
            "--serve",
            "--bind",
            "0.0.0.0:9000",
            "--no-persist",
            "--no-summary",
            "--no-latency",
            "--llm-url",
            "http://localhost:11434/v1",
            "--timeout",
            "5",
        ])
        .unwrap();

        let mut config = Config::default();
        config.merge_with_args(&args);

        assert_eq!(config.server.bind, "0.0.0.0:9000");
        assert!(!config.database.enabled);
        assert!(!config.server.include_summary);
        assert!(!config.sources.simulate_latency);
        assert_eq!(config.summary.base_url, "http://localhost:11434/v1");
        assert_eq!(config.summary.timeout_seconds, 5);
        // untouched
        assert_eq!(config.summary.model, "gpt-4o-mini");
    }

    #[test]
    fn test_log_level_honours_config_verbosity() {
        let args = Args::try_parse_from(["homekey", "--address", "1 Elm St"]).unwrap();

        let mut config = Config::default();
        config.merge_with_args(&args);
        assert_eq!(config.log_level(&args), tracing::Level::INFO);

        config.general.verbose = true;
        assert_eq!(config.log_level(&args), tracing::Level::DEBUG);

        let quiet = Args::try_parse_from(["homekey", "--address", "1 Elm St", "--quiet"]).unwrap();
        config.merge_with_args(&quiet);
        assert_eq!(config.log_level(&quiet), tracing::Level::ERROR);
    }

    #[test]
    fn test_verbose_flag_merges_into_log_level() {
        let args = Args::try_parse_from(["homekey", "--address", "1 Elm St", "-v"]).unwrap();

        let mut config = Config::default();
        config.merge_with_args(&args);
        assert!(config.general.verbose);
        assert_eq!(config.log_level(&args), tracing::Level::DEBUG);
    }

    #[test]
    fn test_chat_config_from_section() {
        let mut section = SummaryConfig::default();
        section.api_key = Some("sk-test".to_string());

        let chat = section.chat_config();
        assert_eq!(chat.base_url, "https://api.openai.com/v1");
        assert_eq!(chat.api_key.as_deref(), Some("sk-test"));
        assert_eq!(chat.max_tokens, 300);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        for section in ["[general]", "[server]", "[database]", "[summary]", "[sources]"] {
            assert!(toml_str.contains(section), "missing {}", section);
        }
        assert!(!toml_str.contains("api_key"));

        let reparsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(reparsed.server.bind, "127.0.0.1:3000");
    }
}
