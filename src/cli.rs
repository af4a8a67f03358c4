//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// HomeKey - property intelligence from many sources in one lookup
///
/// Aggregates property records, school ratings, crime statistics and
/// amenity data for an address, scores how complete the picture is, and
/// writes a short plain-language summary.
///
/// Examples:
///   homekey --address "123 Main St, Springfield, IL 62701"
///   homekey --address "742 Evergreen Terrace" --format json --no-summary
///   homekey --serve --bind 0.0.0.0:3000
///   homekey --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Address to look up, e.g. "123 Main St, Springfield, IL 62701"
    #[arg(
        short,
        long,
        value_name = "ADDRESS",
        required_unless_present_any = ["serve", "init_config"],
        conflicts_with = "serve"
    )]
    pub address: Option<String>,

    /// Run the HTTP API server instead of a one-shot lookup
    #[arg(long)]
    pub serve: bool,

    /// Address the server listens on (default: from config or 127.0.0.1:3000)
    #[arg(long, value_name = "ADDR", env = "HOMEKEY_BIND")]
    pub bind: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .homekey.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// SQLite database URL for snapshot history
    #[arg(long, value_name = "URL", env = "HOMEKEY_DATABASE_URL")]
    pub database_url: Option<String>,

    /// Do not record snapshots
    #[arg(long)]
    pub no_persist: bool,

    /// Base URL of the OpenAI-compatible chat API
    ///
    /// Ollama works too, e.g. http://localhost:11434/v1
    #[arg(long, value_name = "URL", env = "HOMEKEY_LLM_URL")]
    pub llm_url: Option<String>,

    /// Model used for summaries
    #[arg(short, long, env = "HOMEKEY_MODEL")]
    pub model: Option<String>,

    /// API key for the chat API (falls back to OPENAI_API_KEY)
    #[arg(long, value_name = "KEY", env = "HOMEKEY_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Skip the summary entirely
    #[arg(long)]
    pub no_summary: bool,

    /// Chat API request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Temperature for summary generation (0.0 - 2.0)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Answer immediately instead of simulating source latency
    #[arg(long)]
    pub no_latency: bool,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Write the brief to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .homekey.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the brief.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if let Some(ref address) = self.address {
            if address.trim().is_empty() {
                return Err("Address must not be empty".to_string());
            }
        }

        if let Some(ref bind) = self.bind {
            if bind.parse::<SocketAddr>().is_err() {
                return Err(format!("Invalid bind address: {}", bind));
            }
        }

        if let Some(ref url) = self.llm_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("LLM URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(ref url) = self.database_url {
            if !url.starts_with("sqlite:") {
                return Err("Database URL must start with 'sqlite:'".to_string());
            }
        }

        // Validate temperature range
        if let Some(temperature) = self.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err("Temperature must be between 0.0 and 2.0".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        // Validate timeout if provided
        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
