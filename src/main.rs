//! HomeKey - property intelligence from many sources in one lookup
//!
//! Runs either a one-shot lookup that prints a property brief, or the HTTP
//! API server.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime or configuration error

use anyhow::{Context, Result};
use homekey::aggregator::Aggregator;
use homekey::api::{build_router, AppState};
use homekey::cli::{Args, OutputFormat};
use homekey::config::{Config, DEFAULT_CONFIG_FILE};
use homekey::models::PropertyResponse;
use homekey::report;
use homekey::sources::SourceSet;
use homekey::store::{SnapshotStore, SqliteStore};
use homekey::summary::{ChatClient, SummaryGenerator, TextGenerator};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Configuration decides verbosity, so it is read before logging starts
    let (config, source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    init_logging(config.log_level(&args));

    info!("HomeKey v{}", env!("CARGO_PKG_VERSION"));
    source.report();

    let result = if args.serve {
        run_server(config).await
    } else {
        run_lookup(args, config).await
    };

    if let Err(e) = result {
        error!("HomeKey failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .homekey.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("   Edit it to customize the server, database, and summary model.");
    Ok(())
}

/// Initialize logging at the configured level.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Where the configuration came from, reported once logging is up.
enum ConfigSource {
    Explicit(PathBuf),
    Default,
    Builtin,
    BuiltinAfterError(anyhow::Error),
}

impl ConfigSource {
    fn report(&self) {
        match self {
            ConfigSource::Explicit(path) => info!("Loaded config from: {}", path.display()),
            ConfigSource::Default => info!("Loaded default config from {}", DEFAULT_CONFIG_FILE),
            ConfigSource::Builtin => debug!("No config file found, using defaults"),
            ConfigSource::BuiltinAfterError(e) => warn!("Failed to load config: {:#}", e),
        }
    }
}

/// Load configuration from file or use defaults, then apply CLI overrides.
fn load_config(args: &Args) -> Result<(Config, ConfigSource)> {
    let (mut config, source) = if let Some(ref config_path) = args.config {
        // An explicit path must load
        (
            Config::load(config_path)?,
            ConfigSource::Explicit(config_path.clone()),
        )
    } else {
        match Config::load_default() {
            Ok(Some(config)) => (config, ConfigSource::Default),
            Ok(None) => (Config::default(), ConfigSource::Builtin),
            Err(e) => (Config::default(), ConfigSource::BuiltinAfterError(e)),
        }
    };

    config.merge_with_args(args);
    config.apply_env_fallbacks();
    Ok((config, source))
}

/// Open the snapshot store. Lookups still work without one, so a database
/// that cannot be opened only disables history.
async fn open_store(config: &Config) -> Option<Arc<dyn SnapshotStore>> {
    if !config.database.enabled {
        info!("Snapshot persistence disabled");
        return None;
    }

    match SqliteStore::connect(&config.database.url, config.database.max_connections).await {
        Ok(store) => Some(Arc::new(store) as Arc<dyn SnapshotStore>),
        Err(e) => {
            warn!(
                "Could not open database {}: {}. Continuing without snapshot history.",
                config.database.url, e
            );
            None
        }
    }
}

/// Build the summary generator, with a chat client unless summaries are
/// configured to stay local.
fn build_summarizer(config: &Config) -> Result<SummaryGenerator> {
    if !config.summary.enabled {
        info!("Chat summaries disabled, using built-in summaries");
        return Ok(SummaryGenerator::fallback_only());
    }

    let client = ChatClient::new(config.summary.chat_config())
        .context("Failed to create chat client")?;

    info!(
        "Summaries: model {} at {}",
        client.config().model,
        client.endpoint()
    );
    if client.config().api_key.is_none() {
        debug!("No API key configured for the chat API");
    }

    let generator: Arc<dyn TextGenerator> = Arc::new(client);
    Ok(SummaryGenerator::new(Some(generator)))
}

async fn build_services(config: &Config) -> Result<(Aggregator, SummaryGenerator)> {
    let sources = SourceSet::simulated(config.sources.simulate_latency);
    let store = open_store(config).await;
    let summarizer = build_summarizer(config)?;

    Ok((Aggregator::new(sources, store), summarizer))
}

/// Run the HTTP API until interrupted.
async fn run_server(config: Config) -> Result<()> {
    let (aggregator, summarizer) = build_services(&config).await?;

    let state = AppState::new(aggregator, summarizer, config.server.include_summary);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind))?;

    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// One-shot lookup: aggregate, summarize, and print or save the brief.
async fn run_lookup(args: Args, config: Config) -> Result<()> {
    let (aggregator, summarizer) = build_services(&config).await?;

    let address = args.address.clone().unwrap_or_default();

    let spinner = if args.quiet {
        None
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message(format!("Looking up {}", address));
        Some(pb)
    };

    let record = aggregator.aggregate(&address).await;

    let ai_summary = if config.server.include_summary {
        if let Some(ref pb) = spinner {
            pb.set_message("Writing summary");
        }
        Some(summarizer.summarize(&record).await)
    } else {
        None
    };

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let response = PropertyResponse { record, ai_summary };

    let output = match config.general.format {
        OutputFormat::Json => report::generate_json_brief(&response)?,
        OutputFormat::Markdown => report::generate_markdown_brief(&response),
    };

    match args.output {
        Some(ref path) => {
            std::fs::write(path, &output)
                .with_context(|| format!("Failed to write brief to {}", path.display()))?;
            if !args.quiet {
                println!(
                    "✅ Brief saved to {} ({}% data quality)",
                    path.display(),
                    response.record.data_quality.overall_percent()
                );
            }
        }
        None => println!("{}", output),
    }

    Ok(())
}
