//! youtube-transcript-mcp: MCP server for YouTube transcripts
//!
//! Exposes transcript retrieval, caching and summarisation as MCP tools over
//! stdio.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use youtube_transcript_mcp::cache::CacheSettings;
use youtube_transcript_mcp::config::{self, Config};
use youtube_transcript_mcp::error::StartupError;
use youtube_transcript_mcp::mcp::{default_registry, McpServer};
use youtube_transcript_mcp::service::TranscriptService;
use youtube_transcript_mcp::youtube::YouTubeClient;

/// MCP server for YouTube video transcripts.
///
/// Fetches, caches and summarises transcripts for AI assistants. Speaks
/// JSON-RPC on stdin/stdout; logs go to stderr.
#[derive(Parser, Debug)]
#[command(name = "youtube-transcript-mcp")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(value_name = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease logging verbosity (only show errors)
    #[arg(short, long)]
    quiet: bool,

    /// Directory for cached transcripts (overrides the configuration file;
    /// relative paths are resolved against the home directory)
    #[arg(long, value_name = "DIR")]
    cache_dir: Option<PathBuf>,
}

/// Determines the log level from CLI arguments.
#[allow(clippy::match_same_arms)] // Explicit "warn" arm for clarity
fn get_log_level(verbose: u8, quiet: bool, config_level: &str) -> Level {
    if quiet {
        return Level::ERROR;
    }

    match verbose {
        0 => match config_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::WARN,
        },
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Initialises the tracing subscriber. Stdout belongs to the protocol, so
/// everything is written to stderr.
fn init_tracing(level: Level) {
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Wires the transcript service and tool registry from configuration.
fn build_server(cfg: &Config, cache_dir: Option<PathBuf>) -> Result<McpServer, StartupError> {
    let client = YouTubeClient::new(Duration::from_secs(cfg.youtube.request_timeout_secs))
        .map_err(StartupError::HttpClient)?;

    let service = Arc::new(TranscriptService::new(
        Arc::new(client),
        cfg.retry_policy(),
        cfg.youtube.languages.clone(),
        CacheSettings::from_config(&cfg.cache, cache_dir),
    ));

    let registry = default_registry(&service)?;
    info!(tools = registry.len(), "Tools registered");
    Ok(McpServer::new(registry))
}

fn report_startup_error(e: &StartupError) {
    match std::error::Error::source(e) {
        Some(cause) => error!(error = %e, cause = %cause, "Failed to start server"),
        None => error!(error = %e, "Failed to start server"),
    }
}

/// Entry point for the youtube-transcript-mcp server.
fn main() -> ExitCode {
    let args = Args::parse();

    let config_path = args.config.as_deref();
    let cfg = match config::load_config(config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            eprintln!("See config/example-config.json for the expected format");
            return ExitCode::FAILURE;
        }
    };

    let log_level = get_log_level(args.verbose, args.quiet, &cfg.logging.level);
    init_tracing(log_level);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting youtube-transcript-mcp server"
    );

    let mut server = match build_server(&cfg, args.cache_dir) {
        Ok(server) => server,
        Err(e) => {
            report_startup_error(&e);
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(StartupError::Runtime)
    {
        Ok(runtime) => runtime,
        Err(e) => {
            report_startup_error(&e);
            return ExitCode::FAILURE;
        }
    };

    info!("MCP server ready, waiting for client connection...");

    match runtime.block_on(server.run()) {
        Ok(()) => {
            info!("Server shut down gracefully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Server error");
            ExitCode::FAILURE
        }
    }
}
