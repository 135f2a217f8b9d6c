//! Docroute CLI
//!
//! Routes questions to topic collections and reports grounded or general
//! mode, builds collections from documents, and inspects them.

mod commands;

use clap::{Parser, Subcommand};
use commands::{BuildCommand, EvalCommand, QueryCommand, StatusCommand};
use docroute_core::config::{AppConfig, ConfigOverrides};
use docroute_core::logging::{self, LogFormat};
use docroute_core::AppResult;
use std::path::PathBuf;

/// Docroute - topic-routed retrieval over document collections
#[derive(Parser, Debug)]
#[command(name = "docroute")]
#[command(about = "Topic-routed retrieval over document collections", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "DOCROUTE_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "DOCROUTE_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding built collections
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Log output format (pretty, json)
    #[arg(long, global = true)]
    log_format: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Route one request (JSON on stdin or --query) and print the JSON response
    Query(QueryCommand),

    /// Build a collection from documents
    Build(BuildCommand),

    /// Run the canned evaluation queries
    Eval(EvalCommand),

    /// Show collection availability and build manifests
    Status(StatusCommand),
}

fn load_config(cli: &Cli) -> AppResult<AppConfig> {
    // Workspace and config file decide which YAML is read, so they are
    // resolved before loading rather than applied as overrides afterwards.
    let workspace = cli.workspace.as_ref().map(|p| p.to_string_lossy().to_string());
    let config_file = cli.config.as_ref().map(|p| p.to_string_lossy().to_string());

    let config = AppConfig::load_with(|key| match key {
        "DOCROUTE_WORKSPACE" => workspace.clone(),
        "DOCROUTE_CONFIG" => config_file.clone(),
        _ => std::env::var(key).ok(),
    })?;

    let log_format = cli
        .log_format
        .as_deref()
        .map(str::parse::<LogFormat>)
        .transpose()?;

    Ok(config.with_overrides(ConfigOverrides {
        data_dir: cli.data_dir.clone(),
        log_level: cli.log_level.clone(),
        log_format,
        verbose: cli.verbose,
        no_color: cli.no_color,
        ..Default::default()
    }))
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    let config = load_config(&cli)?;
    config.validate()?;

    // Logs go to stderr; stdout carries command output.
    logging::init_logging(config.log_level.as_deref(), config.no_color, config.log_format)?;

    tracing::info!("Docroute CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Collections: {:?}", config.data_dir());

    let command_name = match &cli.command {
        Commands::Query(_) => "query",
        Commands::Build(_) => "build",
        Commands::Eval(_) => "eval",
        Commands::Status(_) => "status",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Query(cmd) => cmd.execute(&config).await,
        Commands::Build(cmd) => cmd.execute(&config).await,
        Commands::Eval(cmd) => cmd.execute(&config).await,
        Commands::Status(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
