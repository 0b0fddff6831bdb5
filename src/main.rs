//! approval-search MCP Server & CLI
//!
//! Dual-mode application:
//! - MCP Server Mode (default): Model Context Protocol server using stdio
//! - CLI Mode: Command-line utility for direct tool execution
//!
//! Implements two tools:
//! - `search(query, limit)` - Search approval documents by model name and/or E-number
//! - `suggest(prefix, limit)` - Autocomplete model names and partial E-numbers

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use approval_search::backend;
use approval_search::cli::{Cli, Commands};
use approval_search::config::load_config;
use approval_search::error::AppError;
use approval_search::mcp;
use approval_search::search::SearchEngine;
use approval_search::tools;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity flags
    let log_level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr) // Log to stderr to keep stdout clean
        .init();

    let engine = match build_engine(&cli) {
        Ok(engine) => engine,
        Err(e) => {
            let err = AppError::Config(format!("{:#}", e));
            eprintln!("Error: {}", err);
            std::process::exit(err.exit_code());
        }
    };

    let shutdown = shutdown_token();

    match cli.command {
        None => run_mcp_mode(engine, shutdown).await,
        Some(command) => run_cli_mode(engine, command, shutdown).await,
    }
}

/// Load configuration, apply command-line overrides and build the engine
fn build_engine(cli: &Cli) -> Result<SearchEngine> {
    let mut config = load_config(cli.config.as_deref())?;
    cli.backend.apply(&mut config);
    config.engine.validate()?;

    let backend = backend::from_config(&config.backend, config.engine.backend_timeout())?;
    info!("Using {} search backend", backend.name());

    Ok(SearchEngine::new(backend, config.engine))
}

/// Token cancelled on Ctrl-C
fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl-C, shutting down"),
            Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
        }
        trigger.cancel();
    });

    token
}

/// Run in CLI mode
async fn run_cli_mode(
    engine: SearchEngine,
    command: Commands,
    shutdown: CancellationToken,
) -> Result<()> {
    let result = match command {
        Commands::Search(args) => tools::search::execute_search(&engine, args, &shutdown).await,
        Commands::Suggest(args) => {
            tools::suggest::execute_suggest(&engine, args, &shutdown).await
        }
        Commands::Serve => return run_mcp_mode(engine, shutdown).await,
    };

    // Handle result and exit with appropriate code
    match result {
        Ok(tool_result) => {
            println!("{}", tool_result.into_text());
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(e.exit_code());
        }
    }
}

/// Run in MCP server mode
async fn run_mcp_mode(engine: SearchEngine, shutdown: CancellationToken) -> Result<()> {
    info!("Starting approval-search MCP Server");

    mcp::handle_stdio(engine, shutdown).await?;

    Ok(())
}
