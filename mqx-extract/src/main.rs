//! Music query extraction service (mqx-extract) - Main entry point
//!
//! Loads configuration, builds the configured backend and extractor, and
//! serves the HTTP API until Ctrl+C or SIGTERM.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use mqx_common::config::{Strategy, TomlConfig};
use mqx_common::Normalizer;
use mqx_extract::backends::{build_backend, completion_options};
use mqx_extract::extractors::build_extractor;
use mqx_extract::logging::{init_tracing, load_config};
use mqx_extract::{build_router, AppState};
use tokio::signal;
use tracing::info;

/// Command-line arguments for mqx-extract
#[derive(Parser, Debug)]
#[command(name = "mqx-extract")]
#[command(about = "Music query extraction service")]
#[command(version)]
struct Args {
    /// Config file (default: $MQX_CONFIG, then ~/.config/mqx/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address
    #[arg(long, env = "MQX_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "MQX_PORT")]
    port: Option<u16>,

    /// Extractor strategy: prompt or constrained
    #[arg(short, long, env = "MQX_STRATEGY")]
    strategy: Option<Strategy>,

    /// Backend base URL
    #[arg(long, env = "MQX_BACKEND_URL")]
    backend_url: Option<String>,

    /// Backend model name
    #[arg(long, env = "MQX_MODEL")]
    model: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref()).context("Failed to load configuration")?;
    apply_overrides(&mut config, &args);

    init_tracing(&config.logging)?;

    info!(
        "Starting mqx-extract v{} ({} extractor, {:?} backend at {})",
        env!("CARGO_PKG_VERSION"),
        match config.extractor.strategy {
            Strategy::Prompt => "prompt",
            Strategy::Constrained => "constrained",
        },
        config.backend.kind,
        config.backend.base_url
    );

    let backend = build_backend(&config.backend).context("Failed to initialize LLM backend")?;
    if let Err(e) = backend.health_check().await {
        // Not fatal: the model server may come up after us
        tracing::warn!(error = %e, "LLM backend not reachable at startup");
    }

    let normalizer = Normalizer::new(config.normalization.clone(), config.extractor.artist_origin);
    let extractor = build_extractor(
        &config.extractor,
        normalizer,
        backend.clone(),
        completion_options(&config.backend),
    );

    let app = build_router(AppState::new(extractor, backend));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", config.host, config.port))?;

    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// CLI/env values win over the config file
fn apply_overrides(config: &mut TomlConfig, args: &Args) {
    if let Some(host) = &args.host {
        config.host = host.clone();
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(strategy) = args.strategy {
        config.extractor.strategy = strategy;
    }
    if let Some(url) = &args.backend_url {
        config.backend.base_url = url.clone();
    }
    if let Some(model) = &args.model {
        config.backend.model = model.clone();
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
