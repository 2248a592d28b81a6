//! Tracing setup
//!
//! Config loading logs (which file was used, or that defaults apply) happen
//! before the configured subscriber exists, so they run under a scoped
//! bootstrap subscriber filtered by `RUST_LOG`, default `info`.

use anyhow::{Context, Result};
use mqx_common::config::{LoggingConfig, TomlConfig};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing::Subscriber;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Resolve and load configuration with its log events on stderr
pub fn load_config(cli_arg: Option<&Path>) -> mqx_common::Result<TomlConfig> {
    let bootstrap = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    load_config_with(bootstrap, cli_arg)
}

/// Load configuration while `subscriber` receives its log events
pub fn load_config_with<S>(subscriber: S, cli_arg: Option<&Path>) -> mqx_common::Result<TomlConfig>
where
    S: Subscriber + Send + Sync + 'static,
{
    tracing::subscriber::with_default(subscriber, || TomlConfig::load_or_default(cli_arg))
}

/// Install the global subscriber
///
/// `RUST_LOG` wins; otherwise the configured level applies to our crates.
/// With `logging.file` set, events are also appended to that file.
pub fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "mqx_extract={level},mqx_common={level},tower_http={level}",
            level = logging.level
        ))
    });

    let file_layer = match &logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}
