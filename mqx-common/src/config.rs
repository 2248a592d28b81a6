//! TOML configuration and config-file resolution
//!
//! Config file resolution, first hit wins:
//! 1. Command-line argument (`--config`)
//! 2. Environment variable (`MQX_CONFIG`)
//! 3. `~/.config/mqx/config.toml` (platform config dir)
//! 4. Built-in defaults
//!
//! A missing config file is never fatal: the service logs a warning and
//! starts with defaults. A config file that exists but does not parse is
//! a `Config` error.

use crate::metadata::ArtistOrigin;
use crate::normalize::NormalizationSettings;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "MQX_CONFIG";

/// Top-level configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// HTTP bind address
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    ///
    /// Default: 5001
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub extractor: ExtractorConfig,

    #[serde(default)]
    pub normalization: NormalizationSettings,

    #[serde(default)]
    pub backend: BackendConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` wins when set
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

/// Which extractor variant the deployment runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Instruction prompt + worked examples, free-form completion
    #[default]
    Prompt,
    /// JSON-schema constrained decoding
    Constrained,
}

impl std::str::FromStr for Strategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "prompt" => Ok(Strategy::Prompt),
            "constrained" => Ok(Strategy::Constrained),
            other => Err(Error::Config(format!(
                "unknown extractor strategy '{}' (expected 'prompt' or 'constrained')",
                other
            ))),
        }
    }
}

/// Extractor behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractorConfig {
    #[serde(default)]
    pub strategy: Strategy,

    /// Collapse empty nested objects in results
    #[serde(default = "default_compact")]
    pub compact: bool,

    /// Which artist-origin field is extracted
    #[serde(default)]
    pub artist_origin: ArtistOrigin,
}

/// LLM backend flavour
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Ollama `/api/chat`
    #[default]
    Ollama,
    /// llama.cpp server `/completion`
    LlamaCpp,
}

/// Connection settings for the LLM backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub kind: BackendKind,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model name (ignored by llama.cpp, which serves a single model)
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default)]
    pub temperature: f32,

    #[serde(default)]
    pub max_tokens: Option<u32>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5001
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_compact() -> bool {
    true
}

fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "llama3.1:8b".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            logging: LoggingConfig::default(),
            extractor: ExtractorConfig::default(),
            normalization: NormalizationSettings::default(),
            backend: BackendConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            compact: default_compact(),
            artist_origin: ArtistOrigin::default(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::default(),
            base_url: default_base_url(),
            model: default_model(),
            temperature: 0.0,
            max_tokens: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject bounds that would make normalization produce invalid values
    pub fn validate(&self) -> Result<()> {
        let normalization = &self.normalization;
        if normalization.limit_cap == 0 {
            return Err(Error::Config(
                "normalization.limit_cap must be at least 1".to_string(),
            ));
        }

        let current_year = normalization.current_year();
        if normalization.year_floor > current_year {
            return Err(Error::Config(format!(
                "normalization.year_floor ({}) is after the current year ({})",
                normalization.year_floor, current_year
            )));
        }

        Ok(())
    }

    /// Load configuration from an existing file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Read TOML failed ({}): {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Resolve the config file and load it, falling back to defaults
    pub fn load_or_default(cli_arg: Option<&Path>) -> Result<Self> {
        match resolve_config_path(cli_arg) {
            Some(path) if path.exists() => {
                info!("Loading configuration from {}", path.display());
                Self::load(&path)
            }
            Some(path) => {
                warn!(
                    "Config file {} not found, using built-in defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            None => {
                info!("No config file found, using built-in defaults");
                Ok(Self::default())
            }
        }
    }
}

/// Pick the config file path by priority (CLI → ENV → user config dir)
///
/// The user config dir path is only returned when the file exists; explicit
/// paths are returned as given so a typo can be reported.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    default_config_path().filter(|path| path.exists())
}

/// Platform default config file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("mqx").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert_eq!(config, TomlConfig::default());
        assert_eq!(config.port, 5001);
        assert!(config.extractor.compact);
        assert_eq!(config.extractor.strategy, Strategy::Prompt);
        assert_eq!(config.normalization.limit_cap, 10);
        assert_eq!(config.normalization.year_floor, 1900);
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("prompt".parse::<Strategy>().unwrap(), Strategy::Prompt);
        assert_eq!(" Constrained ".parse::<Strategy>().unwrap(), Strategy::Constrained);
        assert!(matches!("jsonformer".parse::<Strategy>(), Err(Error::Config(_))));
    }

    #[test]
    fn test_zero_limit_cap_is_rejected() {
        let result = TomlConfig::from_toml_str("[normalization]\nlimit_cap = 0\n");
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("limit_cap")));
    }

    #[test]
    fn test_year_floor_after_current_year_is_rejected() {
        let toml = "[normalization]\nyear_floor = 2030\nreference_year = 2024\n";
        let result = TomlConfig::from_toml_str(toml);
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("year_floor")));

        let toml = "[normalization]\nyear_floor = 2024\nreference_year = 2024\n";
        assert!(TomlConfig::from_toml_str(toml).is_ok());
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let result = TomlConfig::from_toml_str("port = \"not a number\"");
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
