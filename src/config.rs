//! Configuration loading for the catalog data layer.
//!
//! All tunables are centralized here and loaded from `conf/config.toml` if
//! present. Any missing or invalid entries fall back to sensible defaults so
//! a host application can still start.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Data-layer configuration; deserializable from TOML.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub search_debounce_ms: u64,
    #[serde(default = "default_suggest_debounce_ms")]
    pub suggest_debounce_ms: u64,
    #[serde(default = "default_ai_model")]
    pub ai_model: String,
    #[serde(default = "default_ai_system_prompt")]
    pub ai_system_prompt: String,
    #[serde(default = "default_ai_temperature")]
    pub ai_temperature: f32,
    #[serde(default)]
    pub log_level: LogLevel,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        CatalogConfig {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            search_debounce_ms: 0,
            suggest_debounce_ms: default_suggest_debounce_ms(),
            ai_model: default_ai_model(),
            ai_system_prompt: default_ai_system_prompt(),
            ai_temperature: default_ai_temperature(),
            log_level: LogLevel::default(),
        }
    }
}

impl CatalogConfig {
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn suggest_debounce(&self) -> Duration {
        Duration::from_millis(self.suggest_debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Load configuration from the given path, falling back to defaults on error.
pub fn load_config(path: &Path) -> CatalogConfig {
    let contents = match fs::read_to_string(path) {
        Ok(data) => {
            info!(path = %path.display(), "Loaded base config");
            data
        }
        Err(err) => {
            warn!(
                path = %path.display(),
                "Falling back to default config: {err}"
            );
            return CatalogConfig::default();
        }
    };

    match toml::from_str::<CatalogConfig>(&contents) {
        Ok(cfg) => {
            debug!("Parsed configuration from disk");
            cfg
        }
        Err(err) => {
            warn!(path = %path.display(), "Invalid config TOML: {err}");
            CatalogConfig::default()
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_suggest_debounce_ms() -> u64 {
    600
}

fn default_ai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_ai_system_prompt() -> String {
    "You are a helpful assistant for book blurbs.".to_string()
}

fn default_ai_temperature() -> f32 {
    0.7
}

/// Supported logging verbosity levels.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_filter_str())
    }
}

impl LogLevel {
    pub fn as_filter_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
