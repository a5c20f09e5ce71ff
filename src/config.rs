use serde::Deserialize;

use crate::aggregator::{DEFAULT_HISTORY, DEFAULT_INTERVAL_SECS};
use crate::framer::DEFAULT_CHUNK_SIZE;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub listener: ListenerConfig,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub publishing: PublishingConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
}

/// Inbound telemetry endpoint (one producer at a time).
#[derive(Debug, Clone, Deserialize)]
pub struct ListenerConfig {
    #[serde(default = "default_listener_host")]
    pub host: String,
    #[serde(default = "default_listener_port")]
    pub port: u16,
    #[serde(default = "default_read_chunk_size")]
    pub read_chunk_size: usize,
}

fn default_listener_host() -> String {
    "0.0.0.0".into()
}

fn default_listener_port() -> u16 {
    5000
}

fn default_read_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: default_listener_host(),
            port: default_listener_port(),
            read_chunk_size: default_read_chunk_size(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WindowConfig {
    /// Samples kept per channel.
    #[serde(default = "default_history")]
    pub history: usize,
    /// Interval assumed until the producer sends INTERVAL_US.
    #[serde(default = "default_interval_secs")]
    pub default_interval_secs: f64,
}

fn default_history() -> usize {
    DEFAULT_HISTORY
}

fn default_interval_secs() -> f64 {
    DEFAULT_INTERVAL_SECS
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            history: default_history(),
            default_interval_secs: default_interval_secs(),
        }
    }
}

/// HTTP/WebSocket API for consumers.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
}

fn default_server_host() -> String {
    "0.0.0.0".into()
}

fn default_server_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublishingConfig {
    /// Events buffered per consumer before a slow one starts skipping.
    #[serde(default = "default_broadcast_capacity")]
    pub broadcast_capacity: usize,
}

fn default_broadcast_capacity() -> usize {
    256
}

impl Default for PublishingConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: default_broadcast_capacity(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshConfig {
    /// Lower bound on the view refresh cadence.
    #[serde(default = "default_min_refresh_ms")]
    pub min_refresh_ms: u64,
    /// How often to log pipeline counters at INFO level.
    #[serde(default = "default_stats_log_interval_secs")]
    pub stats_log_interval_secs: u64,
}

fn default_min_refresh_ms() -> u64 {
    50
}

fn default_stats_log_interval_secs() -> u64 {
    60
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            min_refresh_ms: default_min_refresh_ms(),
            stats_log_interval_secs: default_stats_log_interval_secs(),
        }
    }
}

impl AppConfig {
    /// Load from `$CONFIG_FILE` (default `config.toml`). A missing file
    /// means built-in defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        match std::fs::read_to_string(&path) {
            Ok(s) => Self::load_from_str(&s),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path, "config file not found; using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!("read {}: {}", path, e)),
        }
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.listener.port > 0,
            "listener.port must be between 1 and 65535, got {}",
            self.listener.port
        );
        anyhow::ensure!(
            !self.listener.host.is_empty(),
            "listener.host must be non-empty"
        );
        anyhow::ensure!(
            self.listener.read_chunk_size > 0,
            "listener.read_chunk_size must be > 0, got {}",
            self.listener.read_chunk_size
        );
        anyhow::ensure!(
            self.window.history > 0,
            "window.history must be > 0, got {}",
            self.window.history
        );
        anyhow::ensure!(
            self.window.default_interval_secs.is_finite()
                && self.window.default_interval_secs > 0.0,
            "window.default_interval_secs must be > 0, got {}",
            self.window.default_interval_secs
        );
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            self.publishing.broadcast_capacity > 0,
            "publishing.broadcast_capacity must be > 0, got {}",
            self.publishing.broadcast_capacity
        );
        anyhow::ensure!(
            self.refresh.min_refresh_ms > 0,
            "refresh.min_refresh_ms must be > 0, got {}",
            self.refresh.min_refresh_ms
        );
        anyhow::ensure!(
            self.refresh.stats_log_interval_secs > 0,
            "refresh.stats_log_interval_secs must be > 0, got {}",
            self.refresh.stats_log_interval_secs
        );
        Ok(())
    }
}
