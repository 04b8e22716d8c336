use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub push: PushConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub base_url: String,
    pub push_path: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// How long a finished progress snapshot stays visible.
    pub progress_hide_delay_ms: u64,
    /// Prefix the web client is mounted under, e.g. `/claude`.
    pub router_basename: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_factor: f64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig::default(),
            sync: SyncConfig::default(),
            push: PushConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: format!("http://localhost:{}", default_server_port()),
            push_path: "/ws".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            progress_hide_delay_ms: 500,
            router_basename: String::new(),
        }
    }
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            base_delay_ms: 1000,
            max_delay_ms: 30000,
            backoff_factor: 2.0,
        }
    }
}

/// Get the default server port based on build type
pub fn default_server_port() -> u16 {
    if cfg!(debug_assertions) { 3001 } else { 3000 }
}

impl Config {
    pub fn load() -> Result<Self> {
        if let Some(config_file) = Self::config_file() {
            if config_file.exists() {
                let content = std::fs::read_to_string(&config_file)?;
                let config = toml::from_str::<Config>(&content)
                    .map_err(|e| anyhow::anyhow!("Invalid config {:?}: {}", config_file, e))?;
                tracing::debug!("Loaded config from {:?}", config_file);
                return Ok(config);
            }
        }
        Ok(Config::default())
    }

    fn config_file() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "texmux", "texmux")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }

    pub fn progress_hide_delay(&self) -> Duration {
        Duration::from_millis(self.sync.progress_hide_delay_ms)
    }

    /// Websocket URL of the push channel, derived from the HTTP base URL.
    pub fn push_url(&self) -> Result<url::Url> {
        let mut url = url::Url::parse(&self.server.base_url)?;
        let scheme = match url.scheme() {
            "https" => "wss",
            _ => "ws",
        };
        url.set_scheme(scheme)
            .map_err(|_| anyhow::anyhow!("Cannot derive push URL from {}", self.server.base_url))?;
        url.set_path(&self.server.push_path);
        Ok(url)
    }
}
