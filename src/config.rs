use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

/// Environment variable naming an optional YAML config file.
pub const CONFIG_ENV: &str = "RAWHTTP_CONFIG";

/// Environment variable overriding `listen_addr`.
pub const LISTEN_ENV: &str = "LISTEN";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub listen_addr: String,
    pub relay: RelayConfig,
    pub static_files: StaticFilesConfig,
}

/// Upstream used by the `/httpbin/` relay route.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Plain-HTTP base URL (e.g. "http://httpbin.org")
    pub upstream: String,
    /// Request target prefix routed to the upstream
    pub prefix: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    /// Largest chunk frame forwarded to the client
    pub chunk_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    pub video_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:42069".to_string(),
            relay: RelayConfig::default(),
            static_files: StaticFilesConfig::default(),
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            upstream: "http://httpbin.org".to_string(),
            prefix: "/httpbin/".to_string(),
            connect_timeout_secs: 5,
            request_timeout_secs: 30,
            chunk_size: 32,
        }
    }
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            video_path: PathBuf::from("assets/vim.mp4"),
        }
    }
}

impl RelayConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Config {
    /// Loads the config file named by `RAWHTTP_CONFIG` (or defaults), then
    /// applies `LISTEN`.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let listen = std::env::var(LISTEN_ENV).ok();
        Self::load_from(path.as_deref(), listen)
    }

    pub fn load_from(path: Option<&Path>, listen_override: Option<String>) -> anyhow::Result<Self> {
        let mut cfg = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read config {}", path.display()))?;
                Self::from_yaml(&raw)
                    .with_context(|| format!("invalid config {}", path.display()))?
            }
            None => Self::default(),
        };

        if let Some(addr) = listen_override {
            cfg.listen_addr = addr;
        }

        Ok(cfg)
    }

    pub fn from_yaml(raw: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }
}
