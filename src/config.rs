//! Server configuration.

use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the listener binds to.
    pub listen_addr: String,
    /// Seconds a connection may sit idle before it is closed.
    pub idle_timeout_secs: u64,
    /// Size of the per-connection read buffer in bytes.
    pub read_buffer_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            idle_timeout_secs: 30,
            read_buffer_size: 4096,
        }
    }
}

impl ServerConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

impl Config {
    /// Loads configuration.
    ///
    /// Reads the YAML file named by `PORTICO_CONFIG` when that variable is
    /// set, falling back to defaults on any problem; the `LISTEN` variable
    /// overrides the listen address either way.
    pub fn load() -> Self {
        let mut cfg = match std::env::var("PORTICO_CONFIG") {
            Ok(path) => match std::fs::read_to_string(&path) {
                Ok(text) => match serde_yaml::from_str(&text) {
                    Ok(cfg) => cfg,
                    Err(e) => {
                        warn!("Invalid config file {}: {}", path, e);
                        Config::default()
                    }
                },
                Err(e) => {
                    warn!("Cannot read config file {}: {}", path, e);
                    Config::default()
                }
            },
            Err(_) => Config::default(),
        };

        if let Ok(addr) = std::env::var("LISTEN") {
            cfg.server.listen_addr = addr;
        }

        cfg
    }
}
