use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::*;

#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    /// Externally visible IPv4 address advertised in 227 replies. Falls back
    /// to the control socket's local address when unset.
    pub pasv_address: Option<String>,
    pub root_dir: String,
    /// Synthetic child names overlaid on the virtual root `/`.
    pub virtual_roots: Vec<String>,
    pub anonymous_ok: bool,
    pub user: Option<String>,
    pub password: Option<String>,
    pub read_only: bool,
    pub data_buffer_bytes: usize,
    pub control_buffer_bytes: usize,
    pub passive_port_min: u16,
    pub passive_port_max: u16,
    pub data_timeout_secs: u64,
    pub control_idle_timeout_secs: u64,
    pub max_clients: u16,
    pub welcome_banner: String,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: String::from(DEFAULT_BIND_ADDRESS),
            port: DEFAULT_PORT,
            pasv_address: None,
            root_dir: String::from(DEFAULT_ROOT_DIR),
            virtual_roots: Vec::new(),
            anonymous_ok: true,
            user: None,
            password: None,
            read_only: false,
            data_buffer_bytes: DEFAULT_DATA_BUFFER_BYTES,
            control_buffer_bytes: DEFAULT_CONTROL_BUFFER_BYTES,
            passive_port_min: DEFAULT_PASSIVE_PORT_MIN,
            passive_port_max: DEFAULT_PASSIVE_PORT_MAX,
            data_timeout_secs: DEFAULT_DATA_TIMEOUT_SECS,
            control_idle_timeout_secs: DEFAULT_CONTROL_IDLE_TIMEOUT_SECS,
            max_clients: DEFAULT_MAX_CLIENTS,
            welcome_banner: String::from(DEFAULT_WELCOME_BANNER),
        }
    }
}

impl Config {
    pub fn load_from_file(path: &str) -> Result<Config> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path))?;
        let config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse configuration file: {}", path))?;
        Ok(config)
    }

    pub fn data_timeout(&self) -> Duration {
        Duration::from_secs(self.server.data_timeout_secs)
    }

    pub fn control_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.server.control_idle_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert_eq!(config.server.port, 21);
        assert_eq!(config.server.max_clients, 9);
        assert_eq!(config.server.data_buffer_bytes, 128 * 1024);
        assert!(config.server.passive_port_min < config.server.passive_port_max);
        assert!(config.server.anonymous_ok);
        assert!(!config.server.read_only);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [server]
            port = 2121
            root_dir = "/tmp/ftp"
            max_clients = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 2121);
        assert_eq!(config.server.root_dir, "/tmp/ftp");
        assert_eq!(config.server.max_clients, 3);
        assert_eq!(config.server.control_buffer_bytes, 4 * 1024);
        assert_eq!(config.server.data_timeout_secs, 50);
    }

    #[test]
    fn empty_toml_is_all_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.bind_address, "0.0.0.0");
        assert!(config.server.user.is_none());
        assert!(config.server.password.is_none());
    }
}
