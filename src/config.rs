//! Configuration management for the protoline server binary
//!
//! Values come from the built-in defaults, then an optional `config.toml` in the
//! working directory, then `PROTOLINE_*` environment variables.

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use std::net::IpAddr;
use std::time::Duration;

use crate::protocol::TelnetOptions;
use crate::server::ServerOptions;

const CONFIG_FILE: &str = "config";
const ENV_PREFIX: &str = "PROTOLINE";

/// Which line protocol the binary serves
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolKind {
    Echo,
    Smtp,
}

/// Complete application configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    /// IP address the listener binds to
    pub bind_address: String,

    /// Listening port
    /// Environment: PROTOLINE_PORT
    pub port: i32,

    /// Maximum concurrent connections
    /// Environment: PROTOLINE_MAX_CONNECTIONS
    pub max_connections: usize,

    pub protocol: ProtocolKind,

    /// Longest accepted request line in bytes
    pub max_line_length: usize,

    /// Seconds to wait for a line before dropping the peer, 0 disables
    pub read_timeout_secs: u64,

    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8100,
            max_connections: 100,
            protocol: ProtocolKind::Echo,
            max_line_length: 4096,
            read_timeout_secs: 0,
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from config.toml with environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string on top of the defaults
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from_str(contents, FileFormat::Toml))
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=i32::from(u16::MAX)).contains(&self.port) {
            return Err(ConfigError::Message(format!(
                "port must be between 1 and 65535, got {}",
                self.port
            )));
        }

        if self.max_connections == 0 {
            return Err(ConfigError::Message(
                "max_connections must be greater than 0".into(),
            ));
        }

        if self.max_line_length == 0 {
            return Err(ConfigError::Message(
                "max_line_length must be greater than 0".into(),
            ));
        }

        if self.bind_address.parse::<IpAddr>().is_err() {
            return Err(ConfigError::Message(format!(
                "bind_address is not an IP address: {}",
                self.bind_address
            )));
        }

        Ok(())
    }

    /// Acceptor options derived from this configuration
    pub fn server_options(&self) -> ServerOptions {
        let defaults = ServerOptions::default();
        ServerOptions {
            bind_address: self.bind_address.parse().unwrap_or(defaults.bind_address),
            max_connections: self.max_connections,
        }
    }

    /// Engine options derived from this configuration
    pub fn telnet_options(&self) -> TelnetOptions {
        TelnetOptions {
            max_line_length: self.max_line_length,
            read_timeout: (self.read_timeout_secs > 0)
                .then(|| Duration::from_secs(self.read_timeout_secs)),
        }
    }
}
