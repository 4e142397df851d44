//! Client configuration loading.
//!
//! Holds the connection endpoint, socket timeouts and receive buffer size.
//! Values come from defaults, an optional JSON file, then environment
//! variable overrides.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use std::{fs, io};

use crate::constants;

/// Configuration for a [`crate::Client`].
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct ClientConfig {
    /// Host address of Touch Portal.
    pub host: String,
    /// Host port.
    pub port: u16,
    /// Receive buffer size in bytes. Must fit one complete message.
    pub receive_buffer_size: usize,
    /// Pairing deadline in milliseconds.
    pub handshake_timeout_ms: u64,
    /// Socket read timeout (receive loop poll interval) in milliseconds.
    pub read_timeout_ms: u64,
    /// Socket write timeout in milliseconds.
    pub write_timeout_ms: u64,
    /// TCP connect timeout in milliseconds.
    pub connect_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: constants::DEFAULT_HOST.to_string(),
            port: constants::DEFAULT_PORT,
            receive_buffer_size: constants::DEFAULT_RECEIVE_BUFFER_SIZE,
            handshake_timeout_ms: duration_ms(constants::HANDSHAKE_TIMEOUT),
            read_timeout_ms: duration_ms(constants::READ_TIMEOUT),
            write_timeout_ms: duration_ms(constants::WRITE_TIMEOUT),
            connect_timeout_ms: duration_ms(constants::CONNECT_TIMEOUT),
        }
    }
}

impl ClientConfig {
    /// Loads configuration from `path` (if given), then applies
    /// environment overrides.
    ///
    /// Without a path the defaults are used as the base. A path that does
    /// not exist is an error since the caller asked for it explicitly.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => {
                anyhow::anyhow!("Config file not found: {}", path.display())
            }
            _ => anyhow::Error::new(e).context(format!("read config {}", path.display())),
        })?;
        serde_json::from_str(&content)
            .with_context(|| format!("parse config {}", path.display()))
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from a key lookup. Unparseable values are ignored.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup("TOUCHPORTAL_HOST") {
            if !host.trim().is_empty() {
                self.host = host;
            }
        }

        if let Some(port) = lookup("TOUCHPORTAL_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.port = port;
            }
        }

        if let Some(size) = lookup("TOUCHPORTAL_RECEIVE_BUFFER_SIZE") {
            if let Ok(size) = size.parse::<usize>() {
                self.receive_buffer_size = size;
            }
        }

        if let Some(timeout) = lookup("TOUCHPORTAL_HANDSHAKE_TIMEOUT_MS") {
            if let Ok(timeout) = timeout.parse::<u64>() {
                self.handshake_timeout_ms = timeout;
            }
        }
    }

    /// Checks the values are usable.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            bail!("host cannot be empty");
        }
        if self.port == 0 {
            bail!("port cannot be 0");
        }
        if self.receive_buffer_size < constants::MIN_RECEIVE_BUFFER_SIZE {
            bail!(
                "receive_buffer_size {} is below the minimum of {} bytes",
                self.receive_buffer_size,
                constants::MIN_RECEIVE_BUFFER_SIZE
            );
        }
        for (name, value) in [
            ("handshake_timeout_ms", self.handshake_timeout_ms),
            ("read_timeout_ms", self.read_timeout_ms),
            ("write_timeout_ms", self.write_timeout_ms),
            ("connect_timeout_ms", self.connect_timeout_ms),
        ] {
            if value == 0 {
                bail!("{name} cannot be 0");
            }
        }
        Ok(())
    }

    /// Pairing deadline.
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }

    /// Socket read timeout.
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Socket write timeout.
    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    /// TCP connect timeout.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
