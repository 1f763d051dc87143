//! Configuration management
//!
//! Settings are resolved in this order (later wins):
//! 1. defaults
//! 2. `ef-gateway.toml` (or an explicit path)
//! 3. environment variables (`EF_*`)
//!
//! The binary applies its command-line flags on top of the result.
//! Inside the TOML file `${VAR_NAME}` is expanded from the environment.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::{Error, Result};

/// Default configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "ef-gateway.toml";

/// Listener configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    /// Bind address in `host:port` form
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

/// TLS certificate and key locations (PEM), relative to the working directory
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TlsConfig {
    #[serde(default = "default_cert_path")]
    pub cert_path: String,

    #[serde(default = "default_key_path")]
    pub key_path: String,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            cert_path: default_cert_path(),
            key_path: default_key_path(),
        }
    }
}

/// WebSocket upgrade policy
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WsConfig {
    /// Origins allowed to open the feed (e.g. `["https://example.com"]`).
    /// `None` accepts any origin.
    #[serde(default)]
    pub allowed_origins: Option<Vec<String>>,
}

/// Per-connection timing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionConfig {
    /// Time allowed to write one frame
    #[serde(default = "default_write_wait_secs")]
    pub write_wait_secs: u64,

    /// Time allowed between two pongs from the peer
    #[serde(default = "default_pong_wait_secs")]
    pub pong_wait_secs: u64,

    /// Delay between two outbound event frames
    #[serde(default = "default_emit_interval_ms")]
    pub emit_interval_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            write_wait_secs: default_write_wait_secs(),
            pong_wait_secs: default_pong_wait_secs(),
            emit_interval_ms: default_emit_interval_ms(),
        }
    }
}

impl SessionConfig {
    pub fn write_wait(&self) -> Duration {
        Duration::from_secs(self.write_wait_secs)
    }

    pub fn pong_wait(&self) -> Duration {
        Duration::from_secs(self.pong_wait_secs)
    }

    /// Ping period, nine tenths of the pong wait so a ping always lands
    /// before the peer's deadline.
    pub fn ping_period(&self) -> Duration {
        self.pong_wait() * 9 / 10
    }

    pub fn emit_interval(&self) -> Duration {
        Duration::from_millis(self.emit_interval_ms)
    }
}

fn default_bind_addr() -> String {
    "localhost:443".to_string()
}

fn default_cert_path() -> String {
    "ca/cacert.pem".to_string()
}

fn default_key_path() -> String {
    "ca/cakey.pem".to_string()
}

fn default_write_wait_secs() -> u64 {
    10
}

fn default_pong_wait_secs() -> u64 {
    60
}

fn default_emit_interval_ms() -> u64 {
    1000
}

/// Main configuration for ef-gateway
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GatewayConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub tls: TlsConfig,

    #[serde(default)]
    pub ws: WsConfig,

    #[serde(default)]
    pub session: SessionConfig,
}

impl GatewayConfig {
    /// Expand `${VAR_NAME}` references using `lookup`.
    ///
    /// Unknown variables expand to the empty string.
    fn expand_vars(value: &str, lookup: &impl Fn(&str) -> Option<String>) -> String {
        let mut result = String::with_capacity(value.len());
        let mut chars = value.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '$' && chars.peek() == Some(&'{') {
                chars.next();

                let mut var_name = String::new();
                for c in chars.by_ref() {
                    if c == '}' {
                        break;
                    }
                    var_name.push(c);
                }

                if let Some(env_value) = lookup(&var_name) {
                    result.push_str(&env_value);
                }
            } else {
                result.push(c);
            }
        }

        result
    }

    /// Parse a TOML document, expanding `${VAR}` references first
    pub fn from_toml_str(
        content: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let expanded = Self::expand_vars(content, &lookup);
        toml::from_str(&expanded)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))
    }

    /// Load a TOML file and apply environment overrides
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        let mut cfg = Self::from_toml_str(&content, env_lookup)?;
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    /// Load configuration from the default locations
    ///
    /// Uses `path` when given, otherwise `./ef-gateway.toml` if it exists,
    /// otherwise defaults plus environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_toml_file(path);
        }

        if Path::new(DEFAULT_CONFIG_FILE).exists() {
            tracing::debug!("Loading configuration from {}", DEFAULT_CONFIG_FILE);
            return Self::from_toml_file(DEFAULT_CONFIG_FILE);
        }

        Ok(Self::from_env())
    }

    /// Defaults with environment overrides applied
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.apply_env_overrides();
        cfg
    }

    /// Override settings from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(env_lookup);
    }

    /// Override settings from `lookup` (`EF_*` keys).
    ///
    /// Empty values and unparsable numbers leave the current value in place.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(addr) = get("EF_BIND_ADDR") {
            self.server.bind_addr = addr;
        }

        if let Some(path) = get("EF_TLS_CERT") {
            self.tls.cert_path = path;
        }
        if let Some(path) = get("EF_TLS_KEY") {
            self.tls.key_path = path;
        }

        if let Some(origins) = get("EF_ALLOWED_ORIGINS") {
            self.ws.allowed_origins = Some(
                origins
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            );
        }

        if let Some(secs) = get("EF_WRITE_WAIT_SECS").and_then(|v| v.parse().ok()) {
            self.session.write_wait_secs = secs;
        }
        if let Some(secs) = get("EF_PONG_WAIT_SECS").and_then(|v| v.parse().ok()) {
            self.session.pong_wait_secs = secs;
        }
        if let Some(ms) = get("EF_EMIT_INTERVAL_MS").and_then(|v| v.parse().ok()) {
            self.session.emit_interval_ms = ms;
        }
    }

    /// Reject settings the session driver cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.server.bind_addr.trim().is_empty() {
            return Err(Error::Config("server.bind_addr must not be empty".to_string()));
        }
        if self.session.write_wait_secs == 0 {
            return Err(Error::Config("session.write_wait_secs must be positive".to_string()));
        }
        if self.session.pong_wait_secs == 0 {
            return Err(Error::Config("session.pong_wait_secs must be positive".to_string()));
        }
        if self.session.emit_interval_ms == 0 {
            return Err(Error::Config("session.emit_interval_ms must be positive".to_string()));
        }
        Ok(())
    }
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}
