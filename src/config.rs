//! # Configuration Management
//!
//! Centralized configuration for the protocol server.
//!
//! This module provides structured configuration for the listener, transport
//! limits, the status (server list) response, and logging.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()`
//! - Direct instantiation with defaults
//!
//! ## Security Considerations
//! - The framing ceiling (4 MiB) bounds per-connection memory before a
//!   complete frame must resolve
//! - The accept backlog and inbound queue are bounded so a slow consumer
//!   cannot grow unbounded state

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{ProtocolError, Result};

/// Protocol version negotiated by the handshake (1.21).
pub const PROTOCOL_VERSION: i32 = 767;

/// Default TCP port for the listener.
pub const DEFAULT_PORT: u16 = 25565;

/// Max bytes the framer may accumulate without a resolvable frame (4 MiB).
pub const DEFAULT_MAX_FRAME_ACCUMULATION: usize = 4 * 1024 * 1024;

/// Accepted-but-unclaimed connection backlog.
pub const DEFAULT_ACCEPT_BACKLOG: usize = 256;

/// Session mailbox capacity. Producers never block on the mailbox, so this is
/// generous: protocol messages are small and drained promptly.
pub const MAILBOX_CAPACITY: usize = 1024;

/// Inbound packet queue between the read pump and the session actor.
pub const INBOUND_QUEUE_CAPACITY: usize = 10;

/// Main server configuration structure that contains all configurable settings
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ServerConfig {
    /// Listener configuration
    #[serde(default)]
    pub listener: ListenerConfig,

    /// Transport limits
    #[serde(default)]
    pub transport: TransportConfig,

    /// Status (server list) response content
    #[serde(default)]
    pub status: StatusConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ServerConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to open config file: {e}")))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to read config file: {e}")))?;

        Self::from_toml(&contents)
    }

    /// Load configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to parse TOML: {e}")))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListenerConfig {
    /// Bind address
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Accepted-connection backlog
    #[serde(default = "default_backlog")]
    pub backlog: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            backlog: default_backlog(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransportConfig {
    /// Framing ceiling in bytes
    #[serde(default = "default_max_accumulation")]
    pub max_frame_accumulation: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_frame_accumulation: default_max_accumulation(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StatusConfig {
    /// Message of the day shown in the server list
    #[serde(default = "default_motd")]
    pub motd: String,

    /// Advertised player capacity
    #[serde(default = "default_max_players")]
    pub max_players: u32,

    /// Advertised version name
    #[serde(default = "default_version_name")]
    pub version_name: String,

    /// Advertised protocol number
    #[serde(default = "default_protocol_version")]
    pub protocol_version: i32,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            motd: default_motd(),
            max_players: default_max_players(),
            version_name: default_version_name(),
            protocol_version: default_protocol_version(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log filter directive, e.g. "info" or "craft_protocol=debug"
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_backlog() -> usize {
    DEFAULT_ACCEPT_BACKLOG
}

fn default_max_accumulation() -> usize {
    DEFAULT_MAX_FRAME_ACCUMULATION
}

fn default_motd() -> String {
    "A craft-protocol server".to_string()
}

fn default_max_players() -> u32 {
    20
}

fn default_version_name() -> String {
    "1.21".to_string()
}

fn default_protocol_version() -> i32 {
    PROTOCOL_VERSION
}

fn default_log_level() -> String {
    "info".to_string()
}
