//! Connection configuration for AMQP clients.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use url::Url;

use crate::error::{ConnectError, ConnectResult};

/// Default AMQP port.
pub const DEFAULT_PORT: u16 = 5672;

/// Default port for TLS (`amqps`) connections.
pub const DEFAULT_AMQPS_PORT: u16 = 5671;

/// URI scheme selecting TLS transport, compared case-insensitively.
pub(crate) const AMQPS_SCHEME: &str = "amqps";

pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Connection configuration for a broker client
///
/// # Structure
/// - **Connection sources**: an explicit [`hosts`](Self::hosts) list and/or a
///   compact [`connection_uri`](Self::connection_uri);
///   [`resolve`](crate::resolve) reconciles the two.
/// - **Identity fields** (`product`, `platform`, `name`) and the scalar
///   feature flags stay `None` until resolution fills in defaults.
///
/// Construct one with partial data, pass it once through
/// [`resolve`](crate::resolve), then hand it to the transport layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Compact alternate source of host, port and virtual host
    #[serde(default)]
    pub connection_uri: Option<Url>,

    /// Broker addresses, in connection attempt order
    #[serde(default)]
    pub hosts: Vec<HostConfig>,

    /// Default port inherited by host entries without an explicit port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Broker-side namespace isolating exchanges and queues
    #[serde(default = "default_virtual_host")]
    pub virtual_host: String,

    /// Credentials, passed through to the transport layer untouched
    #[serde(default = "default_username")]
    pub username: String,

    #[serde(default = "default_password")]
    pub password: String,

    /// Heartbeat interval requested from the broker, in seconds
    #[serde(default = "default_heartbeat_secs")]
    pub requested_heartbeat_secs: u16,

    /// Consumer prefetch window
    #[serde(default = "default_prefetch_count")]
    pub prefetch_count: u16,

    /// Operation timeout in seconds; resolves to 10 when unset
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Whether publishes wait for broker confirms; resolves to false
    #[serde(default)]
    pub publisher_confirms: Option<bool>,

    /// Whether messages are published as persistent; resolves to true
    #[serde(default)]
    pub persistent_messages: Option<bool>,

    /// Product name advertised to the broker; resolves to the application name
    #[serde(default)]
    pub product: Option<String>,

    /// Platform advertised to the broker; resolves to the machine name
    #[serde(default)]
    pub platform: Option<String>,

    /// Connection name advertised to the broker; resolves to the application name
    #[serde(default)]
    pub name: Option<String>,

    /// Identification map sent to the broker at handshake
    #[serde(default)]
    pub client_properties: HashMap<String, String>,
}

impl ConnectionConfig {
    /// Load configuration from environment variables
    ///
    /// Only reads the mandatory variable:
    /// - `AMQP_URI`: broker connection URI (required)
    ///
    /// Everything else uses protocol defaults. To customize, load from a
    /// config file or set fields explicitly.
    pub fn from_env() -> ConnectResult<Self> {
        let uri = env::var("AMQP_URI").map_err(|_| ConnectError::config("AMQP_URI is required"))?;
        let connection_uri = Url::parse(&uri)?;

        Ok(Self {
            connection_uri: Some(connection_uri),
            ..Self::default()
        })
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &str) -> ConnectResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConnectError::config(format!("Failed to read config file {}: {}", path, e))
        })?;

        toml::from_str(&content).map_err(|e| {
            ConnectError::config(format!("Failed to parse config file {}: {}", path, e))
        })
    }

    /// Apply the `AMQP_URI` environment variable override, when set
    ///
    /// Other fields should come from config files, not env vars.
    pub fn apply_env_overrides(&mut self) -> ConnectResult<()> {
        if let Ok(uri) = env::var("AMQP_URI") {
            self.connection_uri = Some(Url::parse(&uri)?);
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> ConnectResult<()> {
        if self.port == 0 {
            return Err(ConnectError::config("port cannot be 0"));
        }

        if self.virtual_host.is_empty() {
            return Err(ConnectError::config("virtual_host cannot be empty"));
        }

        if self.username.is_empty() {
            return Err(ConnectError::config("username cannot be empty"));
        }

        Ok(())
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connection_uri: None,
            hosts: Vec::new(),
            port: DEFAULT_PORT,
            virtual_host: "/".to_string(),
            username: "guest".to_string(),
            password: "guest".to_string(),
            requested_heartbeat_secs: 10,
            prefetch_count: 50,
            timeout_secs: None,
            publisher_confirms: None,
            persistent_messages: None,
            product: None,
            platform: None,
            name: None,
            client_properties: HashMap::new(),
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_virtual_host() -> String {
    "/".to_string()
}
fn default_username() -> String {
    "guest".to_string()
}
fn default_password() -> String {
    "guest".to_string()
}
fn default_heartbeat_secs() -> u16 {
    10
}
fn default_prefetch_count() -> u16 {
    50
}

/// One broker address candidate
///
/// A port of 0 means "unset": resolution replaces it with the configuration
/// default port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostConfig {
    pub host: String,
    #[serde(default)]
    pub port: u16,
}

impl HostConfig {
    /// Create a host entry inheriting the configuration default port
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 0,
        }
    }

    /// Create a host entry with an explicit port
    pub fn with_port(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}
