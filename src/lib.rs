//! # AMQP Connect Core
//!
//! Connection configuration core for AMQP message-broker clients.
//!
//! This library prepares the configuration a broker transport consumes: it
//! reconciles a compact connection URI with an explicitly supplied host list,
//! applies port and virtual-host defaulting, and builds the identification
//! map advertised to the broker during handshake. The socket handshake,
//! channels, and publishing APIs live in the transport layer; this crate only
//! hands it a fully resolved [`ConnectionConfig`].
//!
//! ## Quick Start
//!
//! ```rust
//! use amqp_connect_core::{resolve, ConnectionConfig, ProcessEnvironment};
//!
//! let mut config = ConnectionConfig::default();
//! config.connection_uri = Some("amqp://broker.internal/prod".parse().unwrap());
//!
//! let config = resolve(config, &ProcessEnvironment).unwrap();
//! assert_eq!(config.virtual_host, "prod");
//! assert_eq!(config.hosts[0].port, 5672);
//! ```
//!
//! ## Features
//!
//! - **Two configuration sources, one result**: explicit host lists and
//!   `amqp://` connection URIs reconcile deterministically
//! - **Scheme-aware port defaulting**: `amqps` URIs fall back to the TLS port
//! - **Handshake identity**: client properties are derived from the process
//!   environment without overwriting caller-supplied values
//! - **Configuration**: standard environment variable and TOML file loading

mod config;
mod environment;
mod error;
mod normalize;

// Re-export public API
pub use config::{ConnectionConfig, HostConfig, DEFAULT_AMQPS_PORT, DEFAULT_PORT};
pub use environment::{EnvironmentInfo, ProcessEnvironment};
pub use error::{ConnectError, ConnectResult};
pub use normalize::resolve;

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
