//! Connection configuration resolution.
//!
//! [`resolve`] is the single pass that turns a partially specified
//! [`ConnectionConfig`] into one the transport layer can open a connection
//! with: the connection URI and the explicit host list are reconciled, every
//! host ends up with a concrete port, and the identification map advertised
//! at handshake is populated.

use std::collections::HashMap;

use tracing::debug;
use url::Url;

use crate::config::{
    ConnectionConfig, HostConfig, AMQPS_SCHEME, DEFAULT_AMQPS_PORT, DEFAULT_PORT,
    DEFAULT_TIMEOUT_SECS,
};
use crate::environment::{split_executable_path, EnvironmentInfo, UNKNOWN};
use crate::error::{ConnectError, ConnectResult};

/// Resolve a connection configuration.
///
/// Consumes the partially specified configuration and returns the fully
/// resolved value, so a failed resolution leaves nothing half-mutated in the
/// caller's hands. Intended to run once per configuration, at client
/// construction time.
///
/// # Errors
///
/// Returns [`ConnectError::Configuration`] when no usable host remains after
/// reconciling the connection URI and the explicit host list.
pub fn resolve(
    mut config: ConnectionConfig,
    env: &dyn EnvironmentInfo,
) -> ConnectResult<ConnectionConfig> {
    reconcile_connection_uri(&mut config);

    if config.hosts.is_empty() {
        return Err(ConnectError::config("at least one host must be supplied"));
    }

    for host in &mut config.hosts {
        if host.port == 0 {
            host.port = config.port;
        }
    }

    apply_identity(&mut config, env);

    debug!(
        "resolved connection configuration: {} host(s), virtual host {}",
        config.hosts.len(),
        config.virtual_host
    );

    Ok(config)
}

/// Fold the connection URI into the host list and defaults.
///
/// Skipped entirely when any existing entry already names the URI's host; the
/// comparison is on the host string alone, so an entry with a different port
/// or virtual host still suppresses reconciliation. A URI without a host
/// component is ignored.
fn reconcile_connection_uri(config: &mut ConnectionConfig) {
    let Some(uri) = config.connection_uri.clone() else {
        return;
    };
    let Some(uri_host) = uri.host_str() else {
        return;
    };
    if config.hosts.iter().any(|entry| entry.host == uri_host) {
        return;
    }

    // The URI only supplies the default port when the caller hasn't.
    if config.port == DEFAULT_PORT {
        if let Some(port) = explicit_port(&uri) {
            debug!("adopting port {} from connection URI", port);
            config.port = port;
        } else if uri.scheme().eq_ignore_ascii_case(AMQPS_SCHEME) {
            debug!("adopting TLS default port {}", DEFAULT_AMQPS_PORT);
            config.port = DEFAULT_AMQPS_PORT;
        }
    }

    if let Some(virtual_host) = virtual_host_segment(&uri) {
        debug!("adopting virtual host {} from connection URI", virtual_host);
        config.virtual_host = virtual_host;
    }

    debug!("adding host {} from connection URI", uri_host);
    config.hosts.push(HostConfig::new(uri_host));
}

fn explicit_port(uri: &Url) -> Option<u16> {
    uri.port().filter(|port| *port > 0)
}

/// Final path segment of the URI, when the path carries more than the root.
fn virtual_host_segment(uri: &Url) -> Option<String> {
    let path = uri.path();
    if path.len() > 1 {
        path.rsplit('/').next().map(str::to_string)
    } else {
        None
    }
}

/// Fill identity fields and the identification map from environment facts.
///
/// Caller-supplied values always win: identity fields are only defaulted when
/// unset, and existing identification-map entries are never overwritten.
fn apply_identity(config: &mut ConnectionConfig, env: &dyn EnvironmentInfo) {
    let library_version = env.library_version();
    let runtime_version = env.runtime_version();
    let machine_name = env.machine_name();

    let (application, location) = split_executable_path(&env.executable_path())
        .unwrap_or_else(|| (UNKNOWN.to_string(), UNKNOWN.to_string()));

    let product = config
        .product
        .get_or_insert_with(|| application.clone())
        .clone();
    let platform = config
        .platform
        .get_or_insert_with(|| machine_name.clone())
        .clone();
    if config.name.is_none() {
        config.name = Some(application.clone());
    }

    let timeout = *config.timeout_secs.get_or_insert(DEFAULT_TIMEOUT_SECS);
    let publisher_confirms = *config.publisher_confirms.get_or_insert(false);
    let persistent_messages = *config.persistent_messages.get_or_insert(true);

    let properties = &mut config.client_properties;
    insert_if_absent(properties, "client_api", crate::NAME.to_string());
    insert_if_absent(properties, "product", product);
    insert_if_absent(properties, "platform", platform);
    insert_if_absent(properties, "net_version", runtime_version);
    insert_if_absent(properties, "version", library_version.clone());
    insert_if_absent(properties, "easynetq_version", library_version);
    insert_if_absent(properties, "application", application);
    insert_if_absent(properties, "application_location", location);
    insert_if_absent(properties, "machine_name", machine_name);
    insert_if_absent(properties, "timeout", timeout.to_string());
    insert_if_absent(
        properties,
        "publisher_confirms",
        publisher_confirms.to_string(),
    );
    insert_if_absent(
        properties,
        "persistent_messages",
        persistent_messages.to_string(),
    );
}

/// Insert a value only when the key is not already present.
pub(crate) fn insert_if_absent<V>(map: &mut HashMap<String, V>, key: &str, value: V) {
    map.entry(key.to_string()).or_insert(value);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct FakeEnvironment {
        executable_path: String,
    }

    impl Default for FakeEnvironment {
        fn default() -> Self {
            Self {
                executable_path: "/opt/billing/worker".to_string(),
            }
        }
    }

    impl EnvironmentInfo for FakeEnvironment {
        fn library_version(&self) -> String {
            "1.2.3".to_string()
        }
        fn runtime_version(&self) -> String {
            "1.75.0".to_string()
        }
        fn executable_path(&self) -> String {
            self.executable_path.clone()
        }
        fn machine_name(&self) -> String {
            "billing-01".to_string()
        }
    }

    fn config_with_uri(uri: &str) -> ConnectionConfig {
        ConnectionConfig {
            connection_uri: Some(uri.parse().unwrap()),
            ..ConnectionConfig::default()
        }
    }

    #[test]
    fn test_fails_without_hosts() {
        let err = resolve(ConnectionConfig::default(), &FakeEnvironment::default()).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("at least one host"));
    }

    #[test]
    fn test_uri_port_takes_precedence() {
        let config = config_with_uri("amqp://broker:1234/vh");
        let config = resolve(config, &FakeEnvironment::default()).unwrap();

        assert_eq!(config.port, 1234);
        assert_eq!(config.hosts, vec![HostConfig::with_port("broker", 1234)]);
        assert_eq!(config.virtual_host, "vh");
    }

    #[test]
    fn test_amqps_scheme_selects_tls_port() {
        let config = config_with_uri("amqps://broker");
        let config = resolve(config, &FakeEnvironment::default()).unwrap();

        assert_eq!(config.port, DEFAULT_AMQPS_PORT);
        assert_eq!(config.hosts[0].port, DEFAULT_AMQPS_PORT);
        assert_eq!(config.virtual_host, "/");
    }

    #[test]
    fn test_zero_uri_port_treated_as_unset() {
        let config = config_with_uri("amqps://broker:0");
        let config = resolve(config, &FakeEnvironment::default()).unwrap();

        assert_eq!(config.port, DEFAULT_AMQPS_PORT);
    }

    #[test]
    fn test_caller_port_override_preserved() {
        let mut config = config_with_uri("amqp://broker:1234");
        config.port = 9999;
        let config = resolve(config, &FakeEnvironment::default()).unwrap();

        assert_eq!(config.port, 9999);
        assert_eq!(config.hosts, vec![HostConfig::with_port("broker", 9999)]);
    }

    #[test]
    fn test_virtual_host_from_uri_path() {
        let config = config_with_uri("amqp://broker/myvhost");
        let config = resolve(config, &FakeEnvironment::default()).unwrap();
        assert_eq!(config.virtual_host, "myvhost");

        let config = config_with_uri("amqp://broker");
        let config = resolve(config, &FakeEnvironment::default()).unwrap();
        assert_eq!(config.virtual_host, "/");

        let config = config_with_uri("amqp://broker/");
        let config = resolve(config, &FakeEnvironment::default()).unwrap();
        assert_eq!(config.virtual_host, "/");
    }

    #[test]
    fn test_duplicate_host_suppresses_reconciliation() {
        let mut config = config_with_uri("amqp://broker:1234/vh");
        config.hosts.push(HostConfig::with_port("broker", 5000));
        let config = resolve(config, &FakeEnvironment::default()).unwrap();

        assert_eq!(config.hosts, vec![HostConfig::with_port("broker", 5000)]);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.virtual_host, "/");
    }

    #[test]
    fn test_port_inheritance() {
        let mut config = ConnectionConfig::default();
        config.hosts.push(HostConfig::new("rabbit-a"));
        config.hosts.push(HostConfig::with_port("rabbit-b", 5000));
        let config = resolve(config, &FakeEnvironment::default()).unwrap();

        assert_eq!(config.hosts[0].port, DEFAULT_PORT);
        assert_eq!(config.hosts[1].port, 5000);
    }

    #[test]
    fn test_identity_defaults() {
        let config = config_with_uri("amqp://broker");
        let config = resolve(config, &FakeEnvironment::default()).unwrap();

        assert_eq!(config.product.as_deref(), Some("worker"));
        assert_eq!(config.platform.as_deref(), Some("billing-01"));
        assert_eq!(config.name.as_deref(), Some("worker"));
        assert_eq!(config.timeout_secs, Some(10));
        assert_eq!(config.publisher_confirms, Some(false));
        assert_eq!(config.persistent_messages, Some(true));
    }

    #[test]
    fn test_caller_identity_preserved() {
        let mut config = config_with_uri("amqp://broker");
        config.product = Some("billing-api".to_string());
        config.timeout_secs = Some(30);
        let config = resolve(config, &FakeEnvironment::default()).unwrap();

        assert_eq!(config.product.as_deref(), Some("billing-api"));
        assert_eq!(config.client_properties["product"], "billing-api");
        assert_eq!(config.client_properties["timeout"], "30");
        // Name still falls back independently of product.
        assert_eq!(config.name.as_deref(), Some("worker"));
    }

    #[test]
    fn test_caller_property_survives() {
        let mut config = config_with_uri("amqp://broker");
        config
            .client_properties
            .insert("application".to_string(), "custom".to_string());
        let config = resolve(config, &FakeEnvironment::default()).unwrap();

        assert_eq!(config.client_properties["application"], "custom");
        assert_eq!(
            config.client_properties["application_location"],
            "/opt/billing"
        );
    }

    #[test]
    fn test_unusable_executable_path_falls_back() {
        let env = FakeEnvironment {
            executable_path: String::new(),
        };
        let config = resolve(config_with_uri("amqp://broker"), &env).unwrap();

        assert_eq!(config.client_properties["application"], UNKNOWN);
        assert_eq!(config.client_properties["application_location"], UNKNOWN);
        assert_eq!(config.product.as_deref(), Some(UNKNOWN));
    }

    #[test]
    fn test_second_resolution_is_idempotent() {
        let env = FakeEnvironment::default();
        let once = resolve(config_with_uri("amqp://broker:1234/vh"), &env).unwrap();
        let twice = resolve(once.clone(), &env).unwrap();

        assert_eq!(twice.hosts, once.hosts);
        assert_eq!(twice.port, once.port);
        assert_eq!(twice.virtual_host, once.virtual_host);
        assert_eq!(twice.client_properties, once.client_properties);
    }

    #[test]
    fn test_insert_if_absent() {
        let mut map = HashMap::new();
        insert_if_absent(&mut map, "key", 1);
        insert_if_absent(&mut map, "key", 2);
        assert_eq!(map["key"], 1);
    }
}
