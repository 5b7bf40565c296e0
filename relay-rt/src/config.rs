//! Node-wide configuration: the CLI-exposed settings plus the ambient
//! tunables the core specification leaves to the implementation.

// Layer 1: Standard library
use std::time::Duration;

// Layer 2: Third-party
use serde::{Deserialize, Serialize};

// Layer 3: Internal
use crate::util::duration_serde;

/// Default bounded mailbox capacity for every actor on this node.
pub const DEFAULT_MAILBOX_CAPACITY: usize = 10;

/// Default wait bound for the HTTP gateway's two supervisor/worker waits.
pub const DEFAULT_GATEWAY_TIMEOUT: Duration = Duration::from_secs(2);

/// Default wait bound for the worker's `send` builtin.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Default bound for graceful shutdown after Ctrl-C.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Default listen port.
pub const DEFAULT_PORT: u16 = 7700;

/// Per-node configuration, constructed once at process start and treated
/// as immutable thereafter.
///
/// # Examples
///
/// ```rust
/// use relay_rt::config::NodeConfig;
///
/// let config = NodeConfig::default();
/// assert_eq!(config.mailbox_capacity, 10);
///
/// let config = NodeConfig::builder()
///     .with_port(9000)
///     .with_node_id("node-a")
///     .build()
///     .unwrap();
/// assert_eq!(config.port, 9000);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    pub port: u16,
    pub node_id: String,
    #[serde(default)]
    pub initial_peers: Vec<String>,

    pub mailbox_capacity: usize,

    #[serde(with = "duration_serde")]
    pub gateway_timeout: Duration,

    #[serde(with = "duration_serde")]
    pub send_timeout: Duration,

    #[serde(with = "duration_serde")]
    pub shutdown_timeout: Duration,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            node_id: "relay-node".to_string(),
            initial_peers: Vec::new(),
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
            gateway_timeout: DEFAULT_GATEWAY_TIMEOUT,
            send_timeout: DEFAULT_SEND_TIMEOUT,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }
}

impl NodeConfig {
    pub fn builder() -> NodeConfigBuilder {
        NodeConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.mailbox_capacity == 0 {
            return Err("mailbox_capacity must be > 0".to_string());
        }
        if self.node_id.trim().is_empty() {
            return Err("node_id must not be empty".to_string());
        }
        if self.gateway_timeout.is_zero() {
            return Err("gateway_timeout must be > 0".to_string());
        }
        if self.send_timeout.is_zero() {
            return Err("send_timeout must be > 0".to_string());
        }
        if self.shutdown_timeout.is_zero() {
            return Err("shutdown_timeout must be > 0".to_string());
        }
        Ok(())
    }
}

/// Builder for [`NodeConfig`] with a fluent API, mirroring the teacher
/// lineage's `SystemConfigBuilder`.
#[derive(Debug, Default)]
pub struct NodeConfigBuilder {
    config: NodeConfig,
}

impl NodeConfigBuilder {
    pub fn with_port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn with_node_id(mut self, node_id: impl Into<String>) -> Self {
        self.config.node_id = node_id.into();
        self
    }

    pub fn with_initial_peers(mut self, peers: Vec<String>) -> Self {
        self.config.initial_peers = peers;
        self
    }

    pub fn with_mailbox_capacity(mut self, capacity: usize) -> Self {
        self.config.mailbox_capacity = capacity;
        self
    }

    pub fn with_gateway_timeout(mut self, timeout: Duration) -> Self {
        self.config.gateway_timeout = timeout;
        self
    }

    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.config.send_timeout = timeout;
        self
    }

    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.config.shutdown_timeout = timeout;
        self
    }

    pub fn build(self) -> Result<NodeConfig, String> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = NodeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.mailbox_capacity, 10);
        assert_eq!(config.gateway_timeout, Duration::from_secs(2));
    }

    #[test]
    fn builder_overrides_defaults() {
        let config = NodeConfig::builder()
            .with_port(9000)
            .with_node_id("node-a")
            .with_initial_peers(vec!["ws://localhost:9001".to_string()])
            .build()
            .expect("valid config");

        assert_eq!(config.port, 9000);
        assert_eq!(config.node_id, "node-a");
        assert_eq!(config.initial_peers, vec!["ws://localhost:9001".to_string()]);
    }

    #[test]
    fn zero_mailbox_capacity_fails_validation() {
        let result = NodeConfig::builder().with_mailbox_capacity(0).build();
        assert!(result.is_err());
    }

    #[test]
    fn empty_node_id_fails_validation() {
        let result = NodeConfig::builder().with_node_id("").build();
        assert!(result.is_err());
    }

    #[test]
    fn zero_gateway_timeout_fails_validation() {
        let result = NodeConfig::builder().with_gateway_timeout(Duration::from_secs(0)).build();
        assert!(result.is_err());
    }

    #[test]
    fn serializes_round_trip_through_json() {
        let config = NodeConfig::default();
        let json = serde_json::to_string(&config).expect("serializes");
        let back: NodeConfig = serde_json::from_str(&json).expect("deserializes");
        assert_eq!(back.port, config.port);
        assert_eq!(back.gateway_timeout, config.gateway_timeout);
    }
}
