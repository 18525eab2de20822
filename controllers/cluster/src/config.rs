//! Controller configuration
//!
//! Loaded once from the environment in `main`. The cloud-facing subset is handed to
//! the reconciliation components as `CloudConfig` so tests can build fixtures directly.

use crate::error::ControllerError;
use std::time::Duration;

/// Settings used when talking to CloudStack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudConfig {
    /// Offering used for controller-created isolated networks
    pub isolated_network_offering: String,
    /// Control plane port used when the cluster does not set one
    pub default_api_port: i32,
    /// Ownership tag key prefix; the cluster UID is appended
    pub cluster_tag_prefix: String,
    /// Tag marking resources this controller created and may destroy
    pub created_by_tag: String,
    pub lb_rule_name: String,
    pub lb_algorithm: String,
    pub protocol: String,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            isolated_network_offering: "DefaultIsolatedNetworkOfferingWithSourceNatService".to_string(),
            default_api_port: 6443,
            cluster_tag_prefix: "CAPC_cluster_".to_string(),
            created_by_tag: "created_by_CAPC".to_string(),
            lb_rule_name: "Kubernetes_API_Server".to_string(),
            lb_algorithm: "roundrobin".to_string(),
            protocol: "tcp".to_string(),
        }
    }
}

/// Controller configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Namespace to watch; all namespaces when unset
    pub watch_namespace: Option<String>,
    pub cloud: CloudConfig,
    /// Shared client settings overlaid on every failure domain's credentials
    pub client_config_map_name: String,
    pub client_config_map_namespace: String,
    /// Delay before retrying when failure domains are not there yet
    pub requeue_delay: Duration,
    pub backoff_min_minutes: u64,
    pub backoff_max_minutes: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            watch_namespace: None,
            cloud: CloudConfig::default(),
            client_config_map_name: "capc-client-config".to_string(),
            client_config_map_namespace: "capc-system".to_string(),
            requeue_delay: Duration::from_secs(5),
            backoff_min_minutes: 1,
            backoff_max_minutes: 10,
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ControllerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ControllerError> {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        config.watch_namespace = get("WATCH_NAMESPACE");
        if let Some(v) = get("CAPC_NETWORK_OFFERING") {
            config.cloud.isolated_network_offering = v;
        }
        if let Some(v) = get("CAPC_DEFAULT_API_PORT") {
            config.cloud.default_api_port = parse("CAPC_DEFAULT_API_PORT", &v)?;
        }
        if let Some(v) = get("CAPC_CLUSTER_TAG_PREFIX") {
            config.cloud.cluster_tag_prefix = v;
        }
        if let Some(v) = get("CAPC_CREATED_BY_TAG") {
            config.cloud.created_by_tag = v;
        }
        if let Some(v) = get("CAPC_CLIENT_CONFIG_MAP") {
            config.client_config_map_name = v;
        }
        if let Some(v) = get("CAPC_CLIENT_CONFIG_NAMESPACE") {
            config.client_config_map_namespace = v;
        }
        if let Some(v) = get("CAPC_REQUEUE_SECONDS") {
            config.requeue_delay = Duration::from_secs(parse("CAPC_REQUEUE_SECONDS", &v)?);
        }
        if let Some(v) = get("CAPC_BACKOFF_MIN_MINUTES") {
            config.backoff_min_minutes = parse("CAPC_BACKOFF_MIN_MINUTES", &v)?;
        }
        if let Some(v) = get("CAPC_BACKOFF_MAX_MINUTES") {
            config.backoff_max_minutes = parse("CAPC_BACKOFF_MAX_MINUTES", &v)?;
        }

        if config.cloud.default_api_port <= 0 {
            return Err(ControllerError::InvalidConfig(format!(
                "CAPC_DEFAULT_API_PORT must be positive, got {}",
                config.cloud.default_api_port
            )));
        }
        if config.backoff_min_minutes == 0 || config.backoff_min_minutes > config.backoff_max_minutes {
            return Err(ControllerError::InvalidConfig(format!(
                "backoff bounds must satisfy 0 < min <= max, got {}..{}",
                config.backoff_min_minutes, config.backoff_max_minutes
            )));
        }
        Ok(config)
    }
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ControllerError> {
    value
        .parse()
        .map_err(|_| ControllerError::InvalidConfig(format!("{} has invalid value '{}'", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ControllerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ControllerConfig::default());
        assert_eq!(config.cloud.default_api_port, 6443);
        assert_eq!(config.cloud.cluster_tag_prefix, "CAPC_cluster_");
        assert_eq!(config.requeue_delay, Duration::from_secs(5));
    }

    #[test]
    fn test_overrides() {
        let config = ControllerConfig::from_lookup(lookup(&[
            ("WATCH_NAMESPACE", "clusters"),
            ("CAPC_DEFAULT_API_PORT", "8443"),
            ("CAPC_REQUEUE_SECONDS", "30"),
        ]))
        .unwrap();
        assert_eq!(config.watch_namespace.as_deref(), Some("clusters"));
        assert_eq!(config.cloud.default_api_port, 8443);
        assert_eq!(config.requeue_delay, Duration::from_secs(30));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(ControllerConfig::from_lookup(lookup(&[("CAPC_DEFAULT_API_PORT", "https")])).is_err());
        assert!(ControllerConfig::from_lookup(lookup(&[("CAPC_DEFAULT_API_PORT", "0")])).is_err());
        assert!(ControllerConfig::from_lookup(lookup(&[("CAPC_BACKOFF_MIN_MINUTES", "20")])).is_err());
    }
}
