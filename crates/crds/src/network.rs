//! Network and zone value types
//!
//! Shared between the cluster spec (desired zones) and the cluster status (resolved zones).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// CloudStack network type for controller-managed private networks
pub const NETWORK_TYPE_ISOLATED: &str = "Isolated";

/// CloudStack network type for pre-existing shared networks
pub const NETWORK_TYPE_SHARED: &str = "Shared";

/// A CloudStack network, either specified by name or resolved from the API
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    /// CloudStack network ID (observed)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    /// Network name
    #[serde(default)]
    pub name: String,

    /// Network type ("Isolated", "Shared", or empty before resolution)
    #[serde(default, rename = "type", skip_serializing_if = "String::is_empty")]
    pub network_type: String,
}

impl Network {
    /// A network that is only known by name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// A network is resolved once id, name, and type are all known.
    pub fn is_resolved(&self) -> bool {
        !self.name.is_empty() && !self.id.is_empty() && !self.network_type.is_empty()
    }

    pub fn is_isolated(&self) -> bool {
        self.network_type == NETWORK_TYPE_ISOLATED
    }
}

/// A zone the cluster spans, with the network used in that zone
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ZoneSpec {
    /// Zone name
    pub name: String,

    /// Zone ID (optional in spec, recorded in status)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    /// Network to place cluster resources on in this zone
    #[serde(default)]
    pub network: Network,
}

/// Observed per-zone state; same shape as the spec entry it was copied from.
pub type ZoneStatus = ZoneSpec;
