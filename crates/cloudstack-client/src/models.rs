//! CloudStack API models
//!
//! These models match the JSON objects returned by the CloudStack API
//! (`response=json`). Field names follow CloudStack's all-lowercase keys.

use serde::{Deserialize, Serialize};

/// Network model (listNetworks / createNetwork)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Network {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "displaytext")]
    pub display_text: String,
    /// "Isolated" or "Shared"
    #[serde(default, rename = "type")]
    pub network_type: String,
    #[serde(default, rename = "zoneid")]
    pub zone_id: String,
    #[serde(default)]
    pub account: String,
    #[serde(default, rename = "domainid")]
    pub domain_id: String,
}

/// Network offering model (listNetworkOfferings)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct NetworkOffering {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Public IP address model (listPublicIpAddresses / associateIpAddress)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PublicIpAddress {
    pub id: String,
    #[serde(default, rename = "ipaddress")]
    pub ip_address: String,
    /// Allocation timestamp; empty when the address is free.
    /// This is a timestamp, not a boolean.
    #[serde(default)]
    pub allocated: String,
    #[serde(default, rename = "associatednetworkid")]
    pub associated_network_id: String,
    #[serde(default, rename = "networkid")]
    pub network_id: String,
    #[serde(default, rename = "issourcenat")]
    pub is_source_nat: bool,
}

impl PublicIpAddress {
    pub fn is_allocated(&self) -> bool {
        !self.allocated.is_empty()
    }
}

/// Egress firewall rule model (createEgressFirewallRule)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct FirewallRule {
    pub id: String,
    #[serde(default, rename = "networkid")]
    pub network_id: String,
    #[serde(default)]
    pub protocol: String,
}

/// Load balancer rule model (listLoadBalancerRules / createLoadBalancerRule)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct LoadBalancerRule {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub algorithm: String,
    /// Public port, as CloudStack reports it (a string)
    #[serde(default, rename = "publicport")]
    pub public_port: String,
    #[serde(default, rename = "privateport")]
    pub private_port: String,
    #[serde(default, rename = "publicipid")]
    pub public_ip_id: String,
    #[serde(default, rename = "networkid")]
    pub network_id: String,
    #[serde(default)]
    pub protocol: String,
}

/// Virtual machine assigned to a load balancer rule (listLoadBalancerRuleInstances)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct LoadBalancerRuleInstance {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Resource tag model (listTags)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Tag {
    pub key: String,
    #[serde(default)]
    pub value: String,
    #[serde(default, rename = "resourceid")]
    pub resource_id: String,
    #[serde(default, rename = "resourcetype")]
    pub resource_type: String,
}

/// Domain model (listDomains)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Domain {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub path: String,
}

/// User model (listUsers)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub account: String,
    #[serde(default, rename = "domainid")]
    pub domain_id: String,
    #[serde(default, rename = "apikey")]
    pub api_key: String,
    #[serde(default, rename = "secretkey")]
    pub secret_key: String,
}

/// API key pair (getUserKeys / registerUserKeys)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct UserKeys {
    #[serde(default, rename = "apikey")]
    pub api_key: String,
    #[serde(default, rename = "secretkey")]
    pub secret_key: String,
}

/// Resource types that can carry tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceType {
    Network,
    PublicIpAddress,
}

impl ResourceType {
    /// Name CloudStack expects in the `resourcetype` parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Network => "Network",
            ResourceType::PublicIpAddress => "PublicIpAddress",
        }
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
