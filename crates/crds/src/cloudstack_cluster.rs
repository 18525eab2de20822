//! CloudStackCluster CRD
//!
//! Declarative description of a cluster's CloudStack infrastructure: zones and their
//! networks, failure domains, account scoping, and the control plane endpoint.
//! The status is the durable record of convergence and is read back on every pass.

use crate::failure_domain::CloudStackFailureDomainSpec;
use crate::network::{Network, ZoneSpec, ZoneStatus};
use kube::{CustomResource, ResourceExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[kube(
    group = "infrastructure.cluster.x-k8s.io",
    version = "v1beta2",
    kind = "CloudStackCluster",
    namespaced,
    status = "CloudStackClusterStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct CloudStackClusterSpec {
    /// Zones the cluster spans
    #[serde(default)]
    pub zones: Vec<ZoneSpec>,

    /// Failure domains (credential + zone contexts)
    #[serde(default)]
    pub failure_domains: Vec<CloudStackFailureDomainSpec>,

    /// Control plane endpoint; host may be left empty for the controller to allocate
    #[serde(default)]
    pub control_plane_endpoint: ApiEndpoint,

    /// CloudStack account owning cluster resources
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub account: String,

    /// CloudStack domain of the account
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub domain: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApiEndpoint {
    /// Host (public IP address) of the endpoint
    #[serde(default)]
    pub host: String,

    /// Port of the endpoint; 0 means the default API server port
    #[serde(default)]
    pub port: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CloudStackClusterStatus {
    /// Resolved zones keyed by zone name
    #[serde(default)]
    pub zones: BTreeMap<String, ZoneStatus>,

    /// CloudStack domain ID resolved from spec.domain
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub domain_id: String,

    /// Public IP address backing the control plane endpoint
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub public_ip_address: String,

    /// Public IP ID backing the control plane endpoint
    #[serde(default, rename = "publicIPID", skip_serializing_if = "String::is_empty")]
    pub public_ip_id: String,

    /// Network the public IP is associated with
    #[serde(default, rename = "publicIPNetworkID", skip_serializing_if = "String::is_empty")]
    pub public_ip_network_id: String,

    /// Control plane load balancer rule ID
    #[serde(default, rename = "loadBalancerRuleID", skip_serializing_if = "String::is_empty")]
    pub lb_rule_id: String,

    /// Infrastructure has converged
    #[serde(default)]
    pub ready: bool,
}

impl CloudStackCluster {
    /// Name of the owning Cluster API cluster: the cluster-name label when present,
    /// otherwise this object's own name.
    pub fn capi_cluster_name(&self) -> String {
        self.labels()
            .get(crate::CLUSTER_NAME_LABEL)
            .cloned()
            .unwrap_or_else(|| self.name_any())
    }

    /// Status, created empty on first access
    pub fn status_mut(&mut self) -> &mut CloudStackClusterStatus {
        self.status.get_or_insert_with(Default::default)
    }

    /// Domain ID recorded in status, empty if not yet resolved
    pub fn domain_id(&self) -> &str {
        self.status.as_ref().map(|s| s.domain_id.as_str()).unwrap_or("")
    }

    /// Resolved network of the first specified zone.
    pub fn first_zone_network(&self) -> Option<&Network> {
        let first = self.spec.zones.first()?;
        self.status
            .as_ref()?
            .zones
            .get(&first.name)
            .map(|zone| &zone.network)
    }

    /// Public address to ask for: the spec endpoint host if set, otherwise the address
    /// recorded by a previous pass.
    pub fn requested_public_ip(&self) -> &str {
        if !self.spec.control_plane_endpoint.host.is_empty() {
            return &self.spec.control_plane_endpoint.host;
        }
        self.status
            .as_ref()
            .map(|s| s.public_ip_address.as_str())
            .unwrap_or("")
    }
}
