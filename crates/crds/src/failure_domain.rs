//! CloudStackFailureDomain CRD
//!
//! A named, zone-scoped credential and account context. Failure domains are created by the
//! cluster controller as children of a `CloudStackCluster` and carry the same lifetime.

use crate::network::ZoneSpec;
use crate::references::SecretReference;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[kube(
    group = "infrastructure.cluster.x-k8s.io",
    version = "v1beta2",
    kind = "CloudStackFailureDomain",
    namespaced,
    status = "CloudStackFailureDomainStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct CloudStackFailureDomainSpec {
    /// Failure domain name, unique within a cluster
    pub name: String,

    /// Zone this failure domain provisions into
    pub zone: ZoneSpec,

    /// CloudStack account to scope API calls to
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub account: String,

    /// CloudStack domain of the account
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub domain: String,

    /// Secret holding the API endpoint credentials
    #[serde(rename = "acsEndpoint")]
    pub acs_endpoint: SecretReference,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CloudStackFailureDomainStatus {
    /// Credentials resolved and zone network observed
    #[serde(default)]
    pub ready: bool,

    /// Resolved zone network, if it exists yet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<crate::network::Network>,

    /// Last reconciliation error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Object name for a failure domain, stable across reconciles.
///
/// The logical failure domain name is hashed together with the owning cluster's name so
/// that two clusters in one namespace can both declare e.g. `zone-a`.
pub fn failure_domain_hashed_meta_name(fd_name: &str, cluster_name: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(fd_name.as_bytes());
    hasher.update(cluster_name.as_bytes());
    format!("{:x}", hasher.finalize())
}
