//! CloudStack infrastructure CRD Definitions
//!
//! Kubernetes Custom Resource Definitions reconciled by the CloudStack cluster controller.

pub mod cloudstack_cluster;
pub mod failure_domain;
pub mod network;
pub mod references;

pub use cloudstack_cluster::*;
pub use failure_domain::*;
pub use network::*;
pub use references::*;

/// API group shared by all infrastructure CRDs
pub const API_GROUP: &str = "infrastructure.cluster.x-k8s.io";

/// Label carrying the owning Cluster API cluster name
pub const CLUSTER_NAME_LABEL: &str = "cluster.x-k8s.io/cluster-name";
