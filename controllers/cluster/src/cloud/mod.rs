//! CloudStack resource management.
//!
//! Each file covers one family of cluster infrastructure:
//! - `tags`: ownership tags and tag-gated garbage collection
//! - `network`: zone network resolution and isolated network creation
//! - `domain`: account domain resolution
//! - `public_ip`: control plane public IP selection and association
//! - `firewall`: egress firewall rule
//! - `load_balancer`: control plane load balancer rule and membership
//!
//! All operations hang off `CloudOps`, which pairs a (usually account-scoped) client
//! with the cloud configuration. Operations that update the cluster write into
//! `status` in place; persisting it is the reconciler's job.

pub mod domain;
pub mod firewall;
pub mod load_balancer;
pub mod network;
pub mod public_ip;
pub mod tags;

#[cfg(test)]
mod firewall_test;
#[cfg(test)]
mod load_balancer_test;
#[cfg(test)]
mod tags_test;

use crate::config::CloudConfig;
use cloudstack_client::{CloudStackClientTrait, Scope};
use crds::CloudStackCluster;
use std::sync::Arc;

/// CloudStack operations for one cluster pass
#[derive(Clone)]
pub struct CloudOps {
    client: Arc<dyn CloudStackClientTrait>,
    config: Arc<CloudConfig>,
}

impl std::fmt::Debug for CloudOps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudOps")
            .field("api_url", &self.client.api_url())
            .field("config", &self.config)
            .finish()
    }
}

impl CloudOps {
    pub fn new(client: Arc<dyn CloudStackClientTrait>, config: Arc<CloudConfig>) -> Self {
        Self { client, config }
    }

    /// Account/domain scoping for list and create calls; empty fields are not sent.
    pub(crate) fn scope(cluster: &CloudStackCluster) -> Scope {
        Scope::new(&cluster.spec.account, cluster.domain_id())
    }
}
