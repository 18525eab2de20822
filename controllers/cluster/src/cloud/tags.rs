//! Ownership tags.
//!
//! CloudStack has no owner relation, so a resource a cluster uses carries a tag
//! `<prefix><cluster uid>`. Resources the controller created also carry the created-by
//! tag. A resource is garbage collected only when no ownership tag is left and the
//! created-by tag is present; anything the controller did not create is never destroyed.

use super::CloudOps;
use crate::error::ControllerError;
use cloudstack_client::ResourceType;
use crds::{CloudStackCluster, Network};
use kube::ResourceExt;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Value stored under every tag the controller writes
const TAG_VALUE: &str = "1";

impl CloudOps {
    /// Ownership tag key for a cluster
    pub fn cluster_tag_name(&self, cluster: &CloudStackCluster) -> Result<String, ControllerError> {
        let uid = cluster.uid().filter(|uid| !uid.is_empty()).ok_or_else(|| {
            ControllerError::InvalidConfig(format!("CloudStackCluster {} has no UID", cluster.name_any()))
        })?;
        Ok(format!("{}{}", self.config.cluster_tag_prefix, uid))
    }

    /// Add the cluster's ownership tag, and the created-by tag if requested, to a resource.
    ///
    /// Only tags missing from the resource are sent. Returns how many were applied.
    pub async fn add_cluster_tags(
        &self,
        resource_type: ResourceType,
        resource_id: &str,
        cluster: &CloudStackCluster,
        add_created_by: bool,
    ) -> Result<usize, ControllerError> {
        let existing = self.client.get_tags(resource_type, resource_id).await?;

        let mut new_tags = BTreeMap::new();
        let cluster_tag = self.cluster_tag_name(cluster)?;
        if !existing.contains_key(&cluster_tag) {
            new_tags.insert(cluster_tag, TAG_VALUE.to_string());
        }
        if add_created_by && !existing.contains_key(&self.config.created_by_tag) {
            new_tags.insert(self.config.created_by_tag.clone(), TAG_VALUE.to_string());
        }

        if new_tags.is_empty() {
            return Ok(0);
        }
        debug!("Tagging {} {} with {:?}", resource_type, resource_id, new_tags.keys());
        self.client.add_tags(resource_type, resource_id, &new_tags).await?;
        Ok(new_tags.len())
    }

    /// Remove this cluster's ownership tag, leaving other tags alone.
    pub async fn remove_cluster_tag(
        &self,
        resource_type: ResourceType,
        resource_id: &str,
        cluster: &CloudStackCluster,
    ) -> Result<(), ControllerError> {
        let existing = self.client.get_tags(resource_type, resource_id).await?;
        let cluster_tag = self.cluster_tag_name(cluster)?;
        if let Some(value) = existing.get(&cluster_tag) {
            let to_delete = BTreeMap::from([(cluster_tag.clone(), value.clone())]);
            self.client.delete_tags(resource_type, resource_id, &to_delete).await?;
        }
        Ok(())
    }

    pub async fn add_cluster_tags_to_network(
        &self,
        cluster: &CloudStackCluster,
        network: &Network,
        add_created_by: bool,
    ) -> Result<usize, ControllerError> {
        self.add_cluster_tags(ResourceType::Network, &network.id, cluster, add_created_by)
            .await
    }

    pub async fn remove_cluster_tag_from_network(&self, cluster: &CloudStackCluster, network: &Network) -> Result<(), ControllerError> {
        self.remove_cluster_tag(ResourceType::Network, &network.id, cluster).await
    }

    /// Whether a resource may be destroyed: no cluster references it and the controller created it
    async fn is_unused_and_created_by_controller(
        &self,
        resource_type: ResourceType,
        resource_id: &str,
    ) -> Result<bool, ControllerError> {
        let tags = self.client.get_tags(resource_type, resource_id).await?;
        let owners = tags
            .keys()
            .filter(|key| key.starts_with(&self.config.cluster_tag_prefix))
            .count();
        Ok(owners == 0 && tags.contains_key(&self.config.created_by_tag))
    }

    /// Destroy a network once no cluster owns it, if the controller created it.
    ///
    /// Returns whether the network was deleted.
    pub async fn delete_network_if_not_in_use(&self, network: &Network) -> Result<bool, ControllerError> {
        if network.id.is_empty() || !self.is_unused_and_created_by_controller(ResourceType::Network, &network.id).await? {
            return Ok(false);
        }
        info!("Deleting network {} ({}), no cluster uses it", network.name, network.id);
        self.destroy_network(network).await?;
        Ok(true)
    }

    /// Release a public IP once no cluster owns it, if the controller associated it.
    ///
    /// Returns whether the address was disassociated.
    pub async fn disassociate_public_ip_if_not_in_use(&self, public_ip_id: &str) -> Result<bool, ControllerError> {
        if public_ip_id.is_empty()
            || !self
                .is_unused_and_created_by_controller(ResourceType::PublicIpAddress, public_ip_id)
                .await?
        {
            return Ok(false);
        }
        info!("Disassociating public IP {}, no cluster uses it", public_ip_id);
        self.client.disassociate_ip_address(public_ip_id).await?;
        Ok(true)
    }
}
