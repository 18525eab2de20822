//! Control plane public IP.
//!
//! An address named by the cluster (endpoint host, or the address recorded by an
//! earlier pass) is used whatever its allocation state. Otherwise the first free
//! address visible to the account is taken.

use super::CloudOps;
use crate::error::ControllerError;
use cloudstack_client::{AssociateIpAddressParams, ListPublicIpAddressesParams, PublicIpAddress, ResourceType};
use crds::CloudStackCluster;
use tracing::info;

impl CloudOps {
    /// Pick the public IP for the control plane endpoint.
    pub async fn resolve_public_ip_details(&self, cluster: &CloudStackCluster) -> Result<PublicIpAddress, ControllerError> {
        let requested = cluster.requested_public_ip();
        let params = ListPublicIpAddressesParams {
            ip_address: (!requested.is_empty()).then(|| requested.to_string()),
            allocated_only: false,
            scope: Self::scope(cluster),
        };
        let mut addresses = self.client.list_public_ip_addresses(params).await?;

        if !requested.is_empty() && addresses.len() == 1 {
            return Ok(addresses.remove(0));
        }
        if addresses.is_empty() {
            return Err(ControllerError::PublicIp(
                "No public addresses found in available networks".to_string(),
            ));
        }
        addresses
            .into_iter()
            .find(|address| !address.is_allocated())
            .ok_or_else(|| ControllerError::PublicIp("All public IP addresses found were already allocated".to_string()))
    }

    /// Make sure the control plane has a public IP and record it in status.
    ///
    /// An already allocated address is only tagged as used by this cluster. A free
    /// address is associated with the cluster's network and tagged as created by the
    /// controller, so teardown may release it.
    pub async fn associate_public_ip_address(&self, cluster: &mut CloudStackCluster) -> Result<(), ControllerError> {
        let address = self.resolve_public_ip_details(cluster).await?;

        if address.is_allocated() {
            self.add_cluster_tags(ResourceType::PublicIpAddress, &address.id, cluster, false)
                .await?;
            let status = cluster.status_mut();
            status.public_ip_address = address.ip_address;
            status.public_ip_id = address.id;
            if status.public_ip_network_id.is_empty() {
                status.public_ip_network_id = address.associated_network_id;
            }
            return Ok(());
        }

        let params = AssociateIpAddressParams {
            ip_address: address.ip_address.clone(),
            network_id: cluster
                .first_zone_network()
                .map(|network| network.id.clone())
                .filter(|id| !id.is_empty()),
            scope: Self::scope(cluster),
        };
        let associated = self.client.associate_ip_address(params).await?;
        info!("Associated public IP {} ({})", associated.ip_address, associated.id);

        self.add_cluster_tags(ResourceType::PublicIpAddress, &associated.id, cluster, true)
            .await?;

        let status = cluster.status_mut();
        status.public_ip_address = associated.ip_address;
        status.public_ip_id = associated.id;
        status.public_ip_network_id = if associated.associated_network_id.is_empty() {
            associated.network_id
        } else {
            associated.associated_network_id
        };
        Ok(())
    }
}
