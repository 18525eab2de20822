//! Public IP address operations for MockCloudStackClient

use super::{MockCloudStackClient, MockOperation};
use crate::error::CloudStackError;
use crate::models::*;
use crate::params::*;

impl MockCloudStackClient {
    /// Add a public IP address to the pool (for test setup)
    pub fn add_public_ip(&self, address: PublicIpAddress) {
        self.public_ips.lock().unwrap().push(address);
    }

    /// Convenience for `add_public_ip` with a free address
    pub fn add_free_public_ip(&self, id: &str, ip_address: &str) {
        self.add_public_ip(PublicIpAddress {
            id: id.to_string(),
            ip_address: ip_address.to_string(),
            ..Default::default()
        });
    }

    pub fn public_ip(&self, id: &str) -> Option<PublicIpAddress> {
        self.public_ips.lock().unwrap().iter().find(|ip| ip.id == id).cloned()
    }
}

pub async fn list_public_ip_addresses(client: &MockCloudStackClient, params: ListPublicIpAddressesParams) -> Result<Vec<PublicIpAddress>, CloudStackError> {
    client.record(MockOperation::ListPublicIpAddresses)?;
    let wanted = params.ip_address.filter(|ip| !ip.is_empty());
    Ok(client
        .public_ips
        .lock()
        .unwrap()
        .iter()
        .filter(|ip| wanted.as_ref().is_none_or(|w| &ip.ip_address == w))
        .filter(|ip| !params.allocated_only || ip.is_allocated())
        .cloned()
        .collect())
}

pub async fn associate_ip_address(client: &MockCloudStackClient, params: AssociateIpAddressParams) -> Result<PublicIpAddress, CloudStackError> {
    client.record(MockOperation::AssociateIpAddress)?;
    let mut ips = client.public_ips.lock().unwrap();
    let ip = ips
        .iter_mut()
        .find(|ip| ip.ip_address == params.ip_address)
        .ok_or_else(|| CloudStackError::NotFound(format!("Public IP {} not found", params.ip_address)))?;

    if ip.is_allocated() {
        return Err(CloudStackError::api(
            431,
            format!("Public IP {} is already allocated", params.ip_address),
        ));
    }

    ip.allocated = chrono::Utc::now().to_rfc3339();
    ip.associated_network_id = params.network_id.clone().unwrap_or_default();
    ip.network_id = ip.associated_network_id.clone();
    Ok(ip.clone())
}

pub async fn disassociate_ip_address(client: &MockCloudStackClient, id: &str) -> Result<(), CloudStackError> {
    client.record(MockOperation::DisassociateIpAddress)?;
    let mut ips = client.public_ips.lock().unwrap();
    let ip = ips
        .iter_mut()
        .find(|ip| ip.id == id)
        .ok_or_else(|| CloudStackError::NotFound(format!("Public IP {} not found", id)))?;
    ip.allocated.clear();
    ip.associated_network_id.clear();
    Ok(())
}
