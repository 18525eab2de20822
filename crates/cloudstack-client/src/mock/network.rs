//! Network and network offering operations for MockCloudStackClient

use super::{MockCloudStackClient, MockOperation};
use crate::error::CloudStackError;
use crate::models::*;
use crate::params::*;

impl MockCloudStackClient {
    /// Add a network to the mock store (for test setup)
    pub fn add_network(&self, network: Network) {
        self.networks.lock().unwrap().push(network);
    }

    /// Add a network offering and return its id (for test setup)
    pub fn add_network_offering(&self, name: &str) -> String {
        let id = self.next_id("offering");
        self.offerings.lock().unwrap().push(NetworkOffering {
            id: id.clone(),
            name: name.to_string(),
        });
        id
    }

    /// All networks currently in the mock store
    pub fn networks(&self) -> Vec<Network> {
        self.networks.lock().unwrap().clone()
    }

    /// Rename a network in the mock store, as an operator would outside the controller
    pub fn rename_network(&self, id: &str, name: &str) {
        if let Some(network) = self.networks.lock().unwrap().iter_mut().find(|n| n.id == id) {
            network.name = name.to_string();
        }
    }

    pub fn network(&self, id: &str) -> Option<Network> {
        self.networks.lock().unwrap().iter().find(|n| n.id == id).cloned()
    }
}

pub async fn get_network_id(client: &MockCloudStackClient, name: &str) -> Result<(String, usize), CloudStackError> {
    client.record(MockOperation::GetNetworkId)?;
    let networks = client.networks.lock().unwrap();
    let matches: Vec<&Network> = networks.iter().filter(|n| n.name == name).collect();
    match matches.first() {
        Some(first) => Ok((first.id.clone(), matches.len())),
        None => Err(CloudStackError::no_match("Network", name)),
    }
}

pub async fn get_network_by_id(client: &MockCloudStackClient, id: &str) -> Result<(Network, usize), CloudStackError> {
    client.record(MockOperation::GetNetworkById)?;
    let networks = client.networks.lock().unwrap();
    let matches: Vec<&Network> = networks.iter().filter(|n| n.id == id).collect();
    match matches.first() {
        Some(first) => Ok(((*first).clone(), matches.len())),
        None => Err(CloudStackError::no_match("Network", id)),
    }
}

pub async fn create_network(client: &MockCloudStackClient, params: CreateNetworkParams) -> Result<Network, CloudStackError> {
    client.record(MockOperation::CreateNetwork)?;
    let offering_known = client
        .offerings
        .lock()
        .unwrap()
        .iter()
        .any(|o| o.id == params.network_offering_id);
    if !offering_known {
        return Err(CloudStackError::api(
            431,
            format!("Unable to find network offering by id {}", params.network_offering_id),
        ));
    }

    let network = Network {
        id: client.next_id("network"),
        name: params.name,
        display_text: params.display_text,
        network_type: "Isolated".to_string(),
        zone_id: params.zone_id,
        account: params.scope.account.unwrap_or_default(),
        domain_id: params.scope.domain_id.unwrap_or_default(),
    };
    client.networks.lock().unwrap().push(network.clone());
    Ok(network)
}

pub async fn delete_network(client: &MockCloudStackClient, id: &str) -> Result<(), CloudStackError> {
    client.record(MockOperation::DeleteNetwork)?;
    let mut networks = client.networks.lock().unwrap();
    let before = networks.len();
    networks.retain(|n| n.id != id);
    if networks.len() == before {
        return Err(CloudStackError::NotFound(format!("Network {} not found", id)));
    }
    Ok(())
}

pub async fn get_network_offering_id(client: &MockCloudStackClient, name: &str) -> Result<(String, usize), CloudStackError> {
    client.record(MockOperation::GetNetworkOfferingId)?;
    let offerings = client.offerings.lock().unwrap();
    let matches: Vec<&NetworkOffering> = offerings.iter().filter(|o| o.name == name).collect();
    match matches.first() {
        Some(first) => Ok((first.id.clone(), matches.len())),
        None => Err(CloudStackError::no_match("NetworkOffering", name)),
    }
}
