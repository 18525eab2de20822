//! Zone network resolution and isolated network creation.

use super::CloudOps;
use crate::classify::is_not_found;
use crate::error::ControllerError;
use cloudstack_client::CreateNetworkParams;
use crds::{CloudStackCluster, Network};
use tracing::{debug, info};

/// A network exists once name, id and type are all known.
pub fn network_exists(network: &Network) -> bool {
    network.is_resolved()
}

/// Resolved network of a zone, falling back to the spec entry before the first pass
fn zone_network<'a>(cluster: &'a CloudStackCluster, zone_name: &str) -> Option<&'a Network> {
    cluster
        .status
        .as_ref()
        .and_then(|status| status.zones.get(zone_name))
        .map(|zone| &zone.network)
        .or_else(|| {
            cluster
                .spec
                .zones
                .iter()
                .find(|zone| zone.name == zone_name)
                .map(|zone| &zone.network)
        })
}

/// A single-zone cluster whose network is missing or isolated gets the isolated topology
/// (controller-owned network, public IP, firewall and load balancer rules).
pub fn uses_isolated_network(cluster: &CloudStackCluster) -> bool {
    let [zone] = cluster.spec.zones.as_slice() else {
        return false;
    };
    zone_network(cluster, &zone.name).is_some_and(|network| network.network_type.is_empty() || network.is_isolated())
}

impl CloudOps {
    /// Fill in id and type of a named network from CloudStack.
    ///
    /// The network is looked up by name, then its details are fetched by id. The name
    /// lookup is authoritative: an id already carried by the network is only used to
    /// report a failed or non-unique name match together with the id lookup. A known id
    /// whose network now has another name is an error. The network is only modified on
    /// success.
    pub async fn resolve_network(&self, network: &mut Network) -> Result<(), ControllerError> {
        let mut errors = Vec::new();
        let mut id = network.id.clone();

        match self.client.get_network_id(&network.name).await {
            Ok((found, 1)) => id = found,
            Ok((_, count)) => errors.push(ControllerError::Ambiguous {
                kind: "Network".to_string(),
                key: format!("name {}", network.name),
                count,
            }),
            Err(e) => errors.push(ControllerError::context(
                format!("Could not get Network ID from {}", network.name),
                e,
            )),
        }

        if id.is_empty() {
            return Err(combine(errors, &network.name));
        }

        match self.client.get_network_by_id(&id).await {
            Ok((details, 1)) if details.name != network.name => errors.push(ControllerError::InvalidConfig(format!(
                "Network {} is named {} in CloudStack, expected {}",
                details.id, details.name, network.name
            ))),
            Ok((details, 1)) => {
                if errors.is_empty() {
                    network.id = details.id;
                    network.network_type = details.network_type;
                    return Ok(());
                }
            }
            Ok((_, count)) => errors.push(ControllerError::Ambiguous {
                kind: "Network".to_string(),
                key: format!("id {}", id),
                count,
            }),
            Err(e) => errors.push(ControllerError::context(
                format!("Could not get Network by ID {}", id),
                e,
            )),
        }
        Err(combine(errors, &network.name))
    }

    /// Copy spec zones into status and resolve each zone's network, in spec order.
    ///
    /// A network that does not exist yet is left unresolved for the caller to create.
    /// Any other failure stops at the zone it happened in. Networks found are tagged
    /// as used by this cluster, without the created-by tag.
    pub async fn resolve_network_statuses(&self, cluster: &mut CloudStackCluster) -> Result<(), ControllerError> {
        let spec_zones = cluster.spec.zones.clone();
        {
            let status = cluster.status_mut();
            for spec_zone in &spec_zones {
                let zone = status
                    .zones
                    .entry(spec_zone.name.clone())
                    .or_insert_with(|| spec_zone.clone());
                if zone.network.name != spec_zone.network.name {
                    zone.network = spec_zone.network.clone();
                }
            }
        }

        for spec_zone in &spec_zones {
            let mut network = match zone_network(cluster, &spec_zone.name) {
                Some(network) => network.clone(),
                None => continue,
            };

            match self.resolve_network(&mut network).await {
                Ok(()) => {
                    debug!("Resolved network {} ({}) in zone {}", network.name, network.id, spec_zone.name);
                    self.add_cluster_tags_to_network(cluster, &network, false).await?;
                }
                Err(e) if is_not_found(&e) => {
                    debug!("Network {} in zone {} does not exist yet", network.name, spec_zone.name);
                }
                Err(e) => return Err(e),
            }

            if let Some(zone) = cluster.status_mut().zones.get_mut(&spec_zone.name) {
                zone.network = network;
            }
        }
        Ok(())
    }

    /// Create the isolated network of a single-zone cluster and record it in status.
    pub async fn create_isolated_network(&self, cluster: &mut CloudStackCluster) -> Result<(), ControllerError> {
        let Some(spec_zone) = cluster.spec.zones.first().cloned() else {
            return Err(ControllerError::InvalidConfig(
                "cannot create an isolated network for a cluster without zones".to_string(),
            ));
        };
        let zone = cluster
            .status
            .as_ref()
            .and_then(|status| status.zones.get(&spec_zone.name))
            .cloned()
            .unwrap_or(spec_zone);

        let offering = &self.config.isolated_network_offering;
        let offering_id = match self.client.get_network_offering_id(offering).await? {
            (id, 1) => id,
            (_, count) => {
                return Err(ControllerError::Ambiguous {
                    kind: "network offering".to_string(),
                    key: format!("name {}", offering),
                    count,
                })
            }
        };

        let mut params = CreateNetworkParams::new(&zone.network.name, &zone.network.name, &offering_id, &zone.id);
        params.scope = Self::scope(cluster);
        let created = self.client.create_network(params).await?;
        info!("Created isolated network {} ({}) in zone {}", created.name, created.id, zone.name);

        let network = Network {
            id: created.id,
            name: zone.network.name.clone(),
            network_type: created.network_type,
        };
        self.add_cluster_tags_to_network(cluster, &network, true).await?;

        let mut zone = zone;
        zone.network = network;
        cluster.status_mut().zones.insert(zone.name.clone(), zone);
        Ok(())
    }

    pub async fn destroy_network(&self, network: &Network) -> Result<(), ControllerError> {
        self.client.delete_network(&network.id).await?;
        Ok(())
    }
}

/// Accumulated lookup errors as one error; a single error is reported on its own
fn combine(errors: Vec<ControllerError>, network_name: &str) -> ControllerError {
    ControllerError::aggregate(errors).unwrap_or_else(|| ControllerError::NoMatch(format!("Network {}", network_name)))
}
