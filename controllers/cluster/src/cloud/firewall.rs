use super::CloudOps;
use crate::classify::is_already_exists;
use crate::error::ControllerError;
use cloudstack_client::CreateEgressFirewallRuleParams;
use crds::CloudStackCluster;
use tracing::debug;

impl CloudOps {
    /// Allow egress traffic on the control plane's public network. An existing rule counts as success.
    pub async fn open_firewall_rules(&self, cluster: &CloudStackCluster) -> Result<(), ControllerError> {
        let network_id = cluster
            .status
            .as_ref()
            .map(|status| status.public_ip_network_id.as_str())
            .unwrap_or("");
        let params = CreateEgressFirewallRuleParams::new(network_id, &self.config.protocol);

        match self.client.create_egress_firewall_rule(params).await {
            Ok(rule) => {
                debug!("Created egress firewall rule {} on network {}", rule.id, network_id);
                Ok(())
            }
            Err(e) => {
                let err = ControllerError::from(e);
                if is_already_exists(&err) {
                    Ok(())
                } else {
                    Err(err)
                }
            }
        }
    }
}
