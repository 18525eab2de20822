//! Firewall operations for MockCloudStackClient

use super::{MockCloudStackClient, MockOperation};
use crate::error::CloudStackError;
use crate::models::*;
use crate::params::*;

impl MockCloudStackClient {
    pub fn firewall_rules(&self) -> Vec<FirewallRule> {
        self.firewall_rules.lock().unwrap().clone()
    }
}

pub async fn create_egress_firewall_rule(client: &MockCloudStackClient, params: CreateEgressFirewallRuleParams) -> Result<FirewallRule, CloudStackError> {
    client.record(MockOperation::CreateEgressFirewallRule)?;
    let mut rules = client.firewall_rules.lock().unwrap();
    if rules
        .iter()
        .any(|r| r.network_id == params.network_id && r.protocol == params.protocol)
    {
        return Err(CloudStackError::api(
            431,
            format!(
                "There is already a firewall rule specified for the network {} with the same protocol",
                params.network_id
            ),
        ));
    }

    let rule = FirewallRule {
        id: client.next_id("firewall"),
        network_id: params.network_id,
        protocol: params.protocol,
    };
    rules.push(rule.clone());
    Ok(rule)
}
