//! Load balancer operations for MockCloudStackClient

use super::{MockCloudStackClient, MockOperation};
use crate::error::CloudStackError;
use crate::models::*;
use crate::params::*;

impl MockCloudStackClient {
    /// Add a load balancer rule (for test setup)
    pub fn add_load_balancer_rule(&self, rule: LoadBalancerRule) {
        self.lb_rules.lock().unwrap().push(rule);
    }

    pub fn load_balancer_rules(&self) -> Vec<LoadBalancerRule> {
        self.lb_rules.lock().unwrap().clone()
    }

    /// Instance ids assigned to a rule
    pub fn load_balancer_members(&self, rule_id: &str) -> Vec<String> {
        self.lb_members
            .lock()
            .unwrap()
            .get(rule_id)
            .cloned()
            .unwrap_or_default()
    }
}

pub async fn list_load_balancer_rules(client: &MockCloudStackClient, params: ListLoadBalancerRulesParams) -> Result<Vec<LoadBalancerRule>, CloudStackError> {
    client.record(MockOperation::ListLoadBalancerRules)?;
    Ok(client
        .lb_rules
        .lock()
        .unwrap()
        .iter()
        .filter(|r| params.public_ip_id.is_empty() || r.public_ip_id == params.public_ip_id)
        .cloned()
        .collect())
}

pub async fn create_load_balancer_rule(client: &MockCloudStackClient, params: CreateLoadBalancerRuleParams) -> Result<LoadBalancerRule, CloudStackError> {
    client.record(MockOperation::CreateLoadBalancerRule)?;
    let rule = LoadBalancerRule {
        id: client.next_id("lb"),
        name: params.name,
        algorithm: params.algorithm,
        public_port: params.public_port.to_string(),
        private_port: params.private_port.to_string(),
        public_ip_id: params.public_ip_id,
        network_id: params.network_id,
        protocol: params.protocol,
    };
    client.lb_rules.lock().unwrap().push(rule.clone());
    Ok(rule)
}

pub async fn list_load_balancer_rule_instances(client: &MockCloudStackClient, rule_id: &str) -> Result<Vec<LoadBalancerRuleInstance>, CloudStackError> {
    client.record(MockOperation::ListLoadBalancerRuleInstances)?;
    Ok(client
        .load_balancer_members(rule_id)
        .into_iter()
        .map(|id| LoadBalancerRuleInstance {
            id,
            name: String::new(),
        })
        .collect())
}

pub async fn assign_to_load_balancer_rule(client: &MockCloudStackClient, rule_id: &str, virtual_machine_ids: &[String]) -> Result<(), CloudStackError> {
    client.record(MockOperation::AssignToLoadBalancerRule)?;
    if !client.lb_rules.lock().unwrap().iter().any(|r| r.id == rule_id) {
        return Err(CloudStackError::NotFound(format!("Load balancer rule {} not found", rule_id)));
    }

    let mut members = client.lb_members.lock().unwrap();
    let assigned = members.entry(rule_id.to_string()).or_default();
    if let Some(dup) = virtual_machine_ids.iter().find(|id| assigned.contains(id)) {
        return Err(CloudStackError::api(
            431,
            format!("VM {} is already assigned to load balancer rule {}", dup, rule_id),
        ));
    }
    assigned.extend(virtual_machine_ids.iter().cloned());
    Ok(())
}
