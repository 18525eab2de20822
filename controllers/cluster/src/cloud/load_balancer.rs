//! Control plane load balancer rule and its members.

use super::CloudOps;
use crate::error::ControllerError;
use cloudstack_client::{CreateLoadBalancerRuleParams, ListLoadBalancerRulesParams};
use crds::CloudStackCluster;
use tracing::{debug, info};

fn status_field<'a>(cluster: &'a CloudStackCluster, field: impl Fn(&'a crds::CloudStackClusterStatus) -> &'a str) -> &'a str {
    cluster.status.as_ref().map(field).unwrap_or("")
}

impl CloudOps {
    /// Port the control plane is served on: the endpoint port, or the default API port when unset.
    pub fn control_plane_port(&self, cluster: &CloudStackCluster) -> i32 {
        match cluster.spec.control_plane_endpoint.port {
            0 => self.config.default_api_port,
            port => port,
        }
    }

    /// Find the rule on the control plane public IP that serves the control plane port
    /// and record its id.
    ///
    /// Returns `ControllerError::NoLoadBalancerRule` when there is none.
    pub async fn resolve_load_balancer_rule_details(&self, cluster: &mut CloudStackCluster) -> Result<(), ControllerError> {
        let public_ip_id = status_field(cluster, |s| s.public_ip_id.as_str()).to_string();
        let port = self.control_plane_port(cluster);
        let params = ListLoadBalancerRulesParams {
            public_ip_id: public_ip_id.clone(),
            scope: Self::scope(cluster),
        };

        let rules = self.client.list_load_balancer_rules(params).await?;
        let port_text = port.to_string();
        match rules.into_iter().find(|rule| rule.public_port == port_text) {
            Some(rule) => {
                debug!("Found load balancer rule {} for {}:{}", rule.id, public_ip_id, port);
                cluster.status_mut().lb_rule_id = rule.id;
                Ok(())
            }
            None => Err(ControllerError::NoLoadBalancerRule { public_ip_id, port }),
        }
    }

    /// Find the control plane load balancer rule, creating it if there is none.
    pub async fn get_or_create_load_balancer_rule(&self, cluster: &mut CloudStackCluster) -> Result<(), ControllerError> {
        match self.resolve_load_balancer_rule_details(cluster).await {
            Err(ControllerError::NoLoadBalancerRule { .. }) => {}
            other => return other,
        }

        let port = self.control_plane_port(cluster);
        let mut params = CreateLoadBalancerRuleParams::new(
            &self.config.lb_algorithm,
            &self.config.lb_rule_name,
            self.config.default_api_port,
            port,
        );
        params.network_id = status_field(cluster, |s| s.public_ip_network_id.as_str()).to_string();
        params.public_ip_id = status_field(cluster, |s| s.public_ip_id.as_str()).to_string();
        params.protocol = self.config.protocol.clone();
        params.scope = Self::scope(cluster);

        let rule = self.client.create_load_balancer_rule(params).await?;
        info!("Created load balancer rule {} on port {}", rule.id, port);
        cluster.status_mut().lb_rule_id = rule.id;
        Ok(())
    }

    /// Add an instance to the control plane load balancer rule unless it is already a member.
    ///
    /// Returns whether an assignment was made.
    pub async fn assign_vm_to_load_balancer_rule(&self, cluster: &CloudStackCluster, instance_id: &str) -> Result<bool, ControllerError> {
        let rule_id = status_field(cluster, |s| s.lb_rule_id.as_str());
        if rule_id.is_empty() {
            return Err(ControllerError::NoLoadBalancerRule {
                public_ip_id: status_field(cluster, |s| s.public_ip_id.as_str()).to_string(),
                port: self.control_plane_port(cluster),
            });
        }

        let members = self.client.list_load_balancer_rule_instances(rule_id).await?;
        if members.iter().any(|member| member.id == instance_id) {
            return Ok(false);
        }

        self.client
            .assign_to_load_balancer_rule(rule_id, &[instance_id.to_string()])
            .await?;
        info!("Assigned instance {} to load balancer rule {}", instance_id, rule_id);
        Ok(true)
    }
}
