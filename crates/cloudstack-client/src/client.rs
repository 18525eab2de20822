//! CloudStack API client
//!
//! Implements `CloudStackClientTrait` over the CloudStack HTTP API.

use crate::cloudstack_trait::CloudStackClientTrait;
use crate::common::query::{list_items, pick_by_name, single_item};
use crate::common::ApiTransport;
use crate::config::ClientConfig;
use crate::error::CloudStackError;
use crate::models::*;
use crate::params::*;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// CloudStack API client
#[derive(Debug, Clone)]
pub struct CloudStackClient {
    transport: ApiTransport,
}

impl CloudStackClient {
    /// Create a new CloudStack client
    pub fn new(config: ClientConfig) -> Result<Self, CloudStackError> {
        Ok(Self {
            transport: ApiTransport::new(config)?,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        self.transport.config()
    }

    async fn find_user(&self, domain_id: &str, account: &str) -> Result<User, CloudStackError> {
        let response = self
            .transport
            .call(
                "listUsers",
                &[("account", account.to_string()), ("domainid", domain_id.to_string())],
            )
            .await?;
        let users: Vec<User> = list_items(&response, "user")?;
        users
            .into_iter()
            .next()
            .ok_or_else(|| CloudStackError::no_match("user in account", account))
    }

    /// Fetch the user's key pair, registering one if the user has none
    async fn user_keys(&self, user: &User) -> Result<UserKeys, CloudStackError> {
        if !user.api_key.is_empty() && !user.secret_key.is_empty() {
            return Ok(UserKeys {
                api_key: user.api_key.clone(),
                secret_key: user.secret_key.clone(),
            });
        }

        let response = self.transport.call("getUserKeys", &[("id", user.id.clone())]).await?;
        if let Ok(keys) = single_item::<UserKeys>(&response, "userkeys") {
            if !keys.api_key.is_empty() {
                return Ok(keys);
            }
        }

        debug!("Registering API keys for user {}", user.username);
        let response = self.transport.call("registerUserKeys", &[("id", user.id.clone())]).await?;
        single_item(&response, "userkeys")
    }

    fn tag_params(resource_type: ResourceType, resource_id: &str, tags: &BTreeMap<String, String>) -> Vec<(String, String)> {
        let mut params = vec![
            ("resourceids".to_string(), resource_id.to_string()),
            ("resourcetype".to_string(), resource_type.as_str().to_string()),
        ];
        for (i, (key, value)) in tags.iter().enumerate() {
            params.push((format!("tags[{}].key", i), key.clone()));
            params.push((format!("tags[{}].value", i), value.clone()));
        }
        params
    }
}

#[async_trait::async_trait]
impl CloudStackClientTrait for CloudStackClient {
    fn api_url(&self) -> &str {
        self.transport.api_url()
    }

    async fn get_network_id(&self, name: &str) -> Result<(String, usize), CloudStackError> {
        let response = self
            .transport
            .call("listNetworks", &[("name", name.to_string()), ("listall", "true".to_string())])
            .await?;
        let networks: Vec<Network> = list_items(&response, "network")?;
        pick_by_name("Network", name, &networks, |n| n.name.as_str(), |n| n.id.as_str())
    }

    async fn get_network_by_id(&self, id: &str) -> Result<(Network, usize), CloudStackError> {
        let response = self
            .transport
            .call("listNetworks", &[("id", id.to_string()), ("listall", "true".to_string())])
            .await?;
        let networks: Vec<Network> = list_items(&response, "network")?;
        let count = networks.len();
        networks
            .into_iter()
            .next()
            .map(|network| (network, count))
            .ok_or_else(|| CloudStackError::no_match("Network", id))
    }

    async fn create_network(&self, params: CreateNetworkParams) -> Result<Network, CloudStackError> {
        let response = self.transport.call("createNetwork", &params.to_query()).await?;
        single_item(&response, "network")
    }

    async fn delete_network(&self, id: &str) -> Result<(), CloudStackError> {
        self.transport.call_async("deleteNetwork", &[("id", id.to_string())]).await?;
        Ok(())
    }

    async fn get_network_offering_id(&self, name: &str) -> Result<(String, usize), CloudStackError> {
        let response = self
            .transport
            .call("listNetworkOfferings", &[("name", name.to_string())])
            .await?;
        let offerings: Vec<NetworkOffering> = list_items(&response, "networkoffering")?;
        pick_by_name("NetworkOffering", name, &offerings, |o| o.name.as_str(), |o| o.id.as_str())
    }

    async fn list_public_ip_addresses(&self, params: ListPublicIpAddressesParams) -> Result<Vec<PublicIpAddress>, CloudStackError> {
        let response = self.transport.call("listPublicIpAddresses", &params.to_query()).await?;
        list_items(&response, "publicipaddress")
    }

    async fn associate_ip_address(&self, params: AssociateIpAddressParams) -> Result<PublicIpAddress, CloudStackError> {
        let result = self.transport.call_async("associateIpAddress", &params.to_query()).await?;
        single_item(&result, "ipaddress")
    }

    async fn disassociate_ip_address(&self, id: &str) -> Result<(), CloudStackError> {
        self.transport.call_async("disassociateIpAddress", &[("id", id.to_string())]).await?;
        Ok(())
    }

    async fn create_egress_firewall_rule(&self, params: CreateEgressFirewallRuleParams) -> Result<FirewallRule, CloudStackError> {
        let result = self.transport.call_async("createEgressFirewallRule", &params.to_query()).await?;
        single_item(&result, "firewallrule")
    }

    async fn list_load_balancer_rules(&self, params: ListLoadBalancerRulesParams) -> Result<Vec<LoadBalancerRule>, CloudStackError> {
        let response = self.transport.call("listLoadBalancerRules", &params.to_query()).await?;
        list_items(&response, "loadbalancerrule")
    }

    async fn create_load_balancer_rule(&self, params: CreateLoadBalancerRuleParams) -> Result<LoadBalancerRule, CloudStackError> {
        let result = self.transport.call_async("createLoadBalancerRule", &params.to_query()).await?;
        single_item(&result, "loadbalancer")
    }

    async fn list_load_balancer_rule_instances(&self, rule_id: &str) -> Result<Vec<LoadBalancerRuleInstance>, CloudStackError> {
        let response = self
            .transport
            .call("listLoadBalancerRuleInstances", &[("id", rule_id.to_string())])
            .await?;
        list_items(&response, "loadbalancerruleinstance")
    }

    async fn assign_to_load_balancer_rule(&self, rule_id: &str, virtual_machine_ids: &[String]) -> Result<(), CloudStackError> {
        let params = [
            ("id", rule_id.to_string()),
            ("virtualmachineids", virtual_machine_ids.join(",")),
        ];
        self.transport.call_async("assignToLoadBalancerRule", &params).await?;
        Ok(())
    }

    async fn get_tags(&self, resource_type: ResourceType, resource_id: &str) -> Result<BTreeMap<String, String>, CloudStackError> {
        let params = [
            ("resourceid", resource_id.to_string()),
            ("resourcetype", resource_type.as_str().to_string()),
            ("listall", "true".to_string()),
        ];
        let response = self.transport.call("listTags", &params).await?;
        let tags: Vec<Tag> = list_items(&response, "tag")?;
        Ok(tags.into_iter().map(|t| (t.key, t.value)).collect())
    }

    async fn add_tags(&self, resource_type: ResourceType, resource_id: &str, tags: &BTreeMap<String, String>) -> Result<(), CloudStackError> {
        if tags.is_empty() {
            return Ok(());
        }
        let params = Self::tag_params(resource_type, resource_id, tags);
        self.transport.call_async("createTags", &params).await?;
        Ok(())
    }

    async fn delete_tags(&self, resource_type: ResourceType, resource_id: &str, tags: &BTreeMap<String, String>) -> Result<(), CloudStackError> {
        if tags.is_empty() {
            return Ok(());
        }
        let params = Self::tag_params(resource_type, resource_id, tags);
        self.transport.call_async("deleteTags", &params).await?;
        Ok(())
    }

    async fn get_domain_id(&self, domain: &str) -> Result<(String, usize), CloudStackError> {
        // A path such as "ROOT/team" is matched on the full path, a bare name on the name
        let leaf = domain.rsplit('/').next().unwrap_or(domain);
        let response = self
            .transport
            .call("listDomains", &[("name", leaf.to_string()), ("listall", "true".to_string())])
            .await?;
        let mut domains: Vec<Domain> = list_items(&response, "domain")?;
        if domain.contains('/') {
            domains.retain(|d| d.path.eq_ignore_ascii_case(domain));
        }
        pick_by_name("Domain", leaf, &domains, |d| d.name.as_str(), |d| d.id.as_str())
    }

    async fn new_client_in_domain_and_account(&self, domain: &str, account: &str) -> Result<Arc<dyn CloudStackClientTrait>, CloudStackError> {
        let (domain_id, count) = self.get_domain_id(domain).await?;
        if count != 1 {
            return Err(CloudStackError::InvalidRequest(format!(
                "expected 1 domain with name {}, but got {}",
                domain, count
            )));
        }

        let user = self.find_user(&domain_id, account).await?;
        let keys = self.user_keys(&user).await?;
        let scoped = CloudStackClient::new(self.config().with_keys(keys.api_key, keys.secret_key))?;
        Ok(Arc::new(scoped))
    }
}
