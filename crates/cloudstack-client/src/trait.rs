//! CloudStackClient trait for mocking
//!
//! This trait abstracts the CloudStack API client, organised by resource family.
//! The concrete `CloudStackClient` implements it, and tests use `MockCloudStackClient`.

use crate::error::CloudStackError;
use crate::models::*;
use crate::params::*;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Trait for CloudStack API client operations
///
/// By-name lookups return `(id, match_count)`; by-id fetches return `(object, match_count)`.
/// Callers decide what a count other than one means.
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait CloudStackClientTrait: Send + Sync {
    /// Get the API endpoint URL
    fn api_url(&self) -> &str;

    // Network
    async fn get_network_id(&self, name: &str) -> Result<(String, usize), CloudStackError>;
    async fn get_network_by_id(&self, id: &str) -> Result<(Network, usize), CloudStackError>;
    async fn create_network(&self, params: CreateNetworkParams) -> Result<Network, CloudStackError>;
    async fn delete_network(&self, id: &str) -> Result<(), CloudStackError>;

    // NetworkOffering
    async fn get_network_offering_id(&self, name: &str) -> Result<(String, usize), CloudStackError>;

    // Address
    async fn list_public_ip_addresses(&self, params: ListPublicIpAddressesParams) -> Result<Vec<PublicIpAddress>, CloudStackError>;
    async fn associate_ip_address(&self, params: AssociateIpAddressParams) -> Result<PublicIpAddress, CloudStackError>;
    async fn disassociate_ip_address(&self, id: &str) -> Result<(), CloudStackError>;

    // Firewall
    async fn create_egress_firewall_rule(&self, params: CreateEgressFirewallRuleParams) -> Result<FirewallRule, CloudStackError>;

    // LoadBalancer
    async fn list_load_balancer_rules(&self, params: ListLoadBalancerRulesParams) -> Result<Vec<LoadBalancerRule>, CloudStackError>;
    async fn create_load_balancer_rule(&self, params: CreateLoadBalancerRuleParams) -> Result<LoadBalancerRule, CloudStackError>;
    async fn list_load_balancer_rule_instances(&self, rule_id: &str) -> Result<Vec<LoadBalancerRuleInstance>, CloudStackError>;
    async fn assign_to_load_balancer_rule(&self, rule_id: &str, virtual_machine_ids: &[String]) -> Result<(), CloudStackError>;

    // Tags
    async fn get_tags(&self, resource_type: ResourceType, resource_id: &str) -> Result<BTreeMap<String, String>, CloudStackError>;
    async fn add_tags(&self, resource_type: ResourceType, resource_id: &str, tags: &BTreeMap<String, String>) -> Result<(), CloudStackError>;
    async fn delete_tags(&self, resource_type: ResourceType, resource_id: &str, tags: &BTreeMap<String, String>) -> Result<(), CloudStackError>;

    // Domain / account
    async fn get_domain_id(&self, domain: &str) -> Result<(String, usize), CloudStackError>;

    /// Derive a client acting as the given account's user within the given domain.
    async fn new_client_in_domain_and_account(&self, domain: &str, account: &str) -> Result<Arc<dyn CloudStackClientTrait>, CloudStackError>;
}
