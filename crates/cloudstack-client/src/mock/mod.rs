//! Mock CloudStackClient for unit testing
//!
//! This module provides an in-memory implementation of `CloudStackClientTrait` that can
//! be used in unit tests without a running CloudStack management server.
//!
//! The mock is organized by resource family:
//! - `network.rs` - networks and network offerings
//! - `address.rs` - public IP addresses
//! - `firewall.rs` - egress firewall rules
//! - `load_balancer.rs` - load balancer rules and their members
//! - `tags.rs` - resource tags
//! - `account.rs` - domains, accounts and scoped clients
//!
//! Every call is counted per `MockOperation`, and a single failure can be queued for
//! any operation with `fail_next`.

mod account;
mod address;
mod firewall;
mod load_balancer;
mod network;
mod tags;

use crate::cloudstack_trait::CloudStackClientTrait;
use crate::error::CloudStackError;
use crate::models::*;
use crate::params::*;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::{Arc, Mutex};

/// Operations that can be counted or made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MockOperation {
    GetNetworkId,
    GetNetworkById,
    CreateNetwork,
    DeleteNetwork,
    GetNetworkOfferingId,
    ListPublicIpAddresses,
    AssociateIpAddress,
    DisassociateIpAddress,
    CreateEgressFirewallRule,
    ListLoadBalancerRules,
    CreateLoadBalancerRule,
    ListLoadBalancerRuleInstances,
    AssignToLoadBalancerRule,
    GetTags,
    AddTags,
    DeleteTags,
    GetDomainId,
    NewClientInDomainAndAccount,
}

/// Mock CloudStackClient for testing
///
/// Clones, and scoped clients derived with `new_client_in_domain_and_account`, share
/// the same in-memory cloud.
#[derive(Debug, Clone)]
pub struct MockCloudStackClient {
    pub(crate) api_url: String,
    /// `(domain, account)` this client acts as, if scoped
    pub(crate) scope: Option<(String, String)>,
    pub(crate) networks: Arc<Mutex<Vec<Network>>>,
    pub(crate) offerings: Arc<Mutex<Vec<NetworkOffering>>>,
    pub(crate) public_ips: Arc<Mutex<Vec<PublicIpAddress>>>,
    pub(crate) firewall_rules: Arc<Mutex<Vec<FirewallRule>>>,
    pub(crate) lb_rules: Arc<Mutex<Vec<LoadBalancerRule>>>,
    pub(crate) lb_members: Arc<Mutex<BTreeMap<String, Vec<String>>>>,
    pub(crate) tags: Arc<Mutex<BTreeMap<(ResourceType, String), BTreeMap<String, String>>>>,
    pub(crate) domains: Arc<Mutex<Vec<Domain>>>,
    /// `(domain id, account)` pairs that have a user
    pub(crate) accounts: Arc<Mutex<BTreeSet<(String, String)>>>,
    pub(crate) calls: Arc<Mutex<BTreeMap<MockOperation, usize>>>,
    pub(crate) failures: Arc<Mutex<BTreeMap<MockOperation, VecDeque<CloudStackError>>>>,
}

impl MockCloudStackClient {
    /// Create a new mock client
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            scope: None,
            networks: Arc::new(Mutex::new(Vec::new())),
            offerings: Arc::new(Mutex::new(Vec::new())),
            public_ips: Arc::new(Mutex::new(Vec::new())),
            firewall_rules: Arc::new(Mutex::new(Vec::new())),
            lb_rules: Arc::new(Mutex::new(Vec::new())),
            lb_members: Arc::new(Mutex::new(BTreeMap::new())),
            tags: Arc::new(Mutex::new(BTreeMap::new())),
            domains: Arc::new(Mutex::new(Vec::new())),
            accounts: Arc::new(Mutex::new(BTreeSet::new())),
            calls: Arc::new(Mutex::new(BTreeMap::new())),
            failures: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    /// Queue an error returned by the next call of `operation`
    pub fn fail_next(&self, operation: MockOperation, error: CloudStackError) {
        self.failures
            .lock()
            .unwrap()
            .entry(operation)
            .or_default()
            .push_back(error);
    }

    /// Number of times `operation` has been called on this mock or any client sharing it
    pub fn call_count(&self, operation: MockOperation) -> usize {
        self.calls.lock().unwrap().get(&operation).copied().unwrap_or(0)
    }

    /// `(domain, account)` this client was scoped to
    pub fn scope(&self) -> Option<(String, String)> {
        self.scope.clone()
    }

    /// Count the call and return a queued failure, if any
    pub(crate) fn record(&self, operation: MockOperation) -> Result<(), CloudStackError> {
        *self.calls.lock().unwrap().entry(operation).or_default() += 1;
        match self
            .failures
            .lock()
            .unwrap()
            .get_mut(&operation)
            .and_then(VecDeque::pop_front)
        {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub(crate) fn next_id(&self, kind: &str) -> String {
        format!("{}-{}", kind, uuid::Uuid::new_v4())
    }
}

#[async_trait::async_trait]
impl CloudStackClientTrait for MockCloudStackClient {
    fn api_url(&self) -> &str {
        &self.api_url
    }

    // Network operations - delegated to network module
    async fn get_network_id(&self, name: &str) -> Result<(String, usize), CloudStackError> {
        network::get_network_id(self, name).await
    }

    async fn get_network_by_id(&self, id: &str) -> Result<(Network, usize), CloudStackError> {
        network::get_network_by_id(self, id).await
    }

    async fn create_network(&self, params: CreateNetworkParams) -> Result<Network, CloudStackError> {
        network::create_network(self, params).await
    }

    async fn delete_network(&self, id: &str) -> Result<(), CloudStackError> {
        network::delete_network(self, id).await
    }

    async fn get_network_offering_id(&self, name: &str) -> Result<(String, usize), CloudStackError> {
        network::get_network_offering_id(self, name).await
    }

    // Address operations - delegated to address module
    async fn list_public_ip_addresses(&self, params: ListPublicIpAddressesParams) -> Result<Vec<PublicIpAddress>, CloudStackError> {
        address::list_public_ip_addresses(self, params).await
    }

    async fn associate_ip_address(&self, params: AssociateIpAddressParams) -> Result<PublicIpAddress, CloudStackError> {
        address::associate_ip_address(self, params).await
    }

    async fn disassociate_ip_address(&self, id: &str) -> Result<(), CloudStackError> {
        address::disassociate_ip_address(self, id).await
    }

    // Firewall operations - delegated to firewall module
    async fn create_egress_firewall_rule(&self, params: CreateEgressFirewallRuleParams) -> Result<FirewallRule, CloudStackError> {
        firewall::create_egress_firewall_rule(self, params).await
    }

    // LoadBalancer operations - delegated to load_balancer module
    async fn list_load_balancer_rules(&self, params: ListLoadBalancerRulesParams) -> Result<Vec<LoadBalancerRule>, CloudStackError> {
        load_balancer::list_load_balancer_rules(self, params).await
    }

    async fn create_load_balancer_rule(&self, params: CreateLoadBalancerRuleParams) -> Result<LoadBalancerRule, CloudStackError> {
        load_balancer::create_load_balancer_rule(self, params).await
    }

    async fn list_load_balancer_rule_instances(&self, rule_id: &str) -> Result<Vec<LoadBalancerRuleInstance>, CloudStackError> {
        load_balancer::list_load_balancer_rule_instances(self, rule_id).await
    }

    async fn assign_to_load_balancer_rule(&self, rule_id: &str, virtual_machine_ids: &[String]) -> Result<(), CloudStackError> {
        load_balancer::assign_to_load_balancer_rule(self, rule_id, virtual_machine_ids).await
    }

    // Tag operations - delegated to tags module
    async fn get_tags(&self, resource_type: ResourceType, resource_id: &str) -> Result<BTreeMap<String, String>, CloudStackError> {
        tags::get_tags(self, resource_type, resource_id).await
    }

    async fn add_tags(&self, resource_type: ResourceType, resource_id: &str, tags: &BTreeMap<String, String>) -> Result<(), CloudStackError> {
        tags::add_tags(self, resource_type, resource_id, tags).await
    }

    async fn delete_tags(&self, resource_type: ResourceType, resource_id: &str, tags: &BTreeMap<String, String>) -> Result<(), CloudStackError> {
        tags::delete_tags(self, resource_type, resource_id, tags).await
    }

    // Account operations - delegated to account module
    async fn get_domain_id(&self, domain: &str) -> Result<(String, usize), CloudStackError> {
        account::get_domain_id(self, domain).await
    }

    async fn new_client_in_domain_and_account(&self, domain: &str, account: &str) -> Result<Arc<dyn CloudStackClientTrait>, CloudStackError> {
        let scoped = account::scoped_client(self, domain, account).await?;
        Ok(Arc::new(scoped))
    }
}
