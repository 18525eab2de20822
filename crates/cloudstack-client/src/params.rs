//! Request parameters for CloudStack commands
//!
//! Each parameter type renders itself into CloudStack query pairs. Optional fields,
//! including account/domain scoping, are only rendered when set; an empty value is
//! never sent.

/// Query parameters for a single command
pub type QueryParams = Vec<(&'static str, String)>;

fn push_if_not_empty(params: &mut QueryParams, key: &'static str, value: &str) {
    if !value.is_empty() {
        params.push((key, value.to_string()));
    }
}

/// Account/domain scoping applied to list and create calls
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    pub account: Option<String>,
    pub domain_id: Option<String>,
}

impl Scope {
    /// Build a scope, keeping only non-empty fields.
    pub fn new(account: &str, domain_id: &str) -> Self {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        Self {
            account: non_empty(account),
            domain_id: non_empty(domain_id),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.account.is_none() && self.domain_id.is_none()
    }

    /// Append `account` / `domainid` pairs for the fields that are set
    pub fn append_to(&self, params: &mut QueryParams) {
        if let Some(account) = &self.account {
            push_if_not_empty(params, "account", account);
        }
        if let Some(domain_id) = &self.domain_id {
            push_if_not_empty(params, "domainid", domain_id);
        }
    }
}

/// createNetwork
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateNetworkParams {
    pub name: String,
    pub display_text: String,
    pub network_offering_id: String,
    pub zone_id: String,
    pub scope: Scope,
}

impl CreateNetworkParams {
    pub fn new(name: &str, display_text: &str, network_offering_id: &str, zone_id: &str) -> Self {
        Self {
            name: name.to_string(),
            display_text: display_text.to_string(),
            network_offering_id: network_offering_id.to_string(),
            zone_id: zone_id.to_string(),
            scope: Scope::default(),
        }
    }

    pub fn to_query(&self) -> QueryParams {
        let mut params = vec![
            ("name", self.name.clone()),
            ("displaytext", self.display_text.clone()),
            ("networkofferingid", self.network_offering_id.clone()),
        ];
        push_if_not_empty(&mut params, "zoneid", &self.zone_id);
        self.scope.append_to(&mut params);
        params
    }
}

/// listPublicIpAddresses
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPublicIpAddressesParams {
    /// Restrict to a specific address
    pub ip_address: Option<String>,
    pub allocated_only: bool,
    pub scope: Scope,
}

impl ListPublicIpAddressesParams {
    pub fn to_query(&self) -> QueryParams {
        let mut params = vec![("allocatedonly", self.allocated_only.to_string())];
        if let Some(ip) = &self.ip_address {
            push_if_not_empty(&mut params, "ipaddress", ip);
        }
        self.scope.append_to(&mut params);
        params
    }
}

/// associateIpAddress
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssociateIpAddressParams {
    pub ip_address: String,
    pub network_id: Option<String>,
    pub scope: Scope,
}

impl AssociateIpAddressParams {
    pub fn to_query(&self) -> QueryParams {
        let mut params = vec![("ipaddress", self.ip_address.clone())];
        if let Some(network_id) = &self.network_id {
            push_if_not_empty(&mut params, "networkid", network_id);
        }
        self.scope.append_to(&mut params);
        params
    }
}

/// createEgressFirewallRule
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateEgressFirewallRuleParams {
    pub network_id: String,
    pub protocol: String,
}

impl CreateEgressFirewallRuleParams {
    pub fn new(network_id: &str, protocol: &str) -> Self {
        Self {
            network_id: network_id.to_string(),
            protocol: protocol.to_string(),
        }
    }

    pub fn to_query(&self) -> QueryParams {
        vec![
            ("networkid", self.network_id.clone()),
            ("protocol", self.protocol.clone()),
        ]
    }
}

/// listLoadBalancerRules
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListLoadBalancerRulesParams {
    pub public_ip_id: String,
    pub scope: Scope,
}

impl ListLoadBalancerRulesParams {
    pub fn to_query(&self) -> QueryParams {
        let mut params = QueryParams::new();
        push_if_not_empty(&mut params, "publicipid", &self.public_ip_id);
        self.scope.append_to(&mut params);
        params
    }
}

/// createLoadBalancerRule
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateLoadBalancerRuleParams {
    pub algorithm: String,
    pub name: String,
    pub private_port: i32,
    pub public_port: i32,
    pub network_id: String,
    pub public_ip_id: String,
    pub protocol: String,
    pub scope: Scope,
}

impl CreateLoadBalancerRuleParams {
    pub fn new(algorithm: &str, name: &str, private_port: i32, public_port: i32) -> Self {
        Self {
            algorithm: algorithm.to_string(),
            name: name.to_string(),
            private_port,
            public_port,
            ..Default::default()
        }
    }

    pub fn to_query(&self) -> QueryParams {
        let mut params = vec![
            ("algorithm", self.algorithm.clone()),
            ("name", self.name.clone()),
            ("privateport", self.private_port.to_string()),
            ("publicport", self.public_port.to_string()),
        ];
        push_if_not_empty(&mut params, "networkid", &self.network_id);
        push_if_not_empty(&mut params, "publicipid", &self.public_ip_id);
        push_if_not_empty(&mut params, "protocol", &self.protocol);
        self.scope.append_to(&mut params);
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(params: &QueryParams) -> Vec<&'static str> {
        params.iter().map(|(k, _)| *k).collect()
    }

    #[test]
    fn test_empty_scope_fields_are_never_sent() {
        let scope = Scope::new("", "");
        assert!(scope.is_empty());

        let params = ListPublicIpAddressesParams {
            ip_address: Some(String::new()),
            allocated_only: false,
            scope,
        };
        assert_eq!(keys(&params.to_query()), vec!["allocatedonly"]);
    }

    #[test]
    fn test_scope_renders_set_fields_only() {
        let params = ListLoadBalancerRulesParams {
            public_ip_id: "ip-1".to_string(),
            scope: Scope::new("admin", ""),
        };
        let query = params.to_query();
        assert!(query.contains(&("account", "admin".to_string())));
        assert!(!keys(&query).contains(&"domainid"));
    }

    #[test]
    fn test_create_load_balancer_rule_query() {
        let mut params = CreateLoadBalancerRuleParams::new("roundrobin", "Kubernetes_API_Server", 6443, 443);
        params.public_ip_id = "ip-1".to_string();
        params.protocol = "tcp".to_string();
        let query = params.to_query();
        assert!(query.contains(&("publicport", "443".to_string())));
        assert!(query.contains(&("privateport", "6443".to_string())));
        assert!(!keys(&query).contains(&"networkid"));
    }
}
