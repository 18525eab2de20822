//! Unit tests for the egress firewall rule

#[cfg(test)]
mod tests {
    use crate::classify::{classify, ErrorClass};
    use crate::test_utils::*;
    use cloudstack_client::{CloudStackError, MockOperation};

    #[tokio::test]
    async fn test_open_firewall_rules_tolerates_existing_rule() {
        let client = mock_cloud(TEST_API_URL);
        let cloud = test_cloud_ops(&client);
        let mut cluster = create_test_cluster("c1", vec![zone_spec("zone-a", "net-a")]);
        cluster.status_mut().public_ip_network_id = "n-1".to_string();

        cloud.open_firewall_rules(&cluster).await.unwrap();
        cloud.open_firewall_rules(&cluster).await.unwrap();

        assert_eq!(client.call_count(MockOperation::CreateEgressFirewallRule), 2);
        let rules = client.firewall_rules();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].network_id, "n-1");
        assert_eq!(rules[0].protocol, "tcp");
    }

    #[tokio::test]
    async fn test_open_firewall_rules_surfaces_other_errors() {
        let client = mock_cloud(TEST_API_URL);
        client.fail_next(
            MockOperation::CreateEgressFirewallRule,
            CloudStackError::api(530, "Network n-1 is not in Implemented state"),
        );
        let cloud = test_cloud_ops(&client);
        let mut cluster = create_test_cluster("c1", vec![]);
        cluster.status_mut().public_ip_network_id = "n-1".to_string();

        let err = cloud.open_firewall_rules(&cluster).await.unwrap_err();
        assert_eq!(classify(&err), ErrorClass::Fatal);
    }
}
