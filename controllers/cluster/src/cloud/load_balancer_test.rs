//! Unit tests for the control plane load balancer rule

#[cfg(test)]
mod tests {
    use crate::classify::is_not_found;
    use crate::error::ControllerError;
    use crate::test_utils::*;
    use cloudstack_client::{LoadBalancerRule, MockOperation};
    use crds::CloudStackCluster;

    fn cluster_with_public_ip() -> CloudStackCluster {
        let mut cluster = create_test_cluster("c1", vec![zone_spec("zone-a", "net-a")]);
        let status = cluster.status_mut();
        status.public_ip_id = "ip-1".to_string();
        status.public_ip_network_id = "n-1".to_string();
        cluster
    }

    #[tokio::test]
    async fn test_missing_rule_is_a_typed_not_found() {
        let client = mock_cloud(TEST_API_URL);
        let cloud = test_cloud_ops(&client);
        let mut cluster = cluster_with_public_ip();

        let err = cloud.resolve_load_balancer_rule_details(&mut cluster).await.unwrap_err();

        assert!(matches!(
            err,
            ControllerError::NoLoadBalancerRule { ref public_ip_id, port: 6443 } if public_ip_id == "ip-1"
        ));
        assert!(is_not_found(&err));
    }

    #[tokio::test]
    async fn test_get_or_create_creates_once() {
        let client = mock_cloud(TEST_API_URL);
        let cloud = test_cloud_ops(&client);
        let mut cluster = cluster_with_public_ip();

        cloud.get_or_create_load_balancer_rule(&mut cluster).await.unwrap();
        let first_rule = cluster.status.as_ref().unwrap().lb_rule_id.clone();
        cloud.get_or_create_load_balancer_rule(&mut cluster).await.unwrap();

        assert_eq!(client.call_count(MockOperation::CreateLoadBalancerRule), 1);
        assert_eq!(cluster.status.as_ref().unwrap().lb_rule_id, first_rule);
        let rules = client.load_balancer_rules();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].public_port, "6443");
        assert_eq!(rules[0].algorithm, "roundrobin");
        assert_eq!(rules[0].network_id, "n-1");
    }

    #[tokio::test]
    async fn test_custom_endpoint_port_is_matched_and_created() {
        let client = mock_cloud(TEST_API_URL);
        client.add_load_balancer_rule(LoadBalancerRule {
            id: "lb-default".to_string(),
            public_port: "6443".to_string(),
            public_ip_id: "ip-1".to_string(),
            ..Default::default()
        });
        let cloud = test_cloud_ops(&client);
        let mut cluster = cluster_with_public_ip();
        cluster.spec.control_plane_endpoint.port = 8443;

        cloud.get_or_create_load_balancer_rule(&mut cluster).await.unwrap();

        let rule_id = cluster.status.as_ref().unwrap().lb_rule_id.clone();
        assert_ne!(rule_id, "lb-default");
        let created = client
            .load_balancer_rules()
            .into_iter()
            .find(|r| r.id == rule_id)
            .unwrap();
        assert_eq!(created.public_port, "8443");
        assert_eq!(created.private_port, "6443");
    }

    #[tokio::test]
    async fn test_assign_is_idempotent() {
        let client = mock_cloud(TEST_API_URL);
        let cloud = test_cloud_ops(&client);
        let mut cluster = cluster_with_public_ip();
        cloud.get_or_create_load_balancer_rule(&mut cluster).await.unwrap();

        assert!(cloud.assign_vm_to_load_balancer_rule(&cluster, "vm-1").await.unwrap());
        assert!(!cloud.assign_vm_to_load_balancer_rule(&cluster, "vm-1").await.unwrap());

        assert_eq!(client.call_count(MockOperation::AssignToLoadBalancerRule), 1);
        let rule_id = &cluster.status.as_ref().unwrap().lb_rule_id;
        assert_eq!(client.load_balancer_members(rule_id), vec!["vm-1".to_string()]);
    }

    #[tokio::test]
    async fn test_assign_without_rule_fails() {
        let client = mock_cloud(TEST_API_URL);
        let cloud = test_cloud_ops(&client);

        let err = cloud
            .assign_vm_to_load_balancer_rule(&cluster_with_public_ip(), "vm-1")
            .await
            .unwrap_err();

        assert!(matches!(err, ControllerError::NoLoadBalancerRule { .. }));
        assert_eq!(client.call_count(MockOperation::ListLoadBalancerRuleInstances), 0);
    }
}
