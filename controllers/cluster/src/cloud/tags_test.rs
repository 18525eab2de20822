//! Unit tests for ownership tags

#[cfg(test)]
mod tests {
    use crate::test_utils::*;
    use cloudstack_client::{MockOperation, ResourceType};
    use crds::Network;
    use kube::ResourceExt;
    use std::collections::BTreeMap;

    fn created_network(id: &str) -> Network {
        Network {
            id: id.to_string(),
            name: "net-a".to_string(),
            network_type: "Isolated".to_string(),
        }
    }

    #[tokio::test]
    async fn test_cluster_tag_name_uses_uid() {
        let client = mock_cloud(TEST_API_URL);
        let cloud = test_cloud_ops(&client);
        let cluster = create_test_cluster("c1", vec![]);

        let tag = cloud.cluster_tag_name(&cluster).unwrap();
        assert_eq!(tag, format!("CAPC_cluster_{}", cluster.uid().unwrap()));

        let mut no_uid = cluster.clone();
        no_uid.metadata.uid = None;
        assert!(cloud.cluster_tag_name(&no_uid).is_err());
    }

    #[tokio::test]
    async fn test_add_cluster_tags_is_idempotent() {
        let client = mock_cloud(TEST_API_URL);
        let cloud = test_cloud_ops(&client);
        let cluster = create_test_cluster("c1", vec![]);

        let applied = cloud
            .add_cluster_tags(ResourceType::Network, "n-1", &cluster, true)
            .await
            .unwrap();
        assert_eq!(applied, 2);
        let after_first = client.tags_of(ResourceType::Network, "n-1");

        let applied = cloud
            .add_cluster_tags(ResourceType::Network, "n-1", &cluster, true)
            .await
            .unwrap();
        assert_eq!(applied, 0);
        assert_eq!(client.tags_of(ResourceType::Network, "n-1"), after_first);
        assert_eq!(client.call_count(MockOperation::AddTags), 1);
    }

    #[tokio::test]
    async fn test_adopted_resource_gets_no_created_by_tag() {
        let client = mock_cloud(TEST_API_URL);
        let cloud = test_cloud_ops(&client);
        let cluster = create_test_cluster("c1", vec![]);

        cloud
            .add_cluster_tags(ResourceType::Network, "n-1", &cluster, false)
            .await
            .unwrap();

        let tags = client.tags_of(ResourceType::Network, "n-1");
        assert_eq!(tags.len(), 1);
        assert!(!tags.contains_key("created_by_CAPC"));
    }

    #[tokio::test]
    async fn test_remove_cluster_tag_leaves_other_tags() {
        let client = mock_cloud(TEST_API_URL);
        let cloud = test_cloud_ops(&client);
        let cluster = create_test_cluster("c1", vec![]);
        let own_tag = cloud.cluster_tag_name(&cluster).unwrap();
        client.set_tags(
            ResourceType::Network,
            "n-1",
            BTreeMap::from([
                (own_tag.clone(), "1".to_string()),
                ("CAPC_cluster_other".to_string(), "1".to_string()),
                ("created_by_CAPC".to_string(), "1".to_string()),
            ]),
        );

        cloud
            .remove_cluster_tag_from_network(&cluster, &created_network("n-1"))
            .await
            .unwrap();

        let tags = client.tags_of(ResourceType::Network, "n-1");
        assert!(!tags.contains_key(&own_tag));
        assert!(tags.contains_key("CAPC_cluster_other"));
        assert!(tags.contains_key("created_by_CAPC"));
    }

    #[tokio::test]
    async fn test_network_without_created_by_tag_is_never_deleted() {
        let client = mock_cloud(TEST_API_URL);
        client.add_network(cloud_network("n-1", "net-a", "Isolated"));
        let cloud = test_cloud_ops(&client);

        let deleted = cloud.delete_network_if_not_in_use(&created_network("n-1")).await.unwrap();

        assert!(!deleted);
        assert!(client.network("n-1").is_some());
        assert_eq!(client.call_count(MockOperation::DeleteNetwork), 0);
    }

    #[tokio::test]
    async fn test_network_still_owned_is_not_deleted() {
        let client = mock_cloud(TEST_API_URL);
        client.add_network(cloud_network("n-1", "net-a", "Isolated"));
        client.set_tags(
            ResourceType::Network,
            "n-1",
            BTreeMap::from([
                ("CAPC_cluster_other".to_string(), "1".to_string()),
                ("created_by_CAPC".to_string(), "1".to_string()),
            ]),
        );
        let cloud = test_cloud_ops(&client);

        assert!(!cloud.delete_network_if_not_in_use(&created_network("n-1")).await.unwrap());
        assert!(client.network("n-1").is_some());
    }

    #[tokio::test]
    async fn test_unused_created_network_is_deleted() {
        let client = mock_cloud(TEST_API_URL);
        client.add_network(cloud_network("n-1", "net-a", "Isolated"));
        client.set_tags(
            ResourceType::Network,
            "n-1",
            BTreeMap::from([("created_by_CAPC".to_string(), "1".to_string())]),
        );
        let cloud = test_cloud_ops(&client);

        assert!(cloud.delete_network_if_not_in_use(&created_network("n-1")).await.unwrap());
        assert!(client.network("n-1").is_none());
    }

    #[tokio::test]
    async fn test_public_ip_release_follows_the_same_rule() {
        let client = mock_cloud(TEST_API_URL);
        client.add_free_public_ip("ip-1", "203.0.113.10");
        client.add_free_public_ip("ip-2", "203.0.113.11");
        client.set_tags(
            ResourceType::PublicIpAddress,
            "ip-1",
            BTreeMap::from([("created_by_CAPC".to_string(), "1".to_string())]),
        );
        let cloud = test_cloud_ops(&client);

        assert!(cloud.disassociate_public_ip_if_not_in_use("ip-1").await.unwrap());
        assert!(!cloud.disassociate_public_ip_if_not_in_use("ip-2").await.unwrap());
        assert!(!cloud.disassociate_public_ip_if_not_in_use("").await.unwrap());
        assert_eq!(client.call_count(MockOperation::DisassociateIpAddress), 1);
    }
}
