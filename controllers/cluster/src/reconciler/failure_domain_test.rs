//! Unit tests for CloudStackFailureDomain reconciliation

#[cfg(test)]
mod tests {
    use crate::error::ControllerError;
    use crate::test_utils::*;
    use cloudstack_client::MockOperation;
    use crds::{CloudStackFailureDomain, CloudStackFailureDomainSpec, NETWORK_TYPE_SHARED};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use std::sync::Arc;

    fn failure_domain(name: &str, spec: CloudStackFailureDomainSpec) -> CloudStackFailureDomain {
        CloudStackFailureDomain {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(TEST_NAMESPACE.to_string()),
                ..Default::default()
            },
            spec,
            status: None,
        }
    }

    #[tokio::test]
    async fn test_failure_domain_with_existing_network_is_ready() {
        let store = Arc::new(MemoryStore::new());
        store.add_secret(TEST_NAMESPACE, "secret-a", endpoint_secret(TEST_API_URL));
        let client = mock_cloud(TEST_API_URL);
        client.add_network(cloud_network("n-1", "net-a", NETWORK_TYPE_SHARED));
        let factory = Arc::new(MockClientFactory::new());
        factory.add(&client);
        let reconciler = create_test_reconciler(store.clone(), factory);

        let fd = failure_domain("fd-a-obj", failure_domain_spec("fd-a", zone_spec("zone-a", "net-a"), "secret-a"));
        reconciler.reconcile_failure_domain(&fd).await.unwrap();

        let status = store.failure_domain_status(TEST_NAMESPACE, "fd-a-obj").unwrap();
        assert!(status.ready);
        assert_eq!(status.network.unwrap().id, "n-1");
        assert!(status.error.is_none());
    }

    #[tokio::test]
    async fn test_missing_zone_network_is_not_an_error() {
        let store = Arc::new(MemoryStore::new());
        store.add_secret(TEST_NAMESPACE, "secret-a", endpoint_secret(TEST_API_URL));
        let client = mock_cloud(TEST_API_URL);
        let factory = Arc::new(MockClientFactory::new());
        factory.add(&client);
        let reconciler = create_test_reconciler(store.clone(), factory);

        let fd = failure_domain("fd-a-obj", failure_domain_spec("fd-a", zone_spec("zone-a", "net-a"), "secret-a"));
        reconciler.reconcile_failure_domain(&fd).await.unwrap();

        let status = store.failure_domain_status(TEST_NAMESPACE, "fd-a-obj").unwrap();
        assert!(status.ready);
        assert!(status.network.is_none());
    }

    #[tokio::test]
    async fn test_missing_secret_is_recorded_on_status() {
        let store = Arc::new(MemoryStore::new());
        let factory = Arc::new(MockClientFactory::new());
        let reconciler = create_test_reconciler(store.clone(), factory);

        let fd = failure_domain("fd-a-obj", failure_domain_spec("fd-a", zone_spec("zone-a", "net-a"), "absent"));
        let err = reconciler.reconcile_failure_domain(&fd).await.unwrap_err();

        assert!(matches!(err, ControllerError::Credentials(_)));
        let status = store.failure_domain_status(TEST_NAMESPACE, "fd-a-obj").unwrap();
        assert!(!status.ready);
        assert!(status.error.unwrap().contains("absent"));
    }

    #[tokio::test]
    async fn test_failure_domains_use_their_own_endpoints() {
        let store = Arc::new(MemoryStore::new());
        let url_a = "https://cloud-a.test/client/api";
        let url_b = "https://cloud-b.test/client/api";
        store.add_secret(TEST_NAMESPACE, "secret-a", endpoint_secret(url_a));
        store.add_secret(TEST_NAMESPACE, "secret-b", endpoint_secret(url_b));
        let cloud_a = mock_cloud(url_a);
        let cloud_b = mock_cloud(url_b);
        cloud_b.add_network(cloud_network("n-b", "net-b", NETWORK_TYPE_SHARED));
        let factory = Arc::new(MockClientFactory::new());
        factory.add(&cloud_a);
        factory.add(&cloud_b);
        let reconciler = create_test_reconciler(store.clone(), factory.clone());

        let fd_a = failure_domain("fd-a-obj", failure_domain_spec("fd-a", zone_spec("zone-a", "net-a"), "secret-a"));
        let fd_b = failure_domain("fd-b-obj", failure_domain_spec("fd-b", zone_spec("zone-b", "net-b"), "secret-b"));
        reconciler.reconcile_failure_domain(&fd_a).await.unwrap();
        reconciler.reconcile_failure_domain(&fd_b).await.unwrap();

        assert_eq!(cloud_a.call_count(MockOperation::GetNetworkId), 1);
        assert_eq!(cloud_b.call_count(MockOperation::GetNetworkId), 1);
        let built: Vec<String> = factory.built().into_iter().map(|c| c.api_url).collect();
        assert_eq!(built, vec![url_a.to_string(), url_b.to_string()]);

        let status_b = store.failure_domain_status(TEST_NAMESPACE, "fd-b-obj").unwrap();
        assert_eq!(status_b.network.unwrap().id, "n-b");
        assert!(store
            .failure_domain_status(TEST_NAMESPACE, "fd-a-obj")
            .unwrap()
            .network
            .is_none());
    }
}
