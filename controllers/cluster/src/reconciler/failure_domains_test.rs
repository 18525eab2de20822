//! Unit tests for failure domain children

#[cfg(test)]
mod tests {
    use crate::config::ControllerConfig;
    use crate::reconciler::steps::StepResult;
    use crate::reconciler::ReconciliationRunner;
    use crate::test_utils::*;
    use crds::{failure_domain_hashed_meta_name, CloudStackCluster, CLUSTER_NAME_LABEL};
    use std::sync::Arc;

    fn cluster_with_failure_domains(names: &[&str]) -> CloudStackCluster {
        let mut cluster = create_test_cluster("c1", vec![zone_spec("zone-a", "net-a")]);
        cluster.spec.failure_domains = names
            .iter()
            .map(|name| failure_domain_spec(name, zone_spec("zone-a", "net-a"), "secret"))
            .collect();
        cluster
    }

    fn runner(store: &Arc<MemoryStore>, cluster: &CloudStackCluster) -> ReconciliationRunner {
        ReconciliationRunner::new(store.clone(), Arc::new(ControllerConfig::default()), cluster)
    }

    #[tokio::test]
    async fn test_created_failure_domains_are_labelled_and_owned() {
        let store = Arc::new(MemoryStore::new());
        let cluster = cluster_with_failure_domains(&["fd-a"]);

        runner(&store, &cluster).create_failure_domains().await.unwrap();

        let created = store.failure_domains(TEST_NAMESPACE);
        assert_eq!(created.len(), 1);
        let fd = &created[0];
        assert_eq!(fd.metadata.name.as_deref(), Some(failure_domain_hashed_meta_name("fd-a", "c1").as_str()));
        assert_eq!(fd.metadata.labels.as_ref().unwrap()[CLUSTER_NAME_LABEL], "c1");
        let owners = fd.metadata.owner_references.as_ref().unwrap();
        assert_eq!(owners[0].kind, "CloudStackCluster");
        assert_eq!(owners[0].controller, Some(true));
    }

    #[tokio::test]
    async fn test_create_failure_domains_twice_is_ok() {
        let store = Arc::new(MemoryStore::new());
        let cluster = cluster_with_failure_domains(&["fd-a", "fd-b"]);
        let runner = runner(&store, &cluster);

        runner.create_failure_domains().await.unwrap();
        runner.create_failure_domains().await.unwrap();

        assert_eq!(store.failure_domains(TEST_NAMESPACE).len(), 2);
    }

    #[tokio::test]
    async fn test_extraneous_failure_domains_are_pruned() {
        let store = Arc::new(MemoryStore::new());
        runner(&store, &cluster_with_failure_domains(&["fd-a", "fd-b", "fd-c"]))
            .create_failure_domains()
            .await
            .unwrap();

        let mut runner = runner(&store, &cluster_with_failure_domains(&["fd-a", "fd-b"]));
        runner.get_failure_domains().await.unwrap();
        let removed = runner.remove_extraneous_failure_domains().await.unwrap();

        assert_eq!(removed, 1);
        let mut remaining: Vec<String> = store
            .failure_domains(TEST_NAMESPACE)
            .into_iter()
            .map(|fd| fd.spec.name)
            .collect();
        remaining.sort();
        assert_eq!(remaining, vec!["fd-a".to_string(), "fd-b".to_string()]);
        assert_eq!(runner.failure_domains.len(), 2);
    }

    #[tokio::test]
    async fn test_other_clusters_failure_domains_are_left_alone() {
        let store = Arc::new(MemoryStore::new());
        let mut other = cluster_with_failure_domains(&["fd-x"]);
        other.metadata.name = Some("c2".to_string());
        runner(&store, &other).create_failure_domains().await.unwrap();

        let mut runner = runner(&store, &cluster_with_failure_domains(&["fd-a"]));
        runner.get_failure_domains().await.unwrap();
        let removed = runner.remove_extraneous_failure_domains().await.unwrap();

        assert_eq!(removed, 0);
        assert_eq!(store.failure_domains(TEST_NAMESPACE).len(), 1);
    }

    #[tokio::test]
    async fn test_requeue_when_no_failure_domains_exist() {
        let store = Arc::new(MemoryStore::new());
        let mut runner = runner(&store, &cluster_with_failure_domains(&[]));

        let result = runner.get_failure_domains_and_requeue_if_missing().await.unwrap();

        match result {
            StepResult::Requeue { after, reason } => {
                assert_eq!(after, ControllerConfig::default().requeue_delay);
                assert!(reason.contains("no failure domains"));
            }
            other => panic!("expected requeue, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_list_error_is_wrapped() {
        let store = Arc::new(MemoryStore::new());
        store.fail_next_list("etcdserver: request timed out");
        let mut runner = runner(&store, &cluster_with_failure_domains(&["fd-a"]));

        let err = runner.get_failure_domains().await.unwrap_err();

        let message = err.to_string();
        assert!(message.contains("failed to list failure domains"));
        assert!(message.contains("request timed out"));
    }

    #[tokio::test]
    async fn test_get_failure_domain_by_name() {
        let store = Arc::new(MemoryStore::new());
        let cluster = cluster_with_failure_domains(&["fd-a"]);
        let runner = runner(&store, &cluster);
        runner.create_failure_domains().await.unwrap();

        let fd = runner.get_failure_domain_by_name("fd-a").await.unwrap();
        assert_eq!(fd.spec.name, "fd-a");

        let err = runner.get_failure_domain_by_name("fd-z").await.unwrap_err();
        assert!(err.to_string().contains("failed to get failure domain with name fd-z"));
    }
}
