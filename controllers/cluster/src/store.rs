//! Declarative object store.
//!
//! The reconcilers only need a handful of get/list/create/delete/patch calls against
//! Kubernetes. They go through `ObjectStore` so unit tests can run against an in-memory
//! store; `KubeStore` is the production implementation over `kube::Api`.
//!
//! Errors keep the Kubernetes message text, so "already exists" conflicts on create
//! classify the same way CloudStack conflicts do.

use crate::error::ControllerError;
use crds::{CloudStackCluster, CloudStackClusterStatus, CloudStackFailureDomain, CloudStackFailureDomainStatus};
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use kube::api::{DeleteParams, ListParams, Patch, PatchParams, PostParams};
use kube::{Api, Client, ResourceExt};
use serde_json::json;
use std::collections::BTreeMap;
use tracing::debug;

/// Operations the reconcilers perform on Kubernetes objects
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// Secret data, with binary values decoded as UTF-8
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<BTreeMap<String, String>, ControllerError>;
    async fn get_config_map(&self, namespace: &str, name: &str) -> Result<BTreeMap<String, String>, ControllerError>;

    async fn get_failure_domain(&self, namespace: &str, name: &str) -> Result<CloudStackFailureDomain, ControllerError>;
    /// Failure domains in `namespace` carrying every label in `labels`
    async fn list_failure_domains(
        &self,
        namespace: &str,
        labels: &BTreeMap<String, String>,
    ) -> Result<Vec<CloudStackFailureDomain>, ControllerError>;
    async fn create_failure_domain(&self, failure_domain: &CloudStackFailureDomain) -> Result<(), ControllerError>;
    async fn delete_failure_domain(&self, namespace: &str, name: &str) -> Result<(), ControllerError>;

    async fn patch_cluster_status(
        &self,
        namespace: &str,
        name: &str,
        status: &CloudStackClusterStatus,
    ) -> Result<(), ControllerError>;
    async fn patch_failure_domain_status(
        &self,
        namespace: &str,
        name: &str,
        status: &CloudStackFailureDomainStatus,
    ) -> Result<(), ControllerError>;
    /// Replace the finalizer list of a cluster
    async fn patch_cluster_finalizers(&self, namespace: &str, name: &str, finalizers: &[String]) -> Result<(), ControllerError>;
}

/// `ObjectStore` backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl std::fmt::Debug for KubeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeStore").finish_non_exhaustive()
    }
}

impl KubeStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn failure_domains(&self, namespace: &str) -> Api<CloudStackFailureDomain> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn clusters(&self, namespace: &str) -> Api<CloudStackCluster> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

/// Label selector string (`k1=v1,k2=v2`)
pub fn label_selector(labels: &BTreeMap<String, String>) -> String {
    labels
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(",")
}

#[async_trait::async_trait]
impl ObjectStore for KubeStore {
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<BTreeMap<String, String>, ControllerError> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        let secret = api.get(name).await?;

        let mut data: BTreeMap<String, String> = secret
            .data
            .unwrap_or_default()
            .into_iter()
            .map(|(k, v)| (k, String::from_utf8_lossy(&v.0).into_owned()))
            .collect();
        data.extend(secret.string_data.unwrap_or_default());
        Ok(data)
    }

    async fn get_config_map(&self, namespace: &str, name: &str) -> Result<BTreeMap<String, String>, ControllerError> {
        let api: Api<ConfigMap> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.get(name).await?.data.unwrap_or_default())
    }

    async fn get_failure_domain(&self, namespace: &str, name: &str) -> Result<CloudStackFailureDomain, ControllerError> {
        Ok(self.failure_domains(namespace).get(name).await?)
    }

    async fn list_failure_domains(
        &self,
        namespace: &str,
        labels: &BTreeMap<String, String>,
    ) -> Result<Vec<CloudStackFailureDomain>, ControllerError> {
        let params = ListParams::default().labels(&label_selector(labels));
        Ok(self.failure_domains(namespace).list(&params).await?.items)
    }

    async fn create_failure_domain(&self, failure_domain: &CloudStackFailureDomain) -> Result<(), ControllerError> {
        let namespace = failure_domain
            .namespace()
            .ok_or_else(|| ControllerError::Store(format!("failure domain {} has no namespace", failure_domain.name_any())))?;
        self.failure_domains(&namespace)
            .create(&PostParams::default(), failure_domain)
            .await?;
        debug!("Created CloudStackFailureDomain {}/{}", namespace, failure_domain.name_any());
        Ok(())
    }

    async fn delete_failure_domain(&self, namespace: &str, name: &str) -> Result<(), ControllerError> {
        self.failure_domains(namespace)
            .delete(name, &DeleteParams::default())
            .await?;
        Ok(())
    }

    async fn patch_cluster_status(
        &self,
        namespace: &str,
        name: &str,
        status: &CloudStackClusterStatus,
    ) -> Result<(), ControllerError> {
        let patch = json!({ "status": status });
        self.clusters(namespace)
            .patch_status(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }

    async fn patch_failure_domain_status(
        &self,
        namespace: &str,
        name: &str,
        status: &CloudStackFailureDomainStatus,
    ) -> Result<(), ControllerError> {
        let patch = json!({ "status": status });
        self.failure_domains(namespace)
            .patch_status(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }

    async fn patch_cluster_finalizers(&self, namespace: &str, name: &str, finalizers: &[String]) -> Result<(), ControllerError> {
        let patch = json!({ "metadata": { "finalizers": finalizers } });
        self.clusters(namespace)
            .patch(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_selector() {
        let labels = BTreeMap::from([
            ("cluster.x-k8s.io/cluster-name".to_string(), "capi-1".to_string()),
            ("tier".to_string(), "infra".to_string()),
        ]);
        assert_eq!(label_selector(&labels), "cluster.x-k8s.io/cluster-name=capi-1,tier=infra");
        assert_eq!(label_selector(&BTreeMap::new()), "");
    }
}
