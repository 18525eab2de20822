//! Test utilities for unit testing reconcilers
//!
//! This module provides an in-memory `ObjectStore`, a client factory handing out mock
//! CloudStack clients, and helpers for creating test data.

use crate::cloud::CloudOps;
use crate::config::{CloudConfig, ControllerConfig};
use crate::error::ControllerError;
use crate::reconciler::credentials::ClientFactory;
use crate::reconciler::Reconciler;
use crate::store::ObjectStore;
use cloudstack_client::{ClientConfig, CloudStackClientTrait, CloudStackError, MockCloudStackClient};
use crds::*;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::ResourceExt;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

pub const TEST_NAMESPACE: &str = "default";
pub const TEST_API_URL: &str = "https://cloud.test/client/api";

type Key = (String, String);

fn key(namespace: &str, name: &str) -> Key {
    (namespace.to_string(), name.to_string())
}

/// In-memory `ObjectStore` reporting errors with Kubernetes-style messages
#[derive(Debug, Default)]
pub struct MemoryStore {
    secrets: Mutex<BTreeMap<Key, BTreeMap<String, String>>>,
    config_maps: Mutex<BTreeMap<Key, BTreeMap<String, String>>>,
    failure_domains: Mutex<BTreeMap<Key, CloudStackFailureDomain>>,
    cluster_statuses: Mutex<BTreeMap<Key, CloudStackClusterStatus>>,
    failure_domain_statuses: Mutex<BTreeMap<Key, CloudStackFailureDomainStatus>>,
    finalizers: Mutex<BTreeMap<Key, Vec<String>>>,
    list_failure: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_secret(&self, namespace: &str, name: &str, data: BTreeMap<String, String>) {
        self.secrets.lock().unwrap().insert(key(namespace, name), data);
    }

    pub fn add_config_map(&self, namespace: &str, name: &str, data: BTreeMap<String, String>) {
        self.config_maps.lock().unwrap().insert(key(namespace, name), data);
    }

    pub fn add_failure_domain(&self, failure_domain: CloudStackFailureDomain) {
        let k = key(&failure_domain.namespace().unwrap_or_default(), &failure_domain.name_any());
        self.failure_domains.lock().unwrap().insert(k, failure_domain);
    }

    /// Failure domains in a namespace, by object name
    pub fn failure_domains(&self, namespace: &str) -> Vec<CloudStackFailureDomain> {
        self.failure_domains
            .lock()
            .unwrap()
            .iter()
            .filter(|((ns, _), _)| ns == namespace)
            .map(|(_, fd)| fd.clone())
            .collect()
    }

    pub fn cluster_status(&self, namespace: &str, name: &str) -> Option<CloudStackClusterStatus> {
        self.cluster_statuses.lock().unwrap().get(&key(namespace, name)).cloned()
    }

    pub fn failure_domain_status(&self, namespace: &str, name: &str) -> Option<CloudStackFailureDomainStatus> {
        self.failure_domain_statuses
            .lock()
            .unwrap()
            .get(&key(namespace, name))
            .cloned()
    }

    pub fn finalizers(&self, namespace: &str, name: &str) -> Vec<String> {
        self.finalizers
            .lock()
            .unwrap()
            .get(&key(namespace, name))
            .cloned()
            .unwrap_or_default()
    }

    /// Make the next list call fail with `message`
    pub fn fail_next_list(&self, message: &str) {
        *self.list_failure.lock().unwrap() = Some(message.to_string());
    }
}

#[async_trait::async_trait]
impl ObjectStore for MemoryStore {
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<BTreeMap<String, String>, ControllerError> {
        self.secrets
            .lock()
            .unwrap()
            .get(&key(namespace, name))
            .cloned()
            .ok_or_else(|| ControllerError::Store(format!("secrets \"{}\" not found", name)))
    }

    async fn get_config_map(&self, namespace: &str, name: &str) -> Result<BTreeMap<String, String>, ControllerError> {
        self.config_maps
            .lock()
            .unwrap()
            .get(&key(namespace, name))
            .cloned()
            .ok_or_else(|| ControllerError::Store(format!("configmaps \"{}\" not found", name)))
    }

    async fn get_failure_domain(&self, namespace: &str, name: &str) -> Result<CloudStackFailureDomain, ControllerError> {
        self.failure_domains
            .lock()
            .unwrap()
            .get(&key(namespace, name))
            .cloned()
            .ok_or_else(|| ControllerError::Store(format!("cloudstackfailuredomains \"{}\" not found", name)))
    }

    async fn list_failure_domains(
        &self,
        namespace: &str,
        labels: &BTreeMap<String, String>,
    ) -> Result<Vec<CloudStackFailureDomain>, ControllerError> {
        if let Some(message) = self.list_failure.lock().unwrap().take() {
            return Err(ControllerError::Store(message));
        }
        Ok(self
            .failure_domains(namespace)
            .into_iter()
            .filter(|fd| labels.iter().all(|(k, v)| fd.labels().get(k) == Some(v)))
            .collect())
    }

    async fn create_failure_domain(&self, failure_domain: &CloudStackFailureDomain) -> Result<(), ControllerError> {
        let k = key(&failure_domain.namespace().unwrap_or_default(), &failure_domain.name_any());
        let mut failure_domains = self.failure_domains.lock().unwrap();
        if failure_domains.contains_key(&k) {
            return Err(ControllerError::Store(format!(
                "cloudstackfailuredomains \"{}\" already exists",
                k.1
            )));
        }
        failure_domains.insert(k, failure_domain.clone());
        Ok(())
    }

    async fn delete_failure_domain(&self, namespace: &str, name: &str) -> Result<(), ControllerError> {
        self.failure_domains
            .lock()
            .unwrap()
            .remove(&key(namespace, name))
            .map(|_| ())
            .ok_or_else(|| ControllerError::Store(format!("cloudstackfailuredomains \"{}\" not found", name)))
    }

    async fn patch_cluster_status(
        &self,
        namespace: &str,
        name: &str,
        status: &CloudStackClusterStatus,
    ) -> Result<(), ControllerError> {
        self.cluster_statuses
            .lock()
            .unwrap()
            .insert(key(namespace, name), status.clone());
        Ok(())
    }

    async fn patch_failure_domain_status(
        &self,
        namespace: &str,
        name: &str,
        status: &CloudStackFailureDomainStatus,
    ) -> Result<(), ControllerError> {
        self.failure_domain_statuses
            .lock()
            .unwrap()
            .insert(key(namespace, name), status.clone());
        Ok(())
    }

    async fn patch_cluster_finalizers(&self, namespace: &str, name: &str, finalizers: &[String]) -> Result<(), ControllerError> {
        self.finalizers
            .lock()
            .unwrap()
            .insert(key(namespace, name), finalizers.to_vec());
        Ok(())
    }
}

/// Hands out mock clients by API URL and records every configuration it was asked to build
#[derive(Debug, Default)]
pub struct MockClientFactory {
    clients: Mutex<BTreeMap<String, MockCloudStackClient>>,
    built: Mutex<Vec<ClientConfig>>,
}

impl MockClientFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, client: &MockCloudStackClient) {
        self.clients
            .lock()
            .unwrap()
            .insert(client.api_url().to_string(), client.clone());
    }

    pub fn built(&self) -> Vec<ClientConfig> {
        self.built.lock().unwrap().clone()
    }
}

impl ClientFactory for MockClientFactory {
    fn build(&self, config: ClientConfig) -> Result<Arc<dyn CloudStackClientTrait>, CloudStackError> {
        let client = self
            .clients
            .lock()
            .unwrap()
            .get(&config.api_url)
            .cloned()
            .ok_or_else(|| CloudStackError::Configuration(format!("no CloudStack at {}", config.api_url)))?;
        self.built.lock().unwrap().push(config);
        Ok(Arc::new(client))
    }
}

/// Mock cloud with the default isolated network offering registered
pub fn mock_cloud(api_url: &str) -> MockCloudStackClient {
    let client = MockCloudStackClient::new(api_url);
    client.add_network_offering(&CloudConfig::default().isolated_network_offering);
    client
}

pub fn test_cloud_ops(client: &MockCloudStackClient) -> CloudOps {
    CloudOps::new(Arc::new(client.clone()), Arc::new(CloudConfig::default()))
}

/// Secret data for an API endpoint
pub fn endpoint_secret(api_url: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("api-url".to_string(), api_url.to_string()),
        ("api-key".to_string(), "test-api-key".to_string()),
        ("secret-key".to_string(), "test-secret-key".to_string()),
    ])
}

pub fn zone_spec(name: &str, network_name: &str) -> ZoneSpec {
    ZoneSpec {
        name: name.to_string(),
        id: String::new(),
        network: Network::named(network_name),
    }
}

pub fn failure_domain_spec(name: &str, zone: ZoneSpec, secret_name: &str) -> CloudStackFailureDomainSpec {
    CloudStackFailureDomainSpec {
        name: name.to_string(),
        zone,
        account: String::new(),
        domain: String::new(),
        acs_endpoint: SecretReference::new(secret_name),
    }
}

/// Helper to create a test CloudStackCluster with a fresh UID
pub fn create_test_cluster(name: &str, zones: Vec<ZoneSpec>) -> CloudStackCluster {
    CloudStackCluster {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(TEST_NAMESPACE.to_string()),
            uid: Some(uuid::Uuid::new_v4().to_string()),
            ..Default::default()
        },
        spec: CloudStackClusterSpec {
            zones,
            ..Default::default()
        },
        status: None,
    }
}

/// Cloud-side network as CloudStack reports it
pub fn cloud_network(id: &str, name: &str, network_type: &str) -> cloudstack_client::Network {
    cloudstack_client::Network {
        id: id.to_string(),
        name: name.to_string(),
        network_type: network_type.to_string(),
        ..Default::default()
    }
}

/// Reconciler over the given store and factory with default configuration
pub fn create_test_reconciler(store: Arc<MemoryStore>, factory: Arc<MockClientFactory>) -> Reconciler {
    Reconciler::new(store, factory, ControllerConfig::default())
}
