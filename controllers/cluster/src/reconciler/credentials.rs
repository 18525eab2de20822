//! Failure domain credentials.
//!
//! A failure domain names a Secret holding the CloudStack endpoint and API keys. The
//! shared client config map, when present, is overlaid on it. If the failure domain
//! names an account, every call for it goes through a client acting as that
//! account's user.

use super::ReconciliationRunner;
use crate::cloud::domain::ROOT_DOMAIN;
use crate::cloud::CloudOps;
use crate::config::ControllerConfig;
use crate::error::ControllerError;
use crate::store::ObjectStore;
use cloudstack_client::{ClientConfig, CloudStackClient, CloudStackClientTrait, CloudStackError};
use crds::CloudStackFailureDomainSpec;
use std::sync::Arc;
use tracing::debug;

/// Builds CloudStack clients from endpoint configuration
pub trait ClientFactory: Send + Sync {
    fn build(&self, config: ClientConfig) -> Result<Arc<dyn CloudStackClientTrait>, CloudStackError>;
}

/// Builds HTTP clients against a real CloudStack
#[derive(Debug, Default, Clone, Copy)]
pub struct CloudStackClientFactory;

impl ClientFactory for CloudStackClientFactory {
    fn build(&self, config: ClientConfig) -> Result<Arc<dyn CloudStackClientTrait>, CloudStackError> {
        Ok(Arc::new(CloudStackClient::new(config)?))
    }
}

/// Clients for one failure domain
#[derive(Clone)]
pub struct ScopedClients {
    /// Client built from the endpoint secret
    pub client: Arc<dyn CloudStackClientTrait>,
    /// Client acting as the failure domain's account; same as `client` without an account
    pub user: Arc<dyn CloudStackClientTrait>,
}

impl std::fmt::Debug for ScopedClients {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedClients")
            .field("api_url", &self.client.api_url())
            .finish_non_exhaustive()
    }
}

/// Resolve a failure domain's secret into CloudStack clients.
///
/// `namespace` is used when the secret reference does not name one.
pub async fn scope_credentials(
    store: &dyn ObjectStore,
    factory: &dyn ClientFactory,
    config: &ControllerConfig,
    namespace: &str,
    spec: &CloudStackFailureDomainSpec,
) -> Result<ScopedClients, ControllerError> {
    let secret_ref = &spec.acs_endpoint;
    let secret = store
        .get_secret(secret_ref.namespace_or(namespace), &secret_ref.name)
        .await
        .map_err(|e| ControllerError::Credentials(format!("getting ACSEndpoint secret with ref: {}: {}", secret_ref, e)))?;

    // The shared config map is optional
    let overlay = store
        .get_config_map(&config.client_config_map_namespace, &config.client_config_map_name)
        .await
        .unwrap_or_default();

    let client_config = ClientConfig::from_secret_data(&secret)
        .and_then(|c| c.with_overlay(&overlay))
        .map_err(|e| ControllerError::Credentials(format!("parsing ACSEndpoint secret with ref: {}: {}", secret_ref, e)))?;

    let client = factory
        .build(client_config)
        .map_err(|e| ControllerError::Credentials(format!("creating CloudStack client for {}: {}", secret_ref, e)))?;

    if spec.account.is_empty() {
        return Ok(ScopedClients {
            user: client.clone(),
            client,
        });
    }

    let domain = if spec.domain.is_empty() { ROOT_DOMAIN } else { spec.domain.as_str() };
    let user = client
        .new_client_in_domain_and_account(domain, &spec.account)
        .await
        .map_err(|e| {
            ControllerError::Credentials(format!(
                "acting as account {} in domain {} for failure domain {}: {}",
                spec.account, domain, spec.name, e
            ))
        })?;
    debug!("Scoped failure domain {} to account {} in domain {}", spec.name, spec.account, domain);
    Ok(ScopedClients { client, user })
}

/// CloudStack client state attached to a `ReconciliationRunner`.
///
/// Obtained with `ReconciliationRunner::register_extension`; the runner keeps only
/// request state, the clients live here.
pub struct CloudClientExtension<'r> {
    pub(crate) runner: &'r mut ReconciliationRunner,
    factory: Arc<dyn ClientFactory>,
    clients: Option<ScopedClients>,
}

impl std::fmt::Debug for CloudClientExtension<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudClientExtension")
            .field("runner", &self.runner)
            .field("clients", &self.clients)
            .finish_non_exhaustive()
    }
}

impl<'r> CloudClientExtension<'r> {
    pub(crate) fn new(runner: &'r mut ReconciliationRunner, factory: Arc<dyn ClientFactory>) -> Self {
        Self {
            runner,
            factory,
            clients: None,
        }
    }

    pub fn runner(&self) -> &ReconciliationRunner {
        &*self.runner
    }

    /// Act as the given failure domain's user for the rest of the pass.
    pub async fn as_failure_domain_user(&mut self, spec: &CloudStackFailureDomainSpec) -> Result<(), ControllerError> {
        let clients = scope_credentials(
            self.runner.store.as_ref(),
            self.factory.as_ref(),
            &self.runner.config,
            &self.runner.namespace,
            spec,
        )
        .await?;
        self.clients = Some(clients);
        Ok(())
    }

    /// Operations through the failure domain user's client
    pub fn cloud(&self) -> Result<CloudOps, ControllerError> {
        self.clients
            .as_ref()
            .map(|clients| CloudOps::new(clients.user.clone(), Arc::new(self.runner.config.cloud.clone())))
            .ok_or_else(|| ControllerError::Credentials("no failure domain credentials established".to_string()))
    }

    /// Operations through the unscoped client built from the endpoint secret
    pub fn endpoint_cloud(&self) -> Result<CloudOps, ControllerError> {
        self.clients
            .as_ref()
            .map(|clients| CloudOps::new(clients.client.clone(), Arc::new(self.runner.config.cloud.clone())))
            .ok_or_else(|| ControllerError::Credentials("no failure domain credentials established".to_string()))
    }
}
