//! Main controller implementation.
//!
//! Builds the Kubernetes client and the shared `Reconciler`, then runs one watcher per
//! CRD until either of them stops.

use crate::config::ControllerConfig;
use crate::error::ControllerError;
use crate::reconciler::credentials::CloudStackClientFactory;
use crate::reconciler::Reconciler;
use crate::store::KubeStore;
use crate::watcher::Watcher;
use crds::{CloudStackCluster, CloudStackFailureDomain};
use kube::{Api, Client};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

/// CloudStack cluster infrastructure controller.
#[derive(Debug)]
pub struct Controller {
    cluster_watcher: JoinHandle<Result<(), ControllerError>>,
    failure_domain_watcher: JoinHandle<Result<(), ControllerError>>,
}

impl Controller {
    /// Creates a new controller instance and starts its watchers.
    pub async fn new(config: ControllerConfig) -> Result<Self, ControllerError> {
        info!("Initializing CloudStack cluster controller");

        let kube_client = Client::try_default().await?;

        let (cluster_api, failure_domain_api): (Api<CloudStackCluster>, Api<CloudStackFailureDomain>) =
            match config.watch_namespace.as_deref() {
                Some(ns) => (
                    Api::namespaced(kube_client.clone(), ns),
                    Api::namespaced(kube_client.clone(), ns),
                ),
                None => (Api::all(kube_client.clone()), Api::all(kube_client.clone())),
            };

        let reconciler = Arc::new(Reconciler::new(
            Arc::new(KubeStore::new(kube_client)),
            Arc::new(CloudStackClientFactory),
            config,
        ));

        let watcher_instance = Arc::new(Watcher::new(reconciler, cluster_api, failure_domain_api));

        let cluster_watcher = {
            let watcher = watcher_instance.clone();
            tokio::spawn(async move { watcher.watch_clusters().await })
        };

        let failure_domain_watcher = {
            let watcher = watcher_instance.clone();
            tokio::spawn(async move { watcher.watch_failure_domains().await })
        };

        Ok(Self {
            cluster_watcher,
            failure_domain_watcher,
        })
    }

    /// Runs until a watcher exits.
    pub async fn run(mut self) -> Result<(), ControllerError> {
        info!("CloudStack cluster controller running");

        tokio::select! {
            result = &mut self.cluster_watcher => {
                result.map_err(|e| ControllerError::Watch(format!("CloudStackCluster watcher panicked: {}", e)))?
                    .map_err(|e| ControllerError::Watch(format!("CloudStackCluster watcher error: {}", e)))?;
            }
            result = &mut self.failure_domain_watcher => {
                result.map_err(|e| ControllerError::Watch(format!("CloudStackFailureDomain watcher panicked: {}", e)))?
                    .map_err(|e| ControllerError::Watch(format!("CloudStackFailureDomain watcher error: {}", e)))?;
            }
        }

        Ok(())
    }
}
