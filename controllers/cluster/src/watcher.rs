//! Kubernetes resource watchers.
//!
//! Both watchers go through `watch_resource()`, which runs a kube_runtime::Controller
//! with debounce, bounded concurrency and per-resource Fibonacci backoff on errors.

use crate::error::ControllerError;
use crate::reconciler::steps::StepResult;
use crate::reconciler::Reconciler;
use crds::{CloudStackCluster, CloudStackFailureDomain};
use futures::StreamExt;
use kube::{Api, ResourceExt};
use kube_runtime::{
    controller::{Action, Config as ControllerConfig},
    watcher, Controller,
};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

type ReconcileFuture = Pin<Box<dyn Future<Output = Result<Action, ControllerError>> + Send>>;

/// Backoff key of a watched object
fn resource_key<K: kube::Resource>(kind: &str, obj: &K) -> String {
    format!("{}/{}/{}", kind, obj.namespace().unwrap_or_default(), obj.name_any())
}

/// Run a Controller for one resource kind until its stream ends.
async fn watch_resource<K, F>(
    api: Api<K>,
    reconciler: Arc<Reconciler>,
    reconcile_fn: F,
    resource_name: &'static str,
) -> Result<(), ControllerError>
where
    K: kube::Resource + Clone + Send + Sync + 'static + std::fmt::Debug + serde::de::DeserializeOwned,
    K::DynamicType: Default + std::cmp::Eq + std::hash::Hash + Clone + std::fmt::Debug + Unpin,
    F: Fn(Arc<Reconciler>, Arc<K>) -> ReconcileFuture + Send + Sync + Clone + 'static,
{
    info!("Starting {} watcher", resource_name);

    let error_policy = move |obj: Arc<K>, error: &ControllerError, ctx: Arc<Reconciler>| {
        let key = resource_key(resource_name, obj.as_ref());
        ctx.increment_error(&key);
        let (backoff, error_count) = ctx.get_backoff_for_resource(&key);
        error!(
            "Reconciliation error for {} (attempt {}), retrying in {:?}: {}",
            key, error_count, backoff, error
        );
        Action::requeue(backoff)
    };

    let reconcile = move |obj: Arc<K>, ctx: Arc<Reconciler>| {
        let reconcile_fn = reconcile_fn.clone();
        async move {
            let key = resource_key(resource_name, obj.as_ref());
            debug!("Reconciling {}", key);
            let action = reconcile_fn(ctx.clone(), obj).await?;
            ctx.reset_error(&key);
            Ok::<Action, ControllerError>(action)
        }
    };

    // Debounce batches the status updates a pass produces
    let controller_config = ControllerConfig::default()
        .debounce(Duration::from_secs(5))
        .concurrency(3);

    Controller::new(api, watcher::Config::default())
        .with_config(controller_config)
        .run(reconcile, error_policy, reconciler)
        .for_each(|res| async move {
            if let Err(e) = res {
                error!("Controller error for {}: {}", resource_name, e);
            }
        })
        .await;

    Ok(())
}

/// Watches CloudStack infrastructure resources.
pub struct Watcher {
    reconciler: Arc<Reconciler>,
    cluster_api: Api<CloudStackCluster>,
    failure_domain_api: Api<CloudStackFailureDomain>,
}

impl std::fmt::Debug for Watcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watcher").finish_non_exhaustive()
    }
}

impl Watcher {
    pub fn new(
        reconciler: Arc<Reconciler>,
        cluster_api: Api<CloudStackCluster>,
        failure_domain_api: Api<CloudStackFailureDomain>,
    ) -> Self {
        Self {
            reconciler,
            cluster_api,
            failure_domain_api,
        }
    }

    /// Watches CloudStackCluster resources.
    pub async fn watch_clusters(&self) -> Result<(), ControllerError> {
        watch_resource(
            self.cluster_api.clone(),
            self.reconciler.clone(),
            |reconciler, resource| {
                Box::pin(async move {
                    match reconciler.reconcile_cluster(&resource).await? {
                        StepResult::Continue => Ok(Action::await_change()),
                        StepResult::Requeue { after, .. } => Ok(Action::requeue(after)),
                    }
                })
            },
            "CloudStackCluster",
        )
        .await
    }

    /// Watches CloudStackFailureDomain resources.
    pub async fn watch_failure_domains(&self) -> Result<(), ControllerError> {
        watch_resource(
            self.failure_domain_api.clone(),
            self.reconciler.clone(),
            |reconciler, resource| {
                Box::pin(async move {
                    reconciler.reconcile_failure_domain(&resource).await?;
                    Ok(Action::await_change())
                })
            },
            "CloudStackFailureDomain",
        )
        .await
    }
}
