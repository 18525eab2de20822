//! Reconciliation logic for CloudStack cluster infrastructure.
//!
//! - `cluster`: the `CloudStackCluster` pass and its teardown
//! - `failure_domain`: the per-failure-domain pass
//! - `failure_domains`: creating, listing and pruning failure domain children
//! - `credentials`: scoping CloudStack clients to a failure domain's account
//! - `steps`: the ordered steps a cluster pass is made of
//!
//! `Reconciler` is shared by all watchers and lives as long as the controller.
//! `ReconciliationRunner` holds the state of a single pass over one cluster.

pub mod cluster;
pub mod credentials;
pub mod failure_domain;
pub mod failure_domains;
pub mod steps;

#[cfg(test)]
mod failure_domain_test;
#[cfg(test)]
mod failure_domains_test;

use crate::backoff::FibonacciBackoff;
use crate::config::ControllerConfig;
use crate::store::ObjectStore;
use credentials::{CloudClientExtension, ClientFactory};
use crds::{CloudStackCluster, CloudStackFailureDomain};
use kube::ResourceExt;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{info_span, warn, Span};

/// Backoff state for a resource
#[derive(Debug, Clone)]
struct BackoffState {
    backoff: FibonacciBackoff,
    error_count: u32,
}

impl BackoffState {
    fn new(min_minutes: u64, max_minutes: u64) -> Self {
        Self {
            backoff: FibonacciBackoff::new(min_minutes, max_minutes),
            error_count: 0,
        }
    }

    fn increment_error(&mut self) {
        self.error_count += 1;
    }

    fn reset(&mut self) {
        self.error_count = 0;
        self.backoff.reset();
    }
}

/// Reconciles CloudStack clusters and their failure domains.
pub struct Reconciler {
    pub(crate) store: Arc<dyn ObjectStore>,
    pub(crate) client_factory: Arc<dyn ClientFactory>,
    pub(crate) config: Arc<ControllerConfig>,
    /// Error count tracking per resource (kind/namespace/name -> BackoffState)
    backoff_states: Arc<Mutex<HashMap<String, BackoffState>>>,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    /// Creates a new reconciler instance.
    pub fn new(store: Arc<dyn ObjectStore>, client_factory: Arc<dyn ClientFactory>, config: ControllerConfig) -> Self {
        Self {
            store,
            client_factory,
            config: Arc::new(config),
            backoff_states: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Get the Fibonacci backoff for a resource and advance it.
    ///
    /// Returns (backoff, error_count)
    pub fn get_backoff_for_resource(&self, resource_key: &str) -> (std::time::Duration, u32) {
        match self.backoff_states.lock() {
            Ok(mut states) => {
                let state = states
                    .entry(resource_key.to_string())
                    .or_insert_with(|| BackoffState::new(self.config.backoff_min_minutes, self.config.backoff_max_minutes));
                (state.backoff.next_backoff(), state.error_count)
            }
            Err(e) => {
                warn!("Failed to lock backoff_states: {}, using default backoff", e);
                (std::time::Duration::from_secs(60), 0)
            }
        }
    }

    /// Record a failed reconcile of a resource
    pub fn increment_error(&self, resource_key: &str) {
        if let Ok(mut states) = self.backoff_states.lock() {
            states
                .entry(resource_key.to_string())
                .or_insert_with(|| BackoffState::new(self.config.backoff_min_minutes, self.config.backoff_max_minutes))
                .increment_error();
        }
    }

    /// Reset the backoff of a resource after a successful reconcile
    pub fn reset_error(&self, resource_key: &str) {
        if let Ok(mut states) = self.backoff_states.lock() {
            if let Some(state) = states.get_mut(resource_key) {
                state.reset();
            }
        }
    }

    /// Start a reconciliation pass over a cluster
    pub(crate) fn runner(&self, cluster: &CloudStackCluster) -> ReconciliationRunner {
        ReconciliationRunner::new(self.store.clone(), self.config.clone(), cluster)
    }
}

/// Working state of one reconciliation pass over a `CloudStackCluster`.
///
/// Nothing here outlives the pass. Status changes accumulate on `cluster` and are
/// written back once at the end.
pub struct ReconciliationRunner {
    pub(crate) store: Arc<dyn ObjectStore>,
    pub(crate) config: Arc<ControllerConfig>,
    pub(crate) namespace: String,
    pub(crate) name: String,
    pub(crate) cluster: CloudStackCluster,
    /// Failure domains found by the last listing step
    pub(crate) failure_domains: Vec<CloudStackFailureDomain>,
    /// Request-scoped logging context
    pub(crate) span: Span,
}

impl std::fmt::Debug for ReconciliationRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconciliationRunner")
            .field("namespace", &self.namespace)
            .field("name", &self.name)
            .field("failure_domains", &self.failure_domains.len())
            .finish_non_exhaustive()
    }
}

impl ReconciliationRunner {
    pub fn new(store: Arc<dyn ObjectStore>, config: Arc<ControllerConfig>, cluster: &CloudStackCluster) -> Self {
        let namespace = cluster.namespace().unwrap_or_default();
        let name = cluster.name_any();
        let span = info_span!(
            "reconcile",
            namespace = %namespace,
            name = %name,
            cluster = %cluster.capi_cluster_name()
        );
        Self {
            store,
            config,
            namespace,
            name,
            cluster: cluster.clone(),
            failure_domains: Vec::new(),
            span,
        }
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Attach CloudStack client state to this pass.
    pub fn register_extension(&mut self, factory: Arc<dyn ClientFactory>) -> CloudClientExtension<'_> {
        CloudClientExtension::new(self, factory)
    }
}
