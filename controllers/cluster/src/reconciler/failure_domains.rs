//! Failure domain children of a cluster.
//!
//! Each failure domain in the cluster spec becomes a `CloudStackFailureDomain` object
//! named by hashing the failure domain name with the cluster name, labelled with the
//! cluster name and owned by the `CloudStackCluster`.

use super::steps::StepResult;
use super::ReconciliationRunner;
use crate::classify::is_already_exists;
use crate::error::ControllerError;
use crds::{
    failure_domain_hashed_meta_name, CloudStackFailureDomain, CloudStackFailureDomainSpec, CLUSTER_NAME_LABEL,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::Resource;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

impl ReconciliationRunner {
    /// Label selecting this cluster's failure domains
    fn cluster_labels(&self) -> BTreeMap<String, String> {
        BTreeMap::from([(CLUSTER_NAME_LABEL.to_string(), self.cluster.capi_cluster_name())])
    }

    /// Object name of a failure domain of this cluster
    pub fn failure_domain_object_name(&self, fd_name: &str) -> String {
        failure_domain_hashed_meta_name(fd_name, &self.cluster.capi_cluster_name())
    }

    fn child_object_meta(&self, fd_name: &str) -> ObjectMeta {
        ObjectMeta {
            name: Some(self.failure_domain_object_name(fd_name)),
            namespace: Some(self.namespace.clone()),
            labels: Some(self.cluster_labels()),
            owner_references: self.cluster.controller_owner_ref(&()).map(|owner| vec![owner]),
            ..Default::default()
        }
    }

    /// Create the failure domain object for `spec`; an existing one counts as success.
    pub async fn create_failure_domain(&self, spec: &CloudStackFailureDomainSpec) -> Result<(), ControllerError> {
        let failure_domain = CloudStackFailureDomain {
            metadata: self.child_object_meta(&spec.name),
            spec: spec.clone(),
            status: None,
        };

        match self.store.create_failure_domain(&failure_domain).await {
            Ok(()) => {
                info!(parent: &self.span, "Created failure domain {}", spec.name);
                Ok(())
            }
            Err(e) if is_already_exists(&e) => {
                debug!(parent: &self.span, "Failure domain {} already exists", spec.name);
                Ok(())
            }
            Err(e) => Err(ControllerError::context(
                format!("failed to create failure domain {}", spec.name),
                e,
            )),
        }
    }

    /// Create an object for every failure domain in the cluster spec, stopping at the first failure.
    pub async fn create_failure_domains(&self) -> Result<(), ControllerError> {
        for spec in &self.cluster.spec.failure_domains {
            self.create_failure_domain(spec).await?;
        }
        Ok(())
    }

    /// List this cluster's failure domain objects into `failure_domains`.
    pub async fn get_failure_domains(&mut self) -> Result<(), ControllerError> {
        self.failure_domains = self
            .store
            .list_failure_domains(&self.namespace, &self.cluster_labels())
            .await
            .map_err(|e| ControllerError::context("failed to list failure domains", e))?;
        Ok(())
    }

    /// List failure domains, asking to come back later if none exist yet.
    pub async fn get_failure_domains_and_requeue_if_missing(&mut self) -> Result<StepResult, ControllerError> {
        self.get_failure_domains().await?;
        if self.failure_domains.is_empty() {
            return Ok(StepResult::Requeue {
                after: self.config.requeue_delay,
                reason: "no failure domains found, requeueing".to_string(),
            });
        }
        Ok(StepResult::Continue)
    }

    /// Fetch one of this cluster's failure domains by its unhashed name.
    pub async fn get_failure_domain_by_name(&self, fd_name: &str) -> Result<CloudStackFailureDomain, ControllerError> {
        self.store
            .get_failure_domain(&self.namespace, &self.failure_domain_object_name(fd_name))
            .await
            .map_err(|e| ControllerError::context(format!("failed to get failure domain with name {}", fd_name), e))
    }

    /// Delete listed failure domains that are no longer in the cluster spec.
    ///
    /// Returns how many were deleted.
    pub async fn remove_extraneous_failure_domains(&mut self) -> Result<usize, ControllerError> {
        let wanted: BTreeSet<&str> = self
            .cluster
            .spec
            .failure_domains
            .iter()
            .map(|fd| fd.name.as_str())
            .collect();

        let mut removed = Vec::new();
        for failure_domain in &self.failure_domains {
            if wanted.contains(failure_domain.spec.name.as_str()) {
                continue;
            }
            let name = failure_domain.metadata.name.clone().unwrap_or_default();
            info!(parent: &self.span, "Deleting extraneous failure domain: {}", failure_domain.spec.name);
            self.store
                .delete_failure_domain(&self.namespace, &name)
                .await
                .map_err(|e| {
                    ControllerError::context(
                        format!("failed to delete failure domain {}", failure_domain.spec.name),
                        e,
                    )
                })?;
            removed.push(name);
        }

        let count = removed.len();
        self.failure_domains
            .retain(|fd| !removed.iter().any(|name| fd.metadata.name.as_deref() == Some(name.as_str())));
        Ok(count)
    }
}
