//! CloudStackCluster reconciliation.
//!
//! A pass creates and prunes the cluster's failure domains, then acts as the first
//! failure domain's user to converge networks, the public IP, the firewall rule and
//! the load balancer rule. Status is written back once per pass, also when a step fails,
//! so progress made before the failure is not lost.
//!
//! Deletion releases what this cluster owns: its ownership tags are removed, and
//! networks and public IPs the controller created are destroyed once no cluster
//! references them.

use super::steps::{Step, StepResult};
use super::{Reconciler, ReconciliationRunner};
use crate::error::ControllerError;
use cloudstack_client::ResourceType;
use crds::{CloudStackCluster, CloudStackFailureDomainSpec};
use tracing::{info, warn, Instrument};

/// Finalizer holding a cluster until its CloudStack resources are released
pub const CLUSTER_FINALIZER: &str = "cloudstackcluster.infrastructure.cluster.x-k8s.io";

/// Steps of a cluster pass, in order
pub fn cluster_steps(cluster: &CloudStackCluster) -> Vec<Step> {
    let mut steps = vec![
        Step::CreateFailureDomains,
        Step::GetFailureDomainsAndRequeueIfMissing,
        Step::RemoveExtraneousFailureDomains,
    ];
    if let Some(primary) = primary_failure_domain(cluster) {
        steps.push(Step::AsFailureDomainUser(primary.clone()));
        steps.extend([
            Step::ResolveDomain,
            Step::ResolveNetworkStatuses,
            Step::CreateIsolatedNetworkIfMissing,
            Step::AssociatePublicIp,
            Step::OpenFirewallRules,
            Step::GetOrCreateLoadBalancerRule,
        ]);
    }
    steps
}

/// Failure domain whose credentials manage the cluster's shared resources
fn primary_failure_domain(cluster: &CloudStackCluster) -> Option<&CloudStackFailureDomainSpec> {
    cluster.spec.failure_domains.first()
}

impl Reconciler {
    /// Reconcile a CloudStackCluster.
    pub async fn reconcile_cluster(&self, cluster: &CloudStackCluster) -> Result<StepResult, ControllerError> {
        let mut runner = self.runner(cluster);
        let span = runner.span().clone();

        async move {
            if cluster.metadata.deletion_timestamp.is_some() {
                self.reconcile_delete(&mut runner).await?;
                return Ok(StepResult::Continue);
            }

            self.ensure_finalizer(&runner).await?;

            let steps = cluster_steps(cluster);
            let result = runner
                .register_extension(self.client_factory.clone())
                .run_steps(&steps)
                .await;

            if let Ok(StepResult::Continue) = result {
                runner.cluster.status_mut().ready = true;
            }
            self.persist_status(&runner, result.is_ok()).await?;

            match &result {
                Ok(StepResult::Continue) => info!("CloudStackCluster infrastructure is ready"),
                Ok(StepResult::Requeue { after, reason }) => info!("{} (retry in {:?})", reason, after),
                Err(e) => warn!("Reconciliation failed: {}", e),
            }
            result
        }
        .instrument(span)
        .await
    }

    /// Write the status accumulated by a pass. A failed write only fails the pass if
    /// the pass itself succeeded, so the original error is the one reported.
    async fn persist_status(&self, runner: &ReconciliationRunner, pass_succeeded: bool) -> Result<(), ControllerError> {
        let Some(status) = runner.cluster.status.as_ref() else {
            return Ok(());
        };
        match self
            .store
            .patch_cluster_status(&runner.namespace, &runner.name, status)
            .await
        {
            Ok(()) => Ok(()),
            Err(e) if pass_succeeded => Err(ControllerError::context("failed to update CloudStackCluster status", e)),
            Err(e) => {
                warn!("Failed to update CloudStackCluster status: {}", e);
                Ok(())
            }
        }
    }

    async fn ensure_finalizer(&self, runner: &ReconciliationRunner) -> Result<(), ControllerError> {
        let mut finalizers = runner.cluster.metadata.finalizers.clone().unwrap_or_default();
        if finalizers.iter().any(|f| f == CLUSTER_FINALIZER) {
            return Ok(());
        }
        info!("Adding finalizer {}", CLUSTER_FINALIZER);
        finalizers.push(CLUSTER_FINALIZER.to_string());
        self.store
            .patch_cluster_finalizers(&runner.namespace, &runner.name, &finalizers)
            .await
    }

    async fn remove_finalizer(&self, runner: &ReconciliationRunner) -> Result<(), ControllerError> {
        let finalizers = runner.cluster.metadata.finalizers.clone().unwrap_or_default();
        if !finalizers.iter().any(|f| f == CLUSTER_FINALIZER) {
            return Ok(());
        }
        let remaining: Vec<String> = finalizers.into_iter().filter(|f| f != CLUSTER_FINALIZER).collect();
        self.store
            .patch_cluster_finalizers(&runner.namespace, &runner.name, &remaining)
            .await?;
        info!("Removed finalizer {}", CLUSTER_FINALIZER);
        Ok(())
    }

    /// Release the cluster's CloudStack resources and let the object go.
    async fn reconcile_delete(&self, runner: &mut ReconciliationRunner) -> Result<(), ControllerError> {
        let Some(primary) = primary_failure_domain(&runner.cluster).cloned() else {
            warn!("CloudStackCluster has no failure domains, nothing to release in CloudStack");
            return self.remove_finalizer(runner).await;
        };

        {
            let mut extension = runner.register_extension(self.client_factory.clone());
            extension.as_failure_domain_user(&primary).await?;
            let cloud = extension.cloud()?;
            let cluster = &extension.runner().cluster;

            if let Some(status) = cluster.status.as_ref() {
                if !status.public_ip_id.is_empty() {
                    cloud
                        .remove_cluster_tag(ResourceType::PublicIpAddress, &status.public_ip_id, cluster)
                        .await?;
                    cloud.disassociate_public_ip_if_not_in_use(&status.public_ip_id).await?;
                }
                for zone in status.zones.values() {
                    if zone.network.id.is_empty() {
                        continue;
                    }
                    cloud.remove_cluster_tag_from_network(cluster, &zone.network).await?;
                    cloud.delete_network_if_not_in_use(&zone.network).await?;
                }
            }
        }

        self.remove_finalizer(runner).await
    }

    /// Put control plane instances behind the cluster's load balancer rule.
    ///
    /// Returns how many instances were newly assigned.
    pub async fn assign_control_plane_instances(
        &self,
        cluster: &CloudStackCluster,
        instance_ids: &[String],
    ) -> Result<usize, ControllerError> {
        let primary = primary_failure_domain(cluster).cloned().ok_or_else(|| {
            ControllerError::InvalidConfig("CloudStackCluster has no failure domains".to_string())
        })?;

        let mut runner = self.runner(cluster);
        let span = runner.span().clone();
        async move {
            let mut extension = runner.register_extension(self.client_factory.clone());
            extension.as_failure_domain_user(&primary).await?;
            let cloud = extension.cloud()?;

            let mut assigned = 0;
            for instance_id in instance_ids {
                if cloud.assign_vm_to_load_balancer_rule(cluster, instance_id).await? {
                    assigned += 1;
                }
            }
            Ok(assigned)
        }
        .instrument(span)
        .await
    }
}
