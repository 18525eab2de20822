//! Reconcile steps.
//!
//! A cluster pass is a list of `Step` values run in order by `run_steps`. A step
//! either lets the pass continue or asks for a requeue; an error or a requeue ends
//! the pass.

use super::credentials::CloudClientExtension;
use crate::cloud::network::{network_exists, uses_isolated_network};
use crate::error::ControllerError;
use crds::CloudStackFailureDomainSpec;
use std::time::Duration;
use tracing::debug;

/// One unit of work in a cluster pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    CreateFailureDomains,
    GetFailureDomainsAndRequeueIfMissing,
    RemoveExtraneousFailureDomains,
    /// Use this failure domain's credentials for the remaining steps
    AsFailureDomainUser(CloudStackFailureDomainSpec),
    ResolveDomain,
    ResolveNetworkStatuses,
    CreateIsolatedNetworkIfMissing,
    AssociatePublicIp,
    OpenFirewallRules,
    GetOrCreateLoadBalancerRule,
}

impl Step {
    /// Steps that only apply to clusters on an isolated network
    fn isolated_only(&self) -> bool {
        matches!(
            self,
            Step::CreateIsolatedNetworkIfMissing
                | Step::AssociatePublicIp
                | Step::OpenFirewallRules
                | Step::GetOrCreateLoadBalancerRule
        )
    }
}

/// Outcome of a step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepResult {
    Continue,
    /// Stop the pass and try again later; not an error
    Requeue { after: Duration, reason: String },
}

impl CloudClientExtension<'_> {
    /// Run a single step
    pub async fn run_step(&mut self, step: &Step) -> Result<StepResult, ControllerError> {
        if step.isolated_only() && !uses_isolated_network(&self.runner.cluster) {
            debug!(parent: &self.runner.span, "Skipping {:?}, cluster does not use an isolated network", step);
            return Ok(StepResult::Continue);
        }

        match step {
            Step::CreateFailureDomains => self.runner.create_failure_domains().await?,
            Step::GetFailureDomainsAndRequeueIfMissing => {
                return self.runner.get_failure_domains_and_requeue_if_missing().await;
            }
            Step::RemoveExtraneousFailureDomains => {
                self.runner.remove_extraneous_failure_domains().await?;
            }
            Step::AsFailureDomainUser(spec) => self.as_failure_domain_user(spec).await?,
            Step::ResolveDomain => {
                let cloud = self.endpoint_cloud()?;
                cloud.resolve_domain(&mut self.runner.cluster).await?;
            }
            Step::ResolveNetworkStatuses => {
                let cloud = self.cloud()?;
                cloud.resolve_network_statuses(&mut self.runner.cluster).await?;
            }
            Step::CreateIsolatedNetworkIfMissing => {
                let exists = self
                    .runner
                    .cluster
                    .first_zone_network()
                    .is_some_and(network_exists);
                if !exists {
                    let cloud = self.cloud()?;
                    cloud.create_isolated_network(&mut self.runner.cluster).await?;
                }
            }
            Step::AssociatePublicIp => {
                let cloud = self.cloud()?;
                cloud.associate_public_ip_address(&mut self.runner.cluster).await?;
            }
            Step::OpenFirewallRules => {
                let cloud = self.cloud()?;
                cloud.open_firewall_rules(&self.runner.cluster).await?;
            }
            Step::GetOrCreateLoadBalancerRule => {
                let cloud = self.cloud()?;
                cloud.get_or_create_load_balancer_rule(&mut self.runner.cluster).await?;
            }
        }
        Ok(StepResult::Continue)
    }

    /// Run steps in order until one requeues or fails.
    pub async fn run_steps(&mut self, steps: &[Step]) -> Result<StepResult, ControllerError> {
        for step in steps {
            debug!(parent: &self.runner.span, "Running step {:?}", step);
            if let requeue @ StepResult::Requeue { .. } = self.run_step(step).await? {
                return Ok(requeue);
            }
        }
        Ok(StepResult::Continue)
    }
}
