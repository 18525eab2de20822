//! CloudStackFailureDomain reconciliation.
//!
//! Checks that a failure domain's credentials work and records its zone network.

use super::credentials::scope_credentials;
use super::Reconciler;
use crate::classify::is_not_found;
use crate::cloud::CloudOps;
use crate::error::ControllerError;
use crds::{CloudStackFailureDomain, CloudStackFailureDomainStatus};
use kube::ResourceExt;
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};

impl Reconciler {
    /// Reconcile a CloudStackFailureDomain.
    pub async fn reconcile_failure_domain(&self, failure_domain: &CloudStackFailureDomain) -> Result<(), ControllerError> {
        let namespace = failure_domain.namespace().unwrap_or_default();
        let name = failure_domain.name_any();
        let span = info_span!(
            "reconcile_failure_domain",
            namespace = %namespace,
            name = %name,
            failure_domain = %failure_domain.spec.name
        );

        async {
            if failure_domain.metadata.deletion_timestamp.is_some() {
                debug!("Failure domain is being deleted, nothing to do");
                return Ok(());
            }

            let spec = &failure_domain.spec;
            let clients = match scope_credentials(
                self.store.as_ref(),
                self.client_factory.as_ref(),
                &self.config,
                &namespace,
                spec,
            )
            .await
            {
                Ok(clients) => clients,
                Err(e) => return self.fail_failure_domain(&namespace, &name, e).await,
            };

            let cloud = CloudOps::new(clients.user, Arc::new(self.config.cloud.clone()));
            let mut network = spec.zone.network.clone();
            let network = match cloud.resolve_network(&mut network).await {
                Ok(()) => Some(network),
                Err(e) if is_not_found(&e) => {
                    debug!("Zone network {} does not exist yet", spec.zone.network.name);
                    None
                }
                Err(e) => return self.fail_failure_domain(&namespace, &name, e).await,
            };

            let status = CloudStackFailureDomainStatus {
                ready: true,
                network,
                error: None,
            };
            self.store
                .patch_failure_domain_status(&namespace, &name, &status)
                .await?;
            info!("Failure domain is ready");
            Ok(())
        }
        .instrument(span)
        .await
    }

    /// Record `err` on the failure domain's status and return it.
    async fn fail_failure_domain(&self, namespace: &str, name: &str, err: ControllerError) -> Result<(), ControllerError> {
        warn!("Failure domain is not ready: {}", err);
        let status = CloudStackFailureDomainStatus {
            ready: false,
            network: None,
            error: Some(err.to_string()),
        };
        if let Err(e) = self.store.patch_failure_domain_status(namespace, name, &status).await {
            warn!("Failed to update CloudStackFailureDomain status: {}", e);
        }
        Err(err)
    }
}
