//! Account domain resolution.

use super::CloudOps;
use crate::error::ControllerError;
use crds::CloudStackCluster;
use tracing::debug;

/// Domain used when an account is given without one
pub const ROOT_DOMAIN: &str = "ROOT";

impl CloudOps {
    /// Record the id of the cluster's account domain in status.
    ///
    /// Only needed when the cluster is scoped to an account. A domain id already in
    /// status is kept as is.
    pub async fn resolve_domain(&self, cluster: &mut CloudStackCluster) -> Result<(), ControllerError> {
        if cluster.spec.account.is_empty() || !cluster.domain_id().is_empty() {
            return Ok(());
        }

        let domain = match cluster.spec.domain.as_str() {
            "" => ROOT_DOMAIN.to_string(),
            domain => domain.to_string(),
        };
        let (domain_id, count) = self
            .client
            .get_domain_id(&domain)
            .await
            .map_err(|e| ControllerError::context(format!("Could not resolve domain {}", domain), e))?;
        if count != 1 {
            return Err(ControllerError::Ambiguous {
                kind: "Domain".to_string(),
                key: format!("name {}", domain),
                count,
            });
        }

        debug!("Resolved domain {} to {}", domain, domain_id);
        cluster.status_mut().domain_id = domain_id;
        Ok(())
    }
}
