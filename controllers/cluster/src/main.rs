//! CloudStack Cluster Controller
//!
//! Converges the CloudStack infrastructure of Cluster API clusters:
//! - CloudStackCluster: zone networks, control plane public IP, egress firewall rule
//!   and API server load balancer rule
//! - CloudStackFailureDomain: per-zone credentials and account scoping
//!
//! Everything the controller creates in CloudStack is tagged with the owning cluster
//! and released when the last owning cluster goes away.

mod backoff;
mod classify;
mod cloud;
mod config;
mod controller;
mod error;
mod reconciler;
mod store;
mod watcher;

#[cfg(test)]
mod test_utils;

use crate::config::ControllerConfig;
use crate::error::ControllerError;
use controller::Controller;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting CloudStack Cluster Controller");

    let config = ControllerConfig::from_env()?;

    info!("Configuration:");
    info!("  Namespace: {}", config.watch_namespace.as_deref().unwrap_or("all namespaces"));
    info!("  Isolated network offering: {}", config.cloud.isolated_network_offering);
    info!("  Default API port: {}", config.cloud.default_api_port);
    info!(
        "  Client config map: {}/{}",
        config.client_config_map_namespace, config.client_config_map_name
    );

    let controller = Controller::new(config).await?;
    controller.run().await?;

    Ok(())
}
