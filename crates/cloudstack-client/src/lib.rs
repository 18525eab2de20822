//! CloudStack API Client
//!
//! A Rust client library for the parts of the Apache CloudStack API used to converge
//! cluster infrastructure: networks, network offerings, public IP addresses, egress
//! firewall rules, load balancer rules, resource tags, and account/domain scoping.
//!
//! # Example
//!
//! ```no_run
//! use cloudstack_client::{ClientConfig, CloudStackClient, CloudStackClientTrait, ListPublicIpAddressesParams, Scope};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::new("https://cloud.example.com/client/api", "api-key", "secret-key");
//! let client = CloudStackClient::new(config)?;
//!
//! // Look up a network id by name
//! let (network_id, count) = client.get_network_id("k8s-net").await?;
//!
//! // List free public addresses visible to an account
//! let params = ListPublicIpAddressesParams {
//!     scope: Scope::new("admin", ""),
//!     ..Default::default()
//! };
//! let addresses = client.list_public_ip_addresses(params).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Resource families**: Network, NetworkOffering, Address, Firewall, LoadBalancer, Tags
//! - **Scoping**: account/domain fields are only sent when non-empty
//! - **Async jobs**: asynchronous commands are awaited via `queryAsyncJobResult`
//! - **Mocking**: `MockCloudStackClient` behind the `test-util` feature

pub mod client;
pub mod common;
pub mod config;
pub mod error;
pub mod models;
pub mod params;
#[path = "trait.rs"]
pub mod cloudstack_trait;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use client::CloudStackClient;
pub use common::ApiTransport;
pub use config::ClientConfig;
pub use error::CloudStackError;
pub use models::*;
pub use params::*;
pub use cloudstack_trait::CloudStackClientTrait;
#[cfg(any(test, feature = "test-util"))]
pub use mock::{MockCloudStackClient, MockOperation};
