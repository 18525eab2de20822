//! Controller-specific error types.
//!
//! This module defines error types specific to the CloudStack cluster controller
//! that are not covered by upstream library errors.

use cloudstack_client::CloudStackError;
use kube::Error as KubeError;
use thiserror::Error;

/// Errors that can occur in the CloudStack cluster controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] KubeError),

    /// CloudStack API error
    #[error("CloudStack error: {0}")]
    CloudStack(#[from] CloudStackError),

    /// Declarative store error that did not come from the Kubernetes client
    #[error("Store error: {0}")]
    Store(String),

    /// A lookup that must match exactly one object matched some other number
    #[error("Expected 1 {kind} with {key}, but got {count}")]
    Ambiguous {
        kind: String,
        key: String,
        count: usize,
    },

    /// A lookup matched nothing
    #[error("No match found for {0}")]
    NoMatch(String),

    /// No load balancer rule on the public IP serves the control plane port
    #[error("no load balancer rule found for public IP {public_ip_id} and port {port}")]
    NoLoadBalancerRule { public_ip_id: String, port: i32 },

    /// Public IP resolution failed
    #[error("Public IP error: {0}")]
    PublicIp(String),

    /// Failure domain credentials could not be fetched, parsed, or scoped
    #[error("Credentials error: {0}")]
    Credentials(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Resource watch failed
    #[error("Resource watch failed: {0}")]
    Watch(String),

    /// An error wrapped with the operation that produced it
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<ControllerError>,
    },

    /// Several independent failures reported together
    #[error("{}", join_errors(.0))]
    Multiple(Vec<ControllerError>),
}

impl ControllerError {
    /// Wrap an error with a description of the failed operation
    pub fn context(context: impl Into<String>, source: impl Into<ControllerError>) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(source.into()),
        }
    }

    /// Combine accumulated errors; a single error is returned as is.
    pub fn aggregate(mut errors: Vec<ControllerError>) -> Option<Self> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(Self::Multiple(errors)),
        }
    }
}

fn join_errors(errors: &[ControllerError]) -> String {
    let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
    format!("{} errors occurred: {}", errors.len(), messages.join("; "))
}
