//! Error classification
//!
//! CloudStack and the Kubernetes API report several benign outcomes only through
//! error text. All substring rules live here; anything unrecognised is fatal.

use crate::error::ControllerError;

/// Outcome class of a failed operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorClass {
    /// The desired object is already there; treat as success
    AlreadyExists,
    /// The object does not exist yet; the caller may create it
    NotFound,
    /// Anything else
    Fatal,
}

const ALREADY_EXISTS_MARKERS: &[&str] = &["already exists", "there is already"];
const NOT_FOUND_MARKERS: &[&str] = &["no match found"];

/// Classify raw error text (case-insensitive).
pub fn classify_text(text: &str) -> ErrorClass {
    let text = text.to_lowercase();
    if ALREADY_EXISTS_MARKERS.iter().any(|m| text.contains(m)) {
        ErrorClass::AlreadyExists
    } else if NOT_FOUND_MARKERS.iter().any(|m| text.contains(m)) {
        ErrorClass::NotFound
    } else {
        ErrorClass::Fatal
    }
}

/// Classify a controller error.
///
/// Typed sentinels are classified without looking at text. Aggregated errors take
/// the most severe class of their parts.
pub fn classify(err: &ControllerError) -> ErrorClass {
    match err {
        ControllerError::NoLoadBalancerRule { .. } | ControllerError::NoMatch(_) => ErrorClass::NotFound,
        ControllerError::Ambiguous { .. } => ErrorClass::Fatal,
        ControllerError::Context { source, .. } => classify(source),
        ControllerError::Multiple(errors) => errors
            .iter()
            .map(classify)
            .max()
            .unwrap_or(ErrorClass::Fatal),
        other => classify_text(&other.to_string()),
    }
}

pub fn is_already_exists(err: &ControllerError) -> bool {
    classify(err) == ErrorClass::AlreadyExists
}

pub fn is_not_found(err: &ControllerError) -> bool {
    classify(err) == ErrorClass::NotFound
}
