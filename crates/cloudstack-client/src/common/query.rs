//! Query utilities for CloudStack list responses

use crate::error::CloudStackError;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Extract the list stored under `key` in an unwrapped list response.
///
/// CloudStack omits the key entirely when the result set is empty.
pub fn list_items<T: DeserializeOwned>(response: &Value, key: &str) -> Result<Vec<T>, CloudStackError> {
    match response.get(key) {
        Some(items) => Ok(serde_json::from_value(items.clone())?),
        None => Ok(Vec::new()),
    }
}

/// Extract a single object stored under `key`
pub fn single_item<T: DeserializeOwned>(response: &Value, key: &str) -> Result<T, CloudStackError> {
    let item = response.get(key).ok_or_else(|| {
        CloudStackError::InvalidRequest(format!("response has no '{}' object: {}", key, response))
    })?;
    Ok(serde_json::from_value(item.clone())?)
}

/// By-name lookup over a listing: `(id, count)`.
///
/// Zero results is a "No match found" error. With several results the exact-name
/// match is returned alongside the full count so callers can reject ambiguity.
pub fn pick_by_name<T>(
    kind: &str,
    name: &str,
    items: &[T],
    name_of: impl Fn(&T) -> &str,
    id_of: impl Fn(&T) -> &str,
) -> Result<(String, usize), CloudStackError> {
    match items {
        [] => Err(CloudStackError::no_match(kind, name)),
        [only] => Ok((id_of(only).to_string(), 1)),
        many => many
            .iter()
            .find(|item| name_of(item) == name)
            .map(|item| (id_of(item).to_string(), many.len()))
            .ok_or_else(|| {
                CloudStackError::NotFound(format!(
                    "Could not find an exact match for {} {} among {} results",
                    kind,
                    name,
                    many.len()
                ))
            }),
    }
}
