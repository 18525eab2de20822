//! Tag operations for MockCloudStackClient

use super::{MockCloudStackClient, MockOperation};
use crate::error::CloudStackError;
use crate::models::*;
use std::collections::BTreeMap;

impl MockCloudStackClient {
    /// Replace the tags of a resource (for test setup)
    pub fn set_tags(&self, resource_type: ResourceType, resource_id: &str, tags: BTreeMap<String, String>) {
        self.tags
            .lock()
            .unwrap()
            .insert((resource_type, resource_id.to_string()), tags);
    }

    pub fn tags_of(&self, resource_type: ResourceType, resource_id: &str) -> BTreeMap<String, String> {
        self.tags
            .lock()
            .unwrap()
            .get(&(resource_type, resource_id.to_string()))
            .cloned()
            .unwrap_or_default()
    }
}

pub async fn get_tags(client: &MockCloudStackClient, resource_type: ResourceType, resource_id: &str) -> Result<BTreeMap<String, String>, CloudStackError> {
    client.record(MockOperation::GetTags)?;
    Ok(client.tags_of(resource_type, resource_id))
}

pub async fn add_tags(client: &MockCloudStackClient, resource_type: ResourceType, resource_id: &str, tags: &BTreeMap<String, String>) -> Result<(), CloudStackError> {
    client.record(MockOperation::AddTags)?;
    let mut store = client.tags.lock().unwrap();
    let existing = store.entry((resource_type, resource_id.to_string())).or_default();
    if let Some(key) = tags.keys().find(|k| existing.contains_key(*k)) {
        return Err(CloudStackError::api(
            431,
            format!("tag {} already exists on {} {}", key, resource_type, resource_id),
        ));
    }
    existing.extend(tags.iter().map(|(k, v)| (k.clone(), v.clone())));
    Ok(())
}

pub async fn delete_tags(client: &MockCloudStackClient, resource_type: ResourceType, resource_id: &str, tags: &BTreeMap<String, String>) -> Result<(), CloudStackError> {
    client.record(MockOperation::DeleteTags)?;
    if let Some(existing) = client
        .tags
        .lock()
        .unwrap()
        .get_mut(&(resource_type, resource_id.to_string()))
    {
        for key in tags.keys() {
            existing.remove(key);
        }
    }
    Ok(())
}
