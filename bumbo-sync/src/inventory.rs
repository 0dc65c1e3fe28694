//! Remote inventory query: last-modified instants keyed by bare file name.

use std::collections::HashMap;

use chrono::DateTime;

use bumbo_core::{Component, MetadataTypeName};

use crate::remote::{Org, RemoteFileProperties};
use crate::SyncError;

/// Bare file name (`Foo.cls`, `card`) → remote last-modified epoch millis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteLastModified(HashMap<String, i64>);

impl RemoteLastModified {
    /// Build from a listing. The first occurrence of a file name wins.
    pub fn from_listing(listing: &[RemoteFileProperties]) -> Self {
        let mut map = HashMap::new();
        for entry in listing {
            let key = entry
                .file_name
                .rsplit('/')
                .next()
                .unwrap_or(entry.file_name.as_str());
            if map.contains_key(key) {
                continue;
            }
            match DateTime::parse_from_rfc3339(&entry.last_modified_date) {
                Ok(instant) => {
                    map.insert(key.to_string(), instant.timestamp_millis());
                }
                Err(e) => tracing::warn!(
                    "ignoring {}: bad lastModifiedDate '{}': {e}",
                    entry.file_name,
                    entry.last_modified_date
                ),
            }
        }
        Self(map)
    }

    pub fn get(&self, file_name: &str) -> Option<i64> {
        self.0.get(file_name).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Distinct metadata types of `components`, in first-seen order.
pub fn requested_types(components: &[Component]) -> Vec<MetadataTypeName> {
    let mut types: Vec<MetadataTypeName> = Vec::new();
    for component in components {
        if !types.contains(&component.type_name) {
            types.push(component.type_name.clone());
        }
    }
    types
}

/// Fetch remote last-modified instants for every type in `types` in one call.
pub fn fetch_last_modified(
    org: &dyn Org,
    types: &[MetadataTypeName],
    api_version: &str,
) -> Result<RemoteLastModified, SyncError> {
    if types.is_empty() {
        return Ok(RemoteLastModified::default());
    }
    let listing = org
        .list_metadata(types, api_version)
        .map_err(|e| SyncError::RemoteQuery(e.to_string()))?;
    let remote = RemoteLastModified::from_listing(&listing);
    tracing::info!(
        "listed {} remote component(s) across {} type(s)",
        remote.len(),
        types.len()
    );
    Ok(remote)
}
