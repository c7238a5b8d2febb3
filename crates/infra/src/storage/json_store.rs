//! JSON-file property store
//!
//! Satisfies the [`PropertyStore`] port from a local JSON array of
//! property records. The core treats storage as an abstract
//! collaborator; this adapter is what the CLI runs against.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use terrasync_core::ports::PropertyStore;
use terrasync_domain::{PropertyRecord, Result, SyncError};

/// Property records backed by one JSON file.
#[derive(Debug, Clone)]
pub struct JsonPropertyStore {
    path: PathBuf,
}

impl JsonPropertyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Vec<PropertyRecord>> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            SyncError::Storage(format!("cannot read {}: {e}", self.path.display()))
        })?;
        let records: Vec<PropertyRecord> = serde_json::from_slice(&bytes).map_err(|e| {
            SyncError::Storage(format!("invalid record file {}: {e}", self.path.display()))
        })?;
        debug!(path = %self.path.display(), count = records.len(), "records loaded");
        Ok(records)
    }
}

#[async_trait]
impl PropertyStore for JsonPropertyStore {
    async fn get_all_properties(&self) -> Result<Vec<PropertyRecord>> {
        self.load().await
    }

    async fn get_property(&self, property_id: &str) -> Result<Option<PropertyRecord>> {
        let records = self.load().await?;
        Ok(records.into_iter().find(|r| r.property_id == property_id))
    }
}
