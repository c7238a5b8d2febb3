//! In-memory test doubles for the port interfaces
//!
//! These satisfy the same contracts as the infra adapters so orchestrator
//! and pipeline behavior can be exercised hermetically, including scripted
//! transient failures and credential rejection.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use terrasync_domain::{
    PropertyRecord, RemoteEntry, RemoteEntryKind, Result, SyncError,
};

use crate::ports::{Connectivity, PropertyStore, TransferClient};

/// Probe double that answers from a fixed script.
pub struct StaticProbe {
    reachable: bool,
    calls: AtomicU32,
}

impl StaticProbe {
    pub fn reachable() -> Self {
        Self { reachable: true, calls: AtomicU32::new(0) }
    }

    pub fn unreachable() -> Self {
        Self { reachable: false, calls: AtomicU32::new(0) }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connectivity for StaticProbe {
    async fn is_reachable(&self) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reachable
    }
}

/// Transfer endpoint double backed by an in-memory file map.
///
/// Failure injection is one-shot and counted: `fail_next_*` schedules the
/// next N calls of that operation to fail with a transient
/// `SyncError::Transfer` before the double resumes normal service.
#[derive(Default)]
pub struct InMemoryTransferClient {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
    dirs: Mutex<BTreeSet<String>>,
    reject_credentials: Mutex<bool>,
    reject_transfer_credentials: Mutex<bool>,
    failing_tests: AtomicU32,
    failing_lists: AtomicU32,
    failing_uploads: AtomicU32,
    failing_downloads: AtomicU32,
}

impl InMemoryTransferClient {
    pub fn new() -> Self {
        let client = Self::default();
        client.dirs.lock().insert("/".to_string());
        client
    }

    /// Seed a remote file (and its parent directory).
    pub fn insert_remote_file(&self, path: &str, contents: impl Into<Vec<u8>>) {
        self.dirs.lock().insert(parent_dir(path));
        self.files.lock().insert(path.to_string(), contents.into());
    }

    pub fn remote_file(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().get(path).cloned()
    }

    pub fn reject_credentials(&self) {
        *self.reject_credentials.lock() = true;
    }

    /// Reject credentials on transfer operations only, modelling an
    /// account that loses access mid-run while test-connection already
    /// passed.
    pub fn reject_credentials_on_transfer(&self) {
        *self.reject_transfer_credentials.lock() = true;
    }

    fn transfer_auth_rejected(&self) -> Option<SyncError> {
        self.reject_transfer_credentials
            .lock()
            .then(|| SyncError::Auth("530 login incorrect".to_string()))
    }

    pub fn fail_next_tests(&self, n: u32) {
        self.failing_tests.store(n, Ordering::SeqCst);
    }

    pub fn fail_next_lists(&self, n: u32) {
        self.failing_lists.store(n, Ordering::SeqCst);
    }

    pub fn fail_next_uploads(&self, n: u32) {
        self.failing_uploads.store(n, Ordering::SeqCst);
    }

    pub fn fail_next_downloads(&self, n: u32) {
        self.failing_downloads.store(n, Ordering::SeqCst);
    }

    fn take_failure(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl TransferClient for InMemoryTransferClient {
    async fn test_connection(&self) -> Result<bool> {
        if *self.reject_credentials.lock() {
            return Err(SyncError::Auth("530 login incorrect".to_string()));
        }
        if Self::take_failure(&self.failing_tests) {
            return Err(SyncError::Transfer("simulated connection failure".to_string()));
        }
        Ok(true)
    }

    async fn list_files(&self, remote_path: &str) -> Result<Vec<RemoteEntry>> {
        if let Some(err) = self.transfer_auth_rejected() {
            return Err(err);
        }
        if Self::take_failure(&self.failing_lists) {
            return Err(SyncError::RemoteList("simulated listing failure".to_string()));
        }
        let dir = normalize_dir(remote_path);
        if !self.dirs.lock().contains(&dir) {
            return Err(SyncError::RemoteList(format!("no such directory: {remote_path}")));
        }

        let files = self.files.lock();
        let mut entries = Vec::new();
        for (path, contents) in files.iter() {
            if parent_dir(path) == dir {
                entries.push(RemoteEntry {
                    name: file_name(path).to_string(),
                    kind: RemoteEntryKind::File,
                    size_bytes: contents.len() as u64,
                });
            }
        }
        for sub in self.dirs.lock().iter() {
            if sub != &dir && parent_dir(sub) == dir {
                entries.push(RemoteEntry {
                    name: file_name(sub).to_string(),
                    kind: RemoteEntryKind::Directory,
                    size_bytes: 0,
                });
            }
        }
        Ok(entries)
    }

    async fn upload_file(&self, local_path: &Path, remote_path: &str) -> Result<()> {
        if let Some(err) = self.transfer_auth_rejected() {
            return Err(err);
        }
        if Self::take_failure(&self.failing_uploads) {
            return Err(SyncError::Transfer("simulated upload failure".to_string()));
        }
        let bytes = tokio::fs::read(local_path)
            .await
            .map_err(|e| SyncError::Transfer(format!("cannot read {}: {e}", local_path.display())))?;
        self.insert_remote_file(remote_path, bytes);
        Ok(())
    }

    async fn download_file(&self, remote_path: &str, local_path: &Path) -> Result<()> {
        if let Some(err) = self.transfer_auth_rejected() {
            return Err(err);
        }
        if Self::take_failure(&self.failing_downloads) {
            // A real client stages through a temp file, so an interrupted
            // transfer never touches the destination. Mirror that here.
            return Err(SyncError::Transfer("simulated download failure".to_string()));
        }
        let bytes = self
            .files
            .lock()
            .get(remote_path)
            .cloned()
            .ok_or_else(|| SyncError::Transfer(format!("no such remote file: {remote_path}")))?;
        if let Some(parent) = local_path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(SyncError::from)?;
        }
        tokio::fs::write(local_path, bytes).await.map_err(SyncError::from)?;
        Ok(())
    }
}

/// Record source double over a fixed record set.
#[derive(Default)]
pub struct InMemoryPropertyStore {
    records: Vec<PropertyRecord>,
    failing: bool,
}

impl InMemoryPropertyStore {
    pub fn new(records: Vec<PropertyRecord>) -> Self {
        Self { records, failing: false }
    }

    pub fn failing() -> Self {
        Self { records: Vec::new(), failing: true }
    }
}

#[async_trait]
impl PropertyStore for InMemoryPropertyStore {
    async fn get_all_properties(&self) -> Result<Vec<PropertyRecord>> {
        if self.failing {
            return Err(SyncError::Storage("simulated storage failure".to_string()));
        }
        Ok(self.records.clone())
    }

    async fn get_property(&self, property_id: &str) -> Result<Option<PropertyRecord>> {
        if self.failing {
            return Err(SyncError::Storage("simulated storage failure".to_string()));
        }
        Ok(self.records.iter().find(|r| r.property_id == property_id).cloned())
    }
}

fn normalize_dir(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

fn parent_dir(path: &str) -> String {
    match path.trim_end_matches('/').rsplit_once('/') {
        Some(("", _)) | None => "/".to_string(),
        Some((parent, _)) => parent.to_string(),
    }
}

fn file_name(path: &str) -> &str {
    path.trim_end_matches('/').rsplit('/').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn listing_reflects_seeded_files() {
        let client = InMemoryTransferClient::new();
        client.insert_remote_file("/data/a.csv", b"x".to_vec());
        client.insert_remote_file("/data/b.json", b"yy".to_vec());

        let entries = client.list_files("/data").await.unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.kind == RemoteEntryKind::File));
        assert!(entries.iter().any(|e| e.name == "a.csv" && e.size_bytes == 1));
    }

    #[tokio::test]
    async fn listing_unknown_directory_fails() {
        let client = InMemoryTransferClient::new();
        assert!(matches!(
            client.list_files("/missing").await,
            Err(SyncError::RemoteList(_))
        ));
    }

    #[tokio::test]
    async fn scheduled_failures_are_one_shot() {
        let client = InMemoryTransferClient::new();
        client.fail_next_tests(1);
        assert!(client.test_connection().await.is_err());
        assert!(client.test_connection().await.unwrap());
    }
}
