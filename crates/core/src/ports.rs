//! Port interfaces for synchronization operations
//!
//! The orchestrator depends only on these traits. The real adapters live
//! in `terrasync-infra`; in-memory doubles satisfying the same contracts
//! live in [`crate::testing`].

use std::path::Path;

use async_trait::async_trait;
use terrasync_domain::{PropertyRecord, RemoteEntry, Result};

/// Reachability check against the target host.
///
/// A probe is a lightweight handshake used only to test connectivity,
/// never to perform work. Implementations must not error: any failure to
/// complete the handshake within the window reads as unreachable.
#[async_trait]
pub trait Connectivity: Send + Sync {
    async fn is_reachable(&self) -> bool;
}

/// The four primitive remote operations over one logical transfer
/// session. Each call opens, authenticates and closes its own session;
/// sessions are never pooled and the client is retry-agnostic (retries
/// are applied at the orchestration layer).
#[async_trait]
pub trait TransferClient: Send + Sync {
    /// Authenticate and immediately close; health check only.
    async fn test_connection(&self) -> Result<bool>;

    /// Snapshot of one remote directory. Fails with
    /// [`SyncError::RemoteList`](terrasync_domain::SyncError::RemoteList)
    /// if the path does not exist.
    async fn list_files(&self, remote_path: &str) -> Result<Vec<RemoteEntry>>;

    /// Upload a local file, overwriting any existing remote file at the
    /// same path. A failed upload leaves remote state undefined and must
    /// be retried from scratch.
    async fn upload_file(&self, local_path: &Path, remote_path: &str) -> Result<()>;

    /// Download to `local_path`, staging through a temporary file so the
    /// destination never holds a partial file after a failed attempt.
    async fn download_file(&self, remote_path: &str, local_path: &Path) -> Result<()>;
}

/// Record source collaborator. The core consumes records; it never
/// defines storage itself.
#[async_trait]
pub trait PropertyStore: Send + Sync {
    async fn get_all_properties(&self) -> Result<Vec<PropertyRecord>>;

    async fn get_property(&self, property_id: &str) -> Result<Option<PropertyRecord>>;
}
