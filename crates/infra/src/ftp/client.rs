//! FTP transfer client
//!
//! Implements the [`TransferClient`] port over a blocking `suppaftp`
//! session driven from `spawn_blocking`. One logical session per
//! operation: connect, authenticate, perform the operation, quit.
//! Sessions are never pooled and the client carries no retry logic;
//! retries are applied at the orchestration layer.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use suppaftp::list::File as ListEntry;
use suppaftp::types::FileType;
use suppaftp::{FtpError, FtpStream, Mode, Status};
use tracing::{debug, warn};

use terrasync_core::ports::TransferClient;
use terrasync_domain::{FtpConfig, RemoteEntry, RemoteEntryKind, Result, SyncError};

use crate::fsutil::write_atomic;

/// Transfer client over one FTP endpoint.
#[derive(Debug, Clone)]
pub struct FtpTransferClient {
    config: FtpConfig,
}

impl FtpTransferClient {
    pub fn new(config: FtpConfig) -> Self {
        Self { config }
    }

    /// Open and authenticate a fresh control connection.
    fn connect(config: &FtpConfig) -> Result<FtpStream> {
        let mut ftp = FtpStream::connect((config.host.as_str(), config.port))
            .map_err(|e| map_protocol_err("connect", &e))?;
        ftp.login(&config.username, &config.password).map_err(|e| map_login_err(&e))?;
        if config.passive {
            ftp.set_mode(Mode::Passive);
        } else {
            ftp.set_mode(Mode::Active);
        }
        ftp.transfer_type(FileType::Binary).map_err(|e| map_protocol_err("transfer-type", &e))?;
        Ok(ftp)
    }

    /// Run `op` inside one session, closing the control connection on
    /// every exit path.
    async fn with_session<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut FtpStream) -> Result<T> + Send + 'static,
    {
        let config = self.config.clone();
        tokio::task::spawn_blocking(move || {
            let mut ftp = Self::connect(&config)?;
            let result = op(&mut ftp);
            if let Err(err) = ftp.quit() {
                debug!(%err, "ftp quit failed, dropping connection");
            }
            result
        })
        .await
        .map_err(|e| SyncError::Transfer(format!("transfer worker failed: {e}")))?
    }
}

#[async_trait]
impl TransferClient for FtpTransferClient {
    async fn test_connection(&self) -> Result<bool> {
        // Authenticate and immediately close; health check only.
        self.with_session(|_ftp| Ok(true)).await
    }

    async fn list_files(&self, remote_path: &str) -> Result<Vec<RemoteEntry>> {
        let path = remote_path.to_string();
        self.with_session(move |ftp| {
            ftp.cwd(&path)
                .map_err(|e| SyncError::RemoteList(format!("cannot enter {path}: {e}")))?;
            let lines = ftp
                .list(None)
                .map_err(|e| SyncError::RemoteList(format!("cannot list {path}: {e}")))?;

            let mut entries = Vec::with_capacity(lines.len());
            for line in &lines {
                match line.parse::<ListEntry>() {
                    Ok(file) => entries.push(RemoteEntry {
                        name: file.name().to_string(),
                        kind: if file.is_directory() {
                            RemoteEntryKind::Directory
                        } else {
                            RemoteEntryKind::File
                        },
                        size_bytes: file.size() as u64,
                    }),
                    Err(err) => {
                        // Servers emit the occasional non-standard line;
                        // skip it rather than failing the snapshot.
                        warn!(%line, %err, "unparseable list line skipped");
                    }
                }
            }
            Ok(entries)
        })
        .await
    }

    async fn upload_file(&self, local_path: &Path, remote_path: &str) -> Result<()> {
        let local: PathBuf = local_path.to_path_buf();
        let remote = remote_path.to_string();
        self.with_session(move |ftp| {
            let mut reader = std::fs::File::open(&local)
                .map_err(|e| SyncError::Transfer(format!("cannot open {}: {e}", local.display())))?;
            let bytes = ftp
                .put_file(&remote, &mut reader)
                .map_err(|e| map_protocol_err("upload", &e))?;
            debug!(%remote, bytes, "upload complete");
            Ok(())
        })
        .await
    }

    async fn download_file(&self, remote_path: &str, local_path: &Path) -> Result<()> {
        let local: PathBuf = local_path.to_path_buf();
        let remote = remote_path.to_string();
        self.with_session(move |ftp| {
            let buffer = ftp
                .retr_as_buffer(&remote)
                .map_err(|e| map_protocol_err("download", &e))?;
            // Full payload in hand; stage-and-rename so the destination
            // never holds a partial file.
            let bytes = write_atomic(&local, buffer)?;
            debug!(%remote, bytes, "download complete");
            Ok(())
        })
        .await
    }
}

/// Map a login failure: permanent credential rejections are
/// authentication errors (never retried), everything else is a transient
/// transfer failure.
fn map_login_err(err: &FtpError) -> SyncError {
    match err {
        FtpError::UnexpectedResponse(response) if is_credential_rejection(response.status) => {
            SyncError::Auth(format!("login rejected: {err}"))
        }
        _ => map_protocol_err("login", err),
    }
}

/// 530-class replies mean the credentials themselves were refused.
fn is_credential_rejection(status: Status) -> bool {
    matches!(status, Status::NotLoggedIn)
}

fn map_protocol_err(operation: &str, err: &FtpError) -> SyncError {
    SyncError::Transfer(format!("{operation}: {err}"))
}
