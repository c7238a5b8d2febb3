//! Record export pipeline
//!
//! Composes the codec with the transfer client: encode all records,
//! stage the payload locally, upload to the remote export path. Raw
//! transfer errors never escape; short of a fatal credential rejection
//! the caller always receives a fully populated [`SyncResult`],
//! isolating the orchestrator from protocol-level detail.

use std::path::Path;

use tracing::{info, warn};

use terrasync_common::{run_with_retry, RetryPolicy};
use terrasync_domain::{PropertyRecord, SyncError, SyncResult};

use crate::codec::RecordCodec;
use crate::ports::TransferClient;

/// File name of the staged export payload inside the staging directory.
pub const EXPORT_STAGING_NAME: &str = "properties_export.csv";

/// Export `records` to `remote_path` on the transfer endpoint.
///
/// Encoding failures surface immediately (retrying reproduces the same
/// bad input); the upload itself is retried under `policy`. Fatal
/// failures (rejected credentials) escape as `Err` so the caller can
/// abort the whole run; everything else folds into the `SyncResult`.
pub async fn export_records(
    client: &dyn TransferClient,
    remote_path: &str,
    records: &[PropertyRecord],
    staging_dir: &Path,
    policy: &RetryPolicy,
) -> Result<SyncResult, SyncError> {
    let payload = match RecordCodec::new().encode(records) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(%err, "refusing to export records that violate the flat-file contract");
            return Ok(SyncResult::failed(err.to_string()));
        }
    };

    let local_path = staging_dir.join(EXPORT_STAGING_NAME);
    if let Err(err) = tokio::fs::create_dir_all(staging_dir).await {
        return Ok(SyncResult::failed(format!("cannot create staging directory: {err}")));
    }
    if let Err(err) = tokio::fs::write(&local_path, payload.as_bytes()).await {
        return Ok(SyncResult::failed(format!("cannot stage export payload: {err}")));
    }

    match run_with_retry("export-upload", policy, || {
        client.upload_file(&local_path, remote_path)
    })
    .await
    {
        Ok(()) => {
            info!(records = records.len(), remote_path, "export uploaded");
            Ok(SyncResult::ok(records.len(), remote_path))
        }
        Err(err) if err.source_ref().is_fatal() => Err(err.into_source()),
        Err(err) => Ok(SyncResult::failed(err.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use terrasync_domain::{PropertyRecord, PropertyStatus, PropertyType, SyncError};

    use super::*;
    use crate::testing::InMemoryTransferClient;

    fn record() -> PropertyRecord {
        PropertyRecord {
            property_id: "BC001".to_string(),
            address: "123 Test St".to_string(),
            parcel_number: "12345-123-123".to_string(),
            property_type: PropertyType::Residential,
            status: PropertyStatus::Active,
            acres: 0.25,
            value: Some(150_000.0),
        }
    }

    fn policy() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_secs(5))
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_transfer_failures_fold_into_the_result() {
        let client = InMemoryTransferClient::new();
        client.fail_next_uploads(99);
        let staging = tempfile::tempdir().unwrap();

        let result = export_records(&client, "/export.csv", &[record()], staging.path(), &policy())
            .await
            .unwrap();

        assert!(!result.success);
        assert!(result.error_message.unwrap().contains("exhausted"));
    }

    #[tokio::test(start_paused = true)]
    async fn credential_rejection_escapes_instead_of_folding() {
        let client = InMemoryTransferClient::new();
        client.reject_credentials_on_transfer();
        let staging = tempfile::tempdir().unwrap();

        let err = export_records(&client, "/export.csv", &[record()], staging.path(), &policy())
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::Auth(_)));
    }
}
