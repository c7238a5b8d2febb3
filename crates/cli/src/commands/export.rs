//! Export-only pipeline

use std::path::Path;
use std::process::ExitCode;

use terrasync_common::RetryPolicy;
use terrasync_core::export_records;
use terrasync_core::ports::PropertyStore;
use terrasync_domain::Config;
use terrasync_infra::{FtpTransferClient, JsonPropertyStore};

/// Export all records (or a single one) to the remote endpoint.
pub async fn run(
    config: Config,
    records_path: &Path,
    property_id: Option<&str>,
    remote_path: Option<String>,
) -> ExitCode {
    let store = JsonPropertyStore::new(records_path);
    let records = match property_id {
        Some(id) => match store.get_property(id).await {
            Ok(Some(record)) => vec![record],
            Ok(None) => {
                eprintln!("no record with propertyId {id:?}");
                return ExitCode::FAILURE;
            }
            Err(err) => {
                eprintln!("storage error: {err}");
                return ExitCode::FAILURE;
            }
        },
        None => match store.get_all_properties().await {
            Ok(records) => records,
            Err(err) => {
                eprintln!("storage error: {err}");
                return ExitCode::FAILURE;
            }
        },
    };

    let client = FtpTransferClient::new(config.ftp.clone());
    let policy = RetryPolicy::new(config.retry.max_attempts, config.retry.base_delay());
    let remote_path = remote_path.unwrap_or_else(|| config.paths.remote_export_path.clone());
    let staging_dir = Path::new(&config.paths.data_dir).join("staging");

    let result = export_records(&client, &remote_path, &records, &staging_dir, &policy).await;

    // Staging artifacts are scoped to this invocation.
    if let Err(err) = tokio::fs::remove_dir_all(&staging_dir).await {
        if err.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(%err, "could not remove staging directory");
        }
    }

    match result {
        Ok(result) => {
            println!("{result}");
            if result.success {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(fatal) => {
            eprintln!("export aborted: {fatal}");
            ExitCode::FAILURE
        }
    }
}
