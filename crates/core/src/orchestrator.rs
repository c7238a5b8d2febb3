//! Synchronization run orchestration
//!
//! Sequences one full run: probe connectivity, execute the transfer
//! steps (each individually retry-guarded), clean up staging artifacts,
//! and report per-step outcomes.
//!
//! Step isolation: a failing transfer step is logged and marked FAILED,
//! but the run continues to the remaining steps. The two exceptions are
//! connectivity exhaustion and a failed test-connection, which are fatal
//! because every later step depends on a working session. Cleanup runs
//! regardless of step outcomes.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};

use terrasync_common::{run_with_retry, RetryPolicy};
use terrasync_domain::constants::{DATA_FILE_EXTENSIONS, MANIFEST_FILENAME, MANIFEST_SOURCE};
use terrasync_domain::{
    Config, PropertyRecord, RemoteEntry, RemoteEntryKind, StepReport, SyncError, SyncManifest,
    SyncResult, SyncStep, SyncSummary,
};

use crate::connectivity::wait_until_reachable;
use crate::export::export_records;
use crate::ports::{Connectivity, PropertyStore, TransferClient};
use crate::RecordCodec;

/// File name of the staged snapshot pushed by the upload step.
const SNAPSHOT_NAME: &str = "properties_snapshot.csv";

/// Phases of one orchestration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    ProbingConnectivity,
    Transferring,
    Cleanup,
    Done,
    Failed,
}

/// Drives one synchronization run over the port interfaces.
///
/// Owns no remote session itself; each transfer operation acquires and
/// releases its own. Independent orchestrators may run concurrently.
pub struct SyncOrchestrator {
    probe: Arc<dyn Connectivity>,
    client: Arc<dyn TransferClient>,
    store: Arc<dyn PropertyStore>,
    config: Config,
    phase: RunPhase,
}

impl SyncOrchestrator {
    pub fn new(
        probe: Arc<dyn Connectivity>,
        client: Arc<dyn TransferClient>,
        store: Arc<dyn PropertyStore>,
        config: Config,
    ) -> Self {
        Self { probe, client, store, config, phase: RunPhase::Idle }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Execute one full synchronization run.
    pub async fn run(&mut self) -> SyncSummary {
        let policy =
            RetryPolicy::new(self.config.retry.max_attempts, self.config.retry.base_delay());
        let data_dir = PathBuf::from(&self.config.paths.data_dir);
        let staging_dir = data_dir.join("staging");

        let mut steps: Vec<StepReport> = Vec::new();

        self.phase = RunPhase::ProbingConnectivity;
        if let Err(err) = wait_until_reachable(
            self.probe.as_ref(),
            self.config.probe.max_attempts,
            self.config.probe.interval(),
        )
        .await
        {
            error!(%err, "connectivity could not be established, aborting run");
            self.phase = RunPhase::Failed;
            return SyncSummary { steps, export: None, fatal: Some(err.to_string()) };
        }

        self.phase = RunPhase::Transferring;

        // Step 1: test-connection. Fatal on failure; everything after
        // this depends on a working session.
        match run_with_retry("test-connection", &policy, || self.client.test_connection()).await {
            Ok(_) => steps.push(StepReport::passed(SyncStep::TestConnection, None)),
            Err(err) => {
                steps.push(StepReport::failed(SyncStep::TestConnection, err.to_string()));
                return self.abort_fatal(steps, &staging_dir, err.to_string()).await;
            }
        }

        let records = self.fetch_records().await;

        // Step 2: list the remote data directory.
        let remote_dir = self.config.paths.remote_data_dir.clone();
        let listing: Option<Vec<RemoteEntry>> =
            match run_with_retry("list", &policy, || self.client.list_files(&remote_dir)).await {
                Ok(entries) => {
                    steps.push(StepReport::passed(
                        SyncStep::ListRemote,
                        Some(format!("{} entr(ies)", entries.len())),
                    ));
                    Some(entries)
                }
                Err(err) => {
                    steps.push(StepReport::failed(SyncStep::ListRemote, err.to_string()));
                    if err.source_ref().is_fatal() {
                        return self.abort_fatal(steps, &staging_dir, err.to_string()).await;
                    }
                    warn!(%err, "list step failed");
                    None
                }
            };

        // Step 3: upload the staged local snapshot.
        match self.upload_step(&policy, records.as_deref(), &staging_dir).await {
            Ok(report) => steps.push(report),
            Err(fatal) => {
                steps.push(StepReport::failed(SyncStep::Upload, fatal.to_string()));
                return self.abort_fatal(steps, &staging_dir, fatal.to_string()).await;
            }
        }

        // Step 4: download remote data files.
        let downloaded = match self.download_step(&policy, listing.as_deref(), &data_dir).await {
            Ok((report, downloaded)) => {
                steps.push(report);
                downloaded
            }
            Err(fatal) => {
                steps.push(StepReport::failed(SyncStep::Download, fatal.to_string()));
                return self.abort_fatal(steps, &staging_dir, fatal.to_string()).await;
            }
        };

        // Step 5: export all records.
        let export = match &records {
            Some(records) => {
                match export_records(
                    self.client.as_ref(),
                    &self.config.paths.remote_export_path,
                    records,
                    &staging_dir,
                    &policy,
                )
                .await
                {
                    Ok(export) => export,
                    Err(fatal) => {
                        steps.push(StepReport::failed(SyncStep::Export, fatal.to_string()));
                        return self.abort_fatal(steps, &staging_dir, fatal.to_string()).await;
                    }
                }
            }
            None => SyncResult::failed("no records available from the property store"),
        };
        let export_report = if export.success {
            StepReport::passed(SyncStep::Export, Some(export.to_string()))
        } else {
            StepReport::failed(
                SyncStep::Export,
                export.error_message.clone().unwrap_or_else(|| "unknown error".to_string()),
            )
        };
        steps.push(export_report);

        self.cleanup(&staging_dir).await;

        let summary = SyncSummary { steps, export: Some(export), fatal: None };
        for step in &summary.steps {
            info!(
                step = %step.step,
                outcome = if step.passed { "PASSED" } else { "FAILED" },
                detail = step.detail.as_deref().unwrap_or(""),
                "step outcome"
            );
        }

        if summary.all_passed() {
            self.write_manifest(&data_dir, downloaded).await;
        }

        self.phase = RunPhase::Done;
        summary
    }

    /// Records are fetched once per run; if the store is unavailable the
    /// failure is reported against the steps that needed them.
    async fn fetch_records(&self) -> Option<Vec<PropertyRecord>> {
        match self.store.get_all_properties().await {
            Ok(records) => Some(records),
            Err(err) => {
                warn!(%err, "property store unavailable");
                None
            }
        }
    }

    /// `Err` carries a fatal failure that must abort the run; per-step
    /// failures come back as a failed report.
    async fn upload_step(
        &self,
        policy: &RetryPolicy,
        records: Option<&[PropertyRecord]>,
        staging_dir: &Path,
    ) -> std::result::Result<StepReport, SyncError> {
        let records = match records {
            Some(records) => records,
            None => {
                return Ok(StepReport::failed(
                    SyncStep::Upload,
                    "no records available from the property store",
                ))
            }
        };

        let payload = match RecordCodec::new().encode(records) {
            Ok(payload) => payload,
            Err(err) => return Ok(StepReport::failed(SyncStep::Upload, err.to_string())),
        };
        let local_path = staging_dir.join(SNAPSHOT_NAME);
        if let Err(err) = tokio::fs::create_dir_all(staging_dir).await {
            return Ok(StepReport::failed(SyncStep::Upload, err.to_string()));
        }
        if let Err(err) = tokio::fs::write(&local_path, payload.as_bytes()).await {
            return Ok(StepReport::failed(SyncStep::Upload, err.to_string()));
        }

        let remote_path = remote_join(&self.config.paths.remote_data_dir, SNAPSHOT_NAME);
        match run_with_retry("upload", policy, || {
            self.client.upload_file(&local_path, &remote_path)
        })
        .await
        {
            Ok(()) => Ok(StepReport::passed(
                SyncStep::Upload,
                Some(format!("{} record(s) to {remote_path}", records.len())),
            )),
            Err(err) if err.source_ref().is_fatal() => Err(err.into_source()),
            Err(err) => {
                warn!(%err, "upload step failed");
                Ok(StepReport::failed(SyncStep::Upload, err.to_string()))
            }
        }
    }

    async fn download_step(
        &self,
        policy: &RetryPolicy,
        listing: Option<&[RemoteEntry]>,
        data_dir: &Path,
    ) -> std::result::Result<(StepReport, Vec<String>), SyncError> {
        // The download step reuses the list step's snapshot; if listing
        // failed it performs its own retried query so one failed step
        // does not starve this one.
        let entries: Vec<RemoteEntry> = match listing {
            Some(entries) => entries.to_vec(),
            None => {
                let remote_dir = self.config.paths.remote_data_dir.clone();
                match run_with_retry("download-list", policy, || {
                    self.client.list_files(&remote_dir)
                })
                .await
                {
                    Ok(entries) => entries,
                    Err(err) if err.source_ref().is_fatal() => return Err(err.into_source()),
                    Err(err) => {
                        return Ok((
                            StepReport::failed(SyncStep::Download, err.to_string()),
                            Vec::new(),
                        ))
                    }
                }
            }
        };

        let wanted: Vec<String> = entries
            .iter()
            .filter(|e| e.kind == RemoteEntryKind::File && is_data_file(&e.name))
            .map(|e| e.name.clone())
            .collect();

        if wanted.is_empty() {
            return Ok((
                StepReport::passed(SyncStep::Download, Some("no data files to fetch".to_string())),
                Vec::new(),
            ));
        }

        let remote_dir = self.config.paths.remote_data_dir.clone();
        let result = run_with_retry("download", policy, || {
            let wanted = wanted.clone();
            let remote_dir = remote_dir.clone();
            async move {
                let mut fetched = Vec::with_capacity(wanted.len());
                for name in &wanted {
                    let remote_path = remote_join(&remote_dir, name);
                    let local_path = data_dir.join(name);
                    self.client.download_file(&remote_path, &local_path).await?;
                    fetched.push(name.clone());
                }
                Ok::<_, SyncError>(fetched)
            }
        })
        .await;

        match result {
            Ok(fetched) => {
                let report = StepReport::passed(
                    SyncStep::Download,
                    Some(format!("{} file(s)", fetched.len())),
                );
                Ok((report, fetched))
            }
            Err(err) if err.source_ref().is_fatal() => Err(err.into_source()),
            Err(err) => {
                warn!(%err, "download step failed");
                Ok((StepReport::failed(SyncStep::Download, err.to_string()), Vec::new()))
            }
        }
    }

    /// Terminate the run on a fatal failure. Cleanup still runs; no
    /// further steps do.
    async fn abort_fatal(
        &mut self,
        steps: Vec<StepReport>,
        staging_dir: &Path,
        fatal: String,
    ) -> SyncSummary {
        error!(reason = %fatal, "fatal failure, aborting run");
        self.cleanup(staging_dir).await;
        self.phase = RunPhase::Failed;
        SyncSummary { steps, export: None, fatal: Some(fatal) }
    }

    /// Remove locally staged artifacts. Always runs, even after failed
    /// steps; a cleanup failure is logged but never fails the run.
    async fn cleanup(&mut self, staging_dir: &Path) {
        self.phase = RunPhase::Cleanup;
        match tokio::fs::remove_dir_all(staging_dir).await {
            Ok(()) => info!(dir = %staging_dir.display(), "staging directory removed"),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => warn!(%err, "could not remove staging directory"),
        }
    }

    async fn write_manifest(&self, data_dir: &Path, mut files: Vec<String>) {
        files.push(self.config.paths.remote_export_path.clone());
        let manifest = SyncManifest {
            source: MANIFEST_SOURCE.to_string(),
            source_url: self.config.ftp.host.clone(),
            download_date: Utc::now(),
            files,
        };
        let path = data_dir.join(MANIFEST_FILENAME);
        let payload = match serde_json::to_vec_pretty(&manifest) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(%err, "could not serialize sync manifest");
                return;
            }
        };
        match tokio::fs::write(&path, payload).await {
            Ok(()) => info!(path = %path.display(), "sync manifest written"),
            Err(err) => warn!(%err, "could not write sync manifest"),
        }
    }
}

/// Whether a remote name looks like a property data file: no leading
/// dot, has an extension, and the extension is one we ingest.
fn is_data_file(name: &str) -> bool {
    if name.starts_with('.') {
        return false;
    }
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            DATA_FILE_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e))
        }
        _ => false,
    }
}

fn remote_join(dir: &str, name: &str) -> String {
    let trimmed = dir.trim_end_matches('/');
    if trimmed.is_empty() {
        format!("/{name}")
    } else {
        format!("{trimmed}/{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_file_filter_matches_fetcher_rules() {
        assert!(is_data_file("parcels.csv"));
        assert!(is_data_file("assessments.JSON"));
        assert!(is_data_file("levy.xml"));
        assert!(!is_data_file(".hidden"));
        assert!(!is_data_file("README"));
        assert!(!is_data_file("archive.zip"));
    }

    #[test]
    fn remote_join_normalizes_separators() {
        assert_eq!(remote_join("/", "a.csv"), "/a.csv");
        assert_eq!(remote_join("/data/", "a.csv"), "/data/a.csv");
        assert_eq!(remote_join("/data", "a.csv"), "/data/a.csv");
    }
}
