//! Full synchronization run

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use terrasync_core::SyncOrchestrator;
use terrasync_domain::Config;
use terrasync_infra::{FtpTransferClient, JsonPropertyStore, TcpProbe};

/// Run one full synchronization and print per-step outcomes.
pub async fn run(config: Config, records_path: &Path) -> ExitCode {
    let probe = Arc::new(TcpProbe::from_config(config.ftp.host.clone(), &config.probe));
    let client = Arc::new(FtpTransferClient::new(config.ftp.clone()));
    let store = Arc::new(JsonPropertyStore::new(records_path));

    let mut orchestrator = SyncOrchestrator::new(probe, client, store, config);
    let summary = orchestrator.run().await;

    for step in &summary.steps {
        match (&step.passed, step.detail.as_deref()) {
            (true, Some(detail)) => println!("{}: PASSED ({detail})", step.step),
            (true, None) => println!("{}: PASSED", step.step),
            (false, detail) => {
                println!("{}: FAILED ({})", step.step, detail.unwrap_or("unknown error"));
            }
        }
    }
    if let Some(export) = &summary.export {
        println!("{export}");
    }

    if let Some(fatal) = &summary.fatal {
        println!("run aborted: {fatal}");
        // Connectivity never came up: no step was even attempted.
        if summary.steps.is_empty() {
            return ExitCode::from(2);
        }
        return ExitCode::from(1);
    }

    if summary.any_step_failed() {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}
