//! Core domain types for property-assessment record exchange

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One property-assessment record.
///
/// `property_id` is the stable join key for comparing local and remote
/// record sets; it is required and non-empty across sync cycles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyRecord {
    pub property_id: String,
    pub address: String,
    pub parcel_number: String,
    pub property_type: PropertyType,
    pub status: PropertyStatus,
    pub acres: f64,
    pub value: Option<f64>,
}

impl PropertyRecord {
    /// Validate the record invariants that the rest of the pipeline
    /// relies on.
    pub fn validate(&self) -> crate::errors::Result<()> {
        if self.property_id.trim().is_empty() {
            return Err(crate::errors::SyncError::Encoding(
                "propertyId must be non-empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Assessment classification of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Residential,
    Commercial,
    Agricultural,
    Industrial,
    Other,
}

impl PropertyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::Residential => "residential",
            PropertyType::Commercial => "commercial",
            PropertyType::Agricultural => "agricultural",
            PropertyType::Industrial => "industrial",
            PropertyType::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "residential" => Some(PropertyType::Residential),
            "commercial" => Some(PropertyType::Commercial),
            "agricultural" => Some(PropertyType::Agricultural),
            "industrial" => Some(PropertyType::Industrial),
            "other" => Some(PropertyType::Other),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a property record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyStatus {
    Active,
    Pending,
    Sold,
    Inactive,
}

impl PropertyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyStatus::Active => "active",
            PropertyStatus::Pending => "pending",
            PropertyStatus::Sold => "sold",
            PropertyStatus::Inactive => "inactive",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(PropertyStatus::Active),
            "pending" => Some(PropertyStatus::Pending),
            "sold" => Some(PropertyStatus::Sold),
            "inactive" => Some(PropertyStatus::Inactive),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry from a remote directory listing.
///
/// Produced only by the list operation; a read-only snapshot of a single
/// directory query, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEntry {
    pub name: String,
    pub kind: RemoteEntryKind,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteEntryKind {
    File,
    Directory,
}

/// Terminal value of the export pipeline.
///
/// Never partially populated: construct through [`SyncResult::ok`] or
/// [`SyncResult::failed`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncResult {
    pub success: bool,
    pub record_count: usize,
    pub filename: Option<String>,
    pub error_message: Option<String>,
}

impl SyncResult {
    /// Successful export of `record_count` records to `filename`.
    pub fn ok(record_count: usize, filename: impl Into<String>) -> Self {
        Self {
            success: true,
            record_count,
            filename: Some(filename.into()),
            error_message: None,
        }
    }

    /// Failed export; count and filename stay at defaults.
    pub fn failed(error_message: impl Into<String>) -> Self {
        Self {
            success: false,
            record_count: 0,
            filename: None,
            error_message: Some(error_message.into()),
        }
    }
}

impl fmt::Display for SyncResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.success {
            write!(
                f,
                "exported {} record(s) to {}",
                self.record_count,
                self.filename.as_deref().unwrap_or("?")
            )
        } else {
            write!(
                f,
                "export failed: {}",
                self.error_message.as_deref().unwrap_or("unknown error")
            )
        }
    }
}

/// The named steps of one synchronization run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncStep {
    TestConnection,
    ListRemote,
    Upload,
    Download,
    Export,
}

impl SyncStep {
    pub fn label(&self) -> &'static str {
        match self {
            SyncStep::TestConnection => "test-connection",
            SyncStep::ListRemote => "list",
            SyncStep::Upload => "upload",
            SyncStep::Download => "download",
            SyncStep::Export => "export",
        }
    }
}

impl fmt::Display for SyncStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Pass/fail outcome of one orchestration step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    pub step: SyncStep,
    pub passed: bool,
    pub detail: Option<String>,
}

impl StepReport {
    pub fn passed(step: SyncStep, detail: Option<String>) -> Self {
        Self { step, passed: true, detail }
    }

    pub fn failed(step: SyncStep, reason: impl Into<String>) -> Self {
        Self { step, passed: false, detail: Some(reason.into()) }
    }
}

/// Aggregate outcome of one full synchronization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncSummary {
    pub steps: Vec<StepReport>,
    pub export: Option<SyncResult>,
    /// Set when the run was aborted by a fatal failure (connectivity or
    /// authentication); per-step failures do not populate this.
    pub fatal: Option<String>,
}

impl SyncSummary {
    /// True when the run completed with every step passing.
    pub fn all_passed(&self) -> bool {
        self.fatal.is_none() && self.steps.iter().all(|s| s.passed)
    }

    /// True when any step after test-connection failed.
    pub fn any_step_failed(&self) -> bool {
        self.steps.iter().any(|s| !s.passed)
    }
}

/// JSON sidecar describing a completed download/export cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SyncManifest {
    pub source: String,
    pub source_url: String,
    pub download_date: DateTime<Utc>,
    pub files: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_result_is_never_partially_populated() {
        let ok = SyncResult::ok(3, "/export.csv");
        assert!(ok.success);
        assert_eq!(ok.record_count, 3);
        assert_eq!(ok.filename.as_deref(), Some("/export.csv"));
        assert!(ok.error_message.is_none());

        let failed = SyncResult::failed("timeout");
        assert!(!failed.success);
        assert_eq!(failed.record_count, 0);
        assert!(failed.filename.is_none());
        assert_eq!(failed.error_message.as_deref(), Some("timeout"));
    }

    #[test]
    fn property_record_round_trips_through_json() {
        let record = PropertyRecord {
            property_id: "BC001".to_string(),
            address: "123 Test St".to_string(),
            parcel_number: "12345-123-123".to_string(),
            property_type: PropertyType::Residential,
            status: PropertyStatus::Active,
            acres: 0.25,
            value: Some(150_000.0),
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"propertyId\":\"BC001\""));
        assert!(json.contains("\"propertyType\":\"residential\""));
        let back: PropertyRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn empty_property_id_fails_validation() {
        let record = PropertyRecord {
            property_id: "  ".to_string(),
            address: String::new(),
            parcel_number: String::new(),
            property_type: PropertyType::Other,
            status: PropertyStatus::Inactive,
            acres: 0.0,
            value: None,
        };
        assert!(record.validate().is_err());
    }

    #[test]
    fn summary_pass_fail_accounting() {
        let summary = SyncSummary {
            steps: vec![
                StepReport::passed(SyncStep::TestConnection, None),
                StepReport::failed(SyncStep::Upload, "550 denied"),
            ],
            export: None,
            fatal: None,
        };
        assert!(!summary.all_passed());
        assert!(summary.any_step_failed());
    }
}
