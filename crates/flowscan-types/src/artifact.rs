use crate::scan::ScanResult;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Stable schema identifier for the scan-results artifact.
pub const SCHEMA_SCAN_RESULTS_V1: &str = "flowscan.scan-results.v1";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ToolMeta {
    pub name: String,
    pub version: String,
}

/// One successfully scanned flow of a batch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchScanEntry {
    pub flow_name: String,
    pub flow_id: String,
    pub scan_result: ScanResult,
}

/// A flow left out of a batch because fetching or scanning it failed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchFailure {
    pub flow_name: String,
    pub flow_id: String,
    pub error: String,
}

/// Persisted output of a batch scan, consumed by the report command.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScanResultsArtifact {
    /// Versioned schema identifier (`flowscan.scan-results.v1`).
    pub schema: String,
    pub tool: ToolMeta,
    #[schemars(with = "String")]
    #[serde(with = "time::serde::rfc3339")]
    pub generated_at: OffsetDateTime,
    /// Scan sequence number the results belong to.
    pub sequence: u64,
    /// Number of active rules sent to the scanner.
    pub number_of_rules: u32,
    pub results: Vec<BatchScanEntry>,
    #[serde(default)]
    pub failures: Vec<BatchFailure>,
}

impl ScanResultsArtifact {
    pub fn violation_count(&self) -> usize {
        self.results
            .iter()
            .map(|e| e.scan_result.violation_count())
            .sum()
    }
}
