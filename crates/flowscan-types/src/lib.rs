//! Stable DTOs and IDs used across the flowscan workspace.
//!
//! This crate is intentionally boring:
//! - rule catalog, override, and rule-option types
//! - the nested scan-result tree returned by the external scanner
//! - flattened violation rows and export columns
//! - the scan-results artifact written by the CLI
//! - stable string IDs and id builders

#![forbid(unsafe_code)]

pub mod artifact;
pub mod columns;
pub mod flow;
pub mod ids;
pub mod rules;
pub mod scan;

pub use artifact::{
    BatchFailure, BatchScanEntry, SCHEMA_SCAN_RESULTS_V1, ScanResultsArtifact, ToolMeta,
};
pub use columns::{DEFAULT_COLUMNS, ExportColumn, UnknownColumn};
pub use flow::{FlowInput, FlowMetadata, FlowRecord};
pub use rules::{OverrideRecord, RuleConfig, RuleDefinition, RuleOptions, Severity};
pub use scan::{DetailAttributes, RuleResult, ScanResult, ViolationDetail, ViolationRow, json_text};
