//! Use case orchestration for flowscan.
//!
//! This crate provides the application layer: use cases that coordinate the domain, settings,
//! org and render layers through the collaborator ports in [`ports`].
//!
//! The CLI crate depends on this; it only handles argument parsing, process wiring and I/O.

#![forbid(unsafe_code)]

mod configure;
mod error;
mod flows;
pub mod ports;
mod report;
mod scan;
mod sequence;
mod settings;
mod sources;

pub use configure::{RuleConfiguration, RuleEdit, resolve_configuration};
pub use error::{AppError, BoxError, CatalogError, RetrievalOp, ScanEngineError, error_chain};
pub use flows::{list_flows, select_flows};
pub use ports::{FlowSource, OverrideStore, ParsedFlow, RuleCatalogProvider, ScanEngine};
pub use report::{
    ProjectionSource, export_csv, export_html, parse_scan_results, project_violations,
    query_violations, serialize_scan_results, sort_from_clicks, write_text,
};
pub use scan::{
    BatchScanOutput, SingleScanOutput, run_batch_scan, run_single_scan, scan_flow_records,
};
pub use sequence::{ScanSequence, ScanTicket};
pub use settings::load_settings;
pub use sources::{LocalSource, OrgSource, StaticOverrides};
