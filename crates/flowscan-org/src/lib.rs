//! Flow source adapters: query an org over REST, or read exported flows from disk.
//!
//! This crate is allowed to do network and filesystem IO. It should not spawn external
//! processes; running the scanner is the caller's job.

#![forbid(unsafe_code)]

mod client;
mod local;
mod records;
mod soql;

pub use client::{OrgClient, OrgConfig, QueryApi};
pub use local::{DEFAULT_FLOW_PATTERN, LocalFlowSource, parse_flow_file};
pub use records::{FlowDefinitionRecord, FlowVersionRecord, normalize_flow_definition};
pub use soql::{OverrideObject, escape_literal, flow_list_query, flow_metadata_query};

/// Fuzz-friendly API for testing parsing robustness without network or filesystem access.
/// These functions are designed to never panic on any input.
pub mod fuzz {
    use serde_json::Value;

    /// Parse arbitrary text as a local flow file.
    ///
    /// **Never panics** on any input.
    pub fn parse_flow_file(text: &str) -> anyhow::Result<()> {
        let _ = super::local::parse_flow_file("fuzz", text)?;
        Ok(())
    }

    /// Parse arbitrary text as a page of flow-definition records and normalize them.
    ///
    /// Returns the number of records that survived normalization. **Never panics** on any input.
    pub fn normalize_flow_page(text: &str) -> anyhow::Result<usize> {
        let values: Vec<Value> = serde_json::from_str(text)?;
        Ok(super::records::flow_records_from_values(values).len())
    }

    /// Build a flow list query from an arbitrary search term.
    ///
    /// **Never panics** on any input.
    pub fn flow_list_query(term: &str) -> String {
        super::soql::flow_list_query(Some(term), 50)
    }
}
