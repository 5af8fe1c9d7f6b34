//! Collaborator seams.
//!
//! The rule catalog and scan engine are synchronous and pure from the caller's
//! point of view. Flow and override retrieval are asynchronous and may fail.

use crate::error::{CatalogError, ScanEngineError};
use async_trait::async_trait;
use flowscan_types::{FlowInput, FlowMetadata, FlowRecord, OverrideRecord, RuleDefinition, RuleOptions, ScanResult};
use serde::Serialize;
use serde_json::Value as JsonValue;

/// A flow as handed to the scan engine.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ParsedFlow {
    /// Resource URI of the scanned flow version.
    pub uri: String,
    pub name: String,
    pub metadata: JsonValue,
}

impl From<&FlowInput> for ParsedFlow {
    fn from(input: &FlowInput) -> Self {
        Self {
            uri: input.version_uri.clone(),
            name: input.flow_name.clone(),
            metadata: input.metadata.clone(),
        }
    }
}

pub trait RuleCatalogProvider: Send + Sync {
    /// Every rule the engine knows, with default severities. Idempotent.
    fn rule_catalog(&self) -> Result<Vec<RuleDefinition>, CatalogError>;
}

pub trait ScanEngine: Send + Sync {
    /// Scan `flows` with `options`; one result per flow, in order.
    fn scan(
        &self,
        flows: &[ParsedFlow],
        options: &RuleOptions,
    ) -> Result<Vec<ScanResult>, ScanEngineError>;
}

#[async_trait]
pub trait FlowSource: Send + Sync {
    async fn fetch_flow_list(&self, search_term: Option<&str>) -> anyhow::Result<Vec<FlowRecord>>;

    async fn fetch_flow_metadata(&self, version_id: &str) -> anyhow::Result<FlowMetadata>;
}

#[async_trait]
pub trait OverrideStore: Send + Sync {
    /// Persisted rule overrides. An empty list is a valid answer.
    async fn fetch_stored_overrides(&self) -> anyhow::Result<Vec<OverrideRecord>>;
}
