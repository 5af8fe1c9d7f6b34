//! In-memory collaborators for exercising the use cases without an org or a
//! scanner process.

use async_trait::async_trait;
use flowscan_app::{
    CatalogError, FlowSource, OverrideStore, ParsedFlow, RuleCatalogProvider, ScanEngine,
    ScanEngineError,
};
use flowscan_types::{
    FlowMetadata, FlowRecord, OverrideRecord, RuleDefinition, RuleOptions, RuleResult, ScanResult,
    Severity, ViolationDetail,
};
use serde_json::{Value, json};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

/// Build a catalog from `(name, severity)` pairs.
pub fn catalog(rules: &[(&str, Severity)]) -> Vec<RuleDefinition> {
    rules
        .iter()
        .map(|(name, severity)| RuleDefinition {
            description: format!("{name} rule"),
            category: "problem".to_string(),
            ..RuleDefinition::new(*name, *severity)
        })
        .collect()
}

/// A listed flow whose version id is `v-{id}`.
pub fn flow_record(id: &str, developer_name: &str, label: &str, active: bool) -> FlowRecord {
    FlowRecord {
        id: id.to_string(),
        developer_name: developer_name.to_string(),
        developer_name_url: format!("/{id}"),
        is_active: active,
        master_label: label.to_string(),
        process_type: "AutoLaunchedFlow".to_string(),
        last_modified_date: None,
        version_id: Some(format!("v-{id}")),
    }
}

/// Flow metadata understood by [`FakeScanEngine`]: each rule name maps to the
/// element names it flags.
pub fn flow_with_violations(name: &str, violations: &[(&str, &[&str])]) -> FlowMetadata {
    let map: serde_json::Map<String, Value> = violations
        .iter()
        .map(|(rule, elements)| ((*rule).to_string(), json!(elements)))
        .collect();
    FlowMetadata {
        name: name.to_string(),
        metadata: json!({ "label": name, "violations": map }),
    }
}

pub struct StaticCatalog(pub Vec<RuleDefinition>);

impl RuleCatalogProvider for StaticCatalog {
    fn rule_catalog(&self) -> Result<Vec<RuleDefinition>, CatalogError> {
        Ok(self.0.clone())
    }
}

/// A deterministic scanner.
///
/// It reads `metadata.violations` and, like a careless real engine, reports
/// every catalog rule it knows regardless of the options it was given.
pub struct FakeScanEngine {
    catalog: Vec<RuleDefinition>,
    failing: BTreeSet<String>,
    unavailable: bool,
    calls: Mutex<Vec<Vec<String>>>,
}

impl FakeScanEngine {
    pub fn new(catalog: Vec<RuleDefinition>) -> Self {
        Self {
            catalog,
            failing: BTreeSet::new(),
            unavailable: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Fail every scan of the flow named `flow_name`.
    pub fn failing_on(mut self, flow_name: &str) -> Self {
        self.failing.insert(flow_name.to_string());
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    /// Active rule names sent with each call, in call order.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn scan_one(&self, flow: &ParsedFlow) -> ScanResult {
        let violations = flow.metadata.get("violations");
        let rule_results = self
            .catalog
            .iter()
            .map(|rule| {
                let elements = violations
                    .and_then(|v| v.get(&rule.name))
                    .and_then(Value::as_array)
                    .map(Vec::as_slice)
                    .unwrap_or_default();
                RuleResult {
                    id: None,
                    rule_name: Some(rule.name.clone()),
                    severity: Some(rule.severity.as_str().to_string()),
                    details: elements
                        .iter()
                        .filter_map(Value::as_str)
                        .map(|element| ViolationDetail {
                            name: Some(element.to_string()),
                            kind: Some("variable".to_string()),
                            meta_type: Some("variable".to_string()),
                            ..ViolationDetail::default()
                        })
                        .collect(),
                }
            })
            .collect();
        ScanResult { rule_results }
    }
}

impl RuleCatalogProvider for FakeScanEngine {
    fn rule_catalog(&self) -> Result<Vec<RuleDefinition>, CatalogError> {
        if self.unavailable {
            return Err(CatalogError::Unavailable("fake engine offline".to_string()));
        }
        Ok(self.catalog.clone())
    }
}

impl ScanEngine for FakeScanEngine {
    fn scan(
        &self,
        flows: &[ParsedFlow],
        options: &RuleOptions,
    ) -> Result<Vec<ScanResult>, ScanEngineError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(options.rules.keys().cloned().collect());
        }
        if self.unavailable {
            return Err(ScanEngineError::Unavailable("fake engine offline".to_string()));
        }
        flows
            .iter()
            .map(|flow| {
                if self.failing.contains(&flow.name) {
                    Err(ScanEngineError::Failed(format!("cannot parse {}", flow.name)))
                } else {
                    Ok(self.scan_one(flow))
                }
            })
            .collect()
    }
}

/// Flow listing and metadata served from memory.
#[derive(Default)]
pub struct FakeFlowSource {
    records: Vec<FlowRecord>,
    metadata: BTreeMap<String, FlowMetadata>,
    list_error: Option<String>,
}

impl FakeFlowSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a flow; its metadata is served under the record's version id.
    pub fn with_flow(mut self, record: FlowRecord, metadata: FlowMetadata) -> Self {
        if let Some(version_id) = &record.version_id {
            self.metadata.insert(version_id.clone(), metadata);
        }
        self.records.push(record);
        self
    }

    /// Add a listed flow with no fetchable metadata.
    pub fn with_record(mut self, record: FlowRecord) -> Self {
        self.records.push(record);
        self
    }

    pub fn failing_list(mut self, message: &str) -> Self {
        self.list_error = Some(message.to_string());
        self
    }

    pub fn records(&self) -> &[FlowRecord] {
        &self.records
    }
}

#[async_trait]
impl FlowSource for FakeFlowSource {
    async fn fetch_flow_list(&self, search_term: Option<&str>) -> anyhow::Result<Vec<FlowRecord>> {
        if let Some(message) = &self.list_error {
            anyhow::bail!("{message}");
        }
        let term = search_term.map(str::to_lowercase);
        Ok(self
            .records
            .iter()
            .filter(|r| {
                term.as_deref()
                    .is_none_or(|t| r.developer_name.to_lowercase().contains(t))
            })
            .cloned()
            .collect())
    }

    async fn fetch_flow_metadata(&self, version_id: &str) -> anyhow::Result<FlowMetadata> {
        self.metadata
            .get(version_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no flow version with id {version_id}"))
    }
}

/// An override store whose every fetch fails.
pub struct FailingOverrideStore(pub String);

#[async_trait]
impl OverrideStore for FailingOverrideStore {
    async fn fetch_stored_overrides(&self) -> anyhow::Result<Vec<OverrideRecord>> {
        anyhow::bail!("{}", self.0)
    }
}
