//! Stable identifiers and id builders.
//!
//! Rule-result and detail ids are a pure function of their post-filter position, so
//! re-running post-processing over the same ordered result always yields the same ids.

pub const TOOL_NAME: &str = "flowscan";

/// Tooling API version used when nothing else is configured.
pub const DEFAULT_API_VERSION: &str = "60.0";

/// Page size used by flow list queries when nothing else is configured.
pub const DEFAULT_SEARCH_LIMIT: u32 = 50;

/// Id assigned to the `rule_index`-th surviving rule result of a scan.
pub fn rule_result_id(rule_index: usize) -> String {
    format!("rule-{rule_index}")
}

/// Id assigned to the `detail_index`-th detail of a surviving rule result.
pub fn detail_id(rule_index: usize, detail_index: usize) -> String {
    format!("rule-{rule_index}-detail-{detail_index}")
}

/// Row id synthesized during projection when a detail carries no id of its own.
pub fn synthesized_row_id(flow_name: &str, rule_index: usize, detail_index: usize) -> String {
    format!("flow-{flow_name}-rule-{rule_index}-detail-{detail_index}")
}

/// Row id for a detail that already carries an id, qualified by flow for multi-flow batches.
pub fn qualified_row_id(flow_name: &str, detail_id: &str) -> String {
    format!("flow-{flow_name}-{detail_id}")
}

/// Tooling API resource URI for a flow version, handed to the scanner as the flow's `uri`.
pub fn flow_version_uri(api_version: &str, version_id: &str) -> String {
    format!("/services/data/v{api_version}/tooling/sobjects/Flow/{version_id}")
}
