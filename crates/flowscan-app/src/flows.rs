//! The `flows` use case: list flows from a source and narrow them locally.

use crate::error::{AppError, RetrievalOp};
use crate::ports::FlowSource;
use flowscan_domain::flows::{FlowListQuery, query_flows};
use flowscan_types::FlowRecord;
use tracing::debug;

/// Fetch the listing for `search_term`, then apply `query` on top.
pub async fn list_flows(
    source: &dyn FlowSource,
    search_term: Option<&str>,
    query: &FlowListQuery,
) -> Result<Vec<FlowRecord>, AppError> {
    let search_term = search_term.map(str::trim).filter(|t| !t.is_empty());
    let records = source.fetch_flow_list(search_term).await.map_err(|e| {
        AppError::retrieval(
            RetrievalOp::FlowList {
                search_term: search_term.map(str::to_string),
            },
            e,
        )
    })?;
    debug!(fetched = records.len(), "fetched flow listing");
    Ok(query_flows(&records, query))
}

/// Pick the flows named by `names` (developer name or label, case-insensitive).
///
/// An empty `names` selects everything. Returns the selection and the names that
/// matched nothing.
pub fn select_flows(records: &[FlowRecord], names: &[String]) -> (Vec<FlowRecord>, Vec<String>) {
    if names.is_empty() {
        return (records.to_vec(), Vec::new());
    }
    let mut selected = Vec::new();
    let mut missing = Vec::new();
    for name in names {
        let found: Vec<&FlowRecord> = records
            .iter()
            .filter(|r| {
                r.developer_name.eq_ignore_ascii_case(name) || r.master_label.eq_ignore_ascii_case(name)
            })
            .collect();
        if found.is_empty() {
            missing.push(name.clone());
        }
        for record in found {
            if !selected.iter().any(|s: &FlowRecord| s.id == record.id) {
                selected.push(record.clone());
            }
        }
    }
    (selected, missing)
}
