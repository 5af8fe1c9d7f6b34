//! The `report` use cases: project scan results into rows, query them, export them.

use anyhow::Context;
use camino::Utf8Path;
use flowscan_domain::projection::{flatten, flatten_one};
use flowscan_domain::query::{SortState, ViolationFilter, query};
use flowscan_render::ReportMeta;
use flowscan_types::{
    BatchScanEntry, ExportColumn, SCHEMA_SCAN_RESULTS_V1, ScanResult, ScanResultsArtifact,
    ViolationRow,
};

/// What a projection starts from.
pub enum ProjectionSource<'a> {
    Single {
        flow_name: &'a str,
        result: &'a ScanResult,
    },
    Batch(&'a [BatchScanEntry]),
}

pub fn project_violations(source: ProjectionSource<'_>) -> Vec<ViolationRow> {
    match source {
        ProjectionSource::Single { flow_name, result } => flatten_one(flow_name, result),
        ProjectionSource::Batch(entries) => flatten(
            entries
                .iter()
                .map(|e| (e.flow_name.as_str(), &e.scan_result)),
        ),
    }
}

/// Filter then sort a row set. The input is left untouched.
pub fn query_violations(
    rows: &[ViolationRow],
    filter: &ViolationFilter,
    sort: &SortState,
) -> Vec<ViolationRow> {
    query(rows, filter, sort)
}

/// Apply header clicks in order, starting from an unsorted table.
pub fn sort_from_clicks<S: AsRef<str>>(fields: &[S]) -> SortState {
    fields
        .iter()
        .fold(SortState::default(), |state, field| state.toggle(field.as_ref()))
}

pub fn export_csv(rows: &[ViolationRow], columns: &[ExportColumn]) -> String {
    flowscan_render::to_csv(rows, columns)
}

pub fn export_html(rows: &[ViolationRow], meta: &ReportMeta) -> String {
    flowscan_render::to_printable_html(rows, meta)
}

/// Parse a scan-results artifact, checking its schema id.
pub fn parse_scan_results(text: &str) -> anyhow::Result<ScanResultsArtifact> {
    let artifact: ScanResultsArtifact =
        serde_json::from_str(text).context("parse scan results JSON")?;
    if artifact.schema != SCHEMA_SCAN_RESULTS_V1 {
        anyhow::bail!(
            "unsupported scan results schema: {} (expected {SCHEMA_SCAN_RESULTS_V1})",
            artifact.schema
        );
    }
    Ok(artifact)
}

pub fn serialize_scan_results(artifact: &ScanResultsArtifact) -> anyhow::Result<String> {
    let mut text = serde_json::to_string_pretty(artifact).context("serialize scan results")?;
    text.push('\n');
    Ok(text)
}

/// Write `text` to `path`, creating parent directories.
pub fn write_text(path: &Utf8Path, text: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| format!("create {parent}"))?;
        }
    }
    std::fs::write(path, text).with_context(|| format!("write {path}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowscan_domain::query::SortDirection;
    use flowscan_types::{RuleResult, ViolationDetail};

    fn result(rule: &str, names: &[&str]) -> ScanResult {
        ScanResult {
            rule_results: vec![RuleResult {
                id: Some("rule-0".to_string()),
                rule_name: Some(rule.to_string()),
                severity: Some("warning".to_string()),
                details: names
                    .iter()
                    .enumerate()
                    .map(|(i, n)| ViolationDetail {
                        id: Some(format!("rule-0-detail-{i}")),
                        name: Some(n.to_string()),
                        ..ViolationDetail::default()
                    })
                    .collect(),
            }],
        }
    }

    fn batch() -> Vec<BatchScanEntry> {
        vec![
            BatchScanEntry {
                flow_name: "F1".to_string(),
                flow_id: "1".to_string(),
                scan_result: result("A", &["x", "y"]),
            },
            BatchScanEntry {
                flow_name: "F2".to_string(),
                flow_id: "2".to_string(),
                scan_result: ScanResult::default(),
            },
        ]
    }

    #[test]
    fn batch_projection_only_yields_rows_for_flows_with_violations() {
        let entries = batch();
        let rows = project_violations(ProjectionSource::Batch(&entries));
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.flow_name == "F1"));
    }

    #[test]
    fn flow_name_term_filters_rows() {
        let entries = batch();
        let rows = project_violations(ProjectionSource::Batch(&entries));
        let f1 = ViolationFilter {
            flow_name_term: Some("f1".to_string()),
            other_fields_term: None,
        };
        assert_eq!(query_violations(&rows, &f1, &SortState::default()).len(), 2);
        let none = ViolationFilter {
            flow_name_term: Some("zzz".to_string()),
            other_fields_term: None,
        };
        assert!(query_violations(&rows, &none, &SortState::default()).is_empty());
    }

    #[test]
    fn repeated_clicks_toggle_direction() {
        assert_eq!(sort_from_clicks::<&str>(&[]), SortState::default());
        assert_eq!(
            sort_from_clicks(&["name", "name"]),
            SortState::by("name", SortDirection::Desc)
        );
        assert_eq!(
            sort_from_clicks(&["name", "name", "severity"]),
            SortState::by("severity", SortDirection::Asc)
        );
    }

    #[test]
    fn single_projection_keeps_detail_ids() {
        let r = result("A", &["x"]);
        let rows = project_violations(ProjectionSource::Single {
            flow_name: "F",
            result: &r,
        });
        assert_eq!(rows[0].id, "rule-0-detail-0");
    }

    #[test]
    fn rejects_foreign_schema() {
        let err = parse_scan_results(
            r#"{"schema":"other","tool":{"name":"x","version":"1"},"generatedAt":"2024-01-01T00:00:00Z","sequence":1,"numberOfRules":0,"results":[]}"#,
        )
        .expect_err("schema mismatch");
        assert!(err.to_string().contains("unsupported scan results schema"));
    }
}
