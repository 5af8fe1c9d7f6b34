//! Flattening of nested scan results into violation rows.

use flowscan_types::ids::{qualified_row_id, synthesized_row_id};
use flowscan_types::{ScanResult, ViolationRow, json_text};
use std::collections::HashSet;

/// Rows for a single scanned flow.
///
/// Row ids are the detail ids assigned by post-processing, or a synthesized
/// `flow-{name}-rule-{r}-detail-{d}` when a detail has none.
pub fn flatten_one(flow_name: &str, result: &ScanResult) -> Vec<ViolationRow> {
    let mut ids = RowIds::default();
    let mut rows = Vec::with_capacity(result.violation_count());
    push_rows(&mut rows, &mut ids, flow_name, result, |detail_id| {
        detail_id.to_string()
    });
    rows
}

/// Rows for a batch of flows, in input order.
///
/// Detail ids repeat across flows, so every row id is qualified with its flow
/// name: `flow-{name}-{detail id}`.
pub fn flatten<'a, I>(results: I) -> Vec<ViolationRow>
where
    I: IntoIterator<Item = (&'a str, &'a ScanResult)>,
{
    let mut ids = RowIds::default();
    let mut rows = Vec::new();
    for (flow_name, result) in results {
        push_rows(&mut rows, &mut ids, flow_name, result, |detail_id| {
            qualified_row_id(flow_name, detail_id)
        });
    }
    rows
}

fn push_rows(
    rows: &mut Vec<ViolationRow>,
    ids: &mut RowIds,
    flow_name: &str,
    result: &ScanResult,
    assigned_id: impl Fn(&str) -> String,
) {
    for (r, rule_result) in result.rule_results.iter().enumerate() {
        for (d, detail) in rule_result.details.iter().enumerate() {
            let candidate = match detail.id.as_deref() {
                Some(id) => assigned_id(id),
                None => synthesized_row_id(flow_name, r, d),
            };
            let attrs = detail.details.as_ref();

            rows.push(ViolationRow {
                id: ids.claim(candidate),
                flow_name: flow_name.to_string(),
                rule_name: rule_result.rule_name.clone().unwrap_or_default(),
                severity: rule_result.severity.clone().unwrap_or_default(),
                name: detail.name.clone().unwrap_or_default(),
                kind: detail.kind.clone().unwrap_or_default(),
                meta_type: detail.meta_type.clone().unwrap_or_default(),
                data_type: attrs
                    .and_then(|a| a.data_type.clone())
                    .unwrap_or_default(),
                location_x: json_text(attrs.and_then(|a| a.location_x.as_ref())),
                location_y: json_text(attrs.and_then(|a| a.location_y.as_ref())),
                connects_to: json_text(detail.connects_to.as_ref()),
                expression: attrs
                    .and_then(|a| a.expression.clone())
                    .unwrap_or_default(),
            });
        }
    }
}

/// Guards row id uniqueness within one projection. A colliding id gets a
/// `-{n}` suffix, counting from 2.
#[derive(Default)]
struct RowIds {
    seen: HashSet<String>,
}

impl RowIds {
    fn claim(&mut self, candidate: String) -> String {
        if self.seen.insert(candidate.clone()) {
            return candidate;
        }
        let mut n = 2usize;
        loop {
            let next = format!("{candidate}-{n}");
            if self.seen.insert(next.clone()) {
                return next;
            }
            n += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::post_process;
    use crate::test_support::{detail, options, rule_result, scan_result};
    use flowscan_types::{DetailAttributes, Severity, ViolationDetail};
    use serde_json::json;

    #[test]
    fn single_flow_rows_carry_detail_ids() {
        let raw = scan_result(vec![rule_result(
            Some("A"),
            None,
            vec![detail("Get_1"), detail("Get_2")],
        )]);
        let processed = post_process(raw, &options(&[("A", Severity::Error)]));
        let rows = flatten_one("F1", &processed);

        let ids: Vec<_> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["rule-0-detail-0", "rule-0-detail-1"]);
        assert!(rows.iter().all(|r| r.severity == "error" && r.flow_name == "F1"));
    }

    #[test]
    fn missing_detail_id_is_synthesized() {
        let raw = scan_result(vec![rule_result(Some("A"), None, vec![detail("x")])]);
        let rows = flatten_one("F1", &raw);
        assert_eq!(rows[0].id, "flow-F1-rule-0-detail-0");
    }

    #[test]
    fn missing_fields_become_empty_strings() {
        let raw = scan_result(vec![rule_result(
            None,
            None,
            vec![ViolationDetail::default()],
        )]);
        let row = &flatten_one("F", &raw)[0];
        assert_eq!(row.rule_name, "");
        assert_eq!(row.severity, "");
        assert_eq!(row.name, "");
        assert_eq!(row.data_type, "");
        assert_eq!(row.location_x, "");
        assert_eq!(row.connects_to, "");
        assert_eq!(row.expression, "");
    }

    #[test]
    fn nested_attributes_are_rendered_as_text() {
        let mut d = detail("Decision_1");
        d.kind = Some("decisions".to_string());
        d.connects_to = Some(json!(["Assign_1", "Assign_2"]));
        d.details = Some(DetailAttributes {
            data_type: Some("String".to_string()),
            location_x: Some(json!(176)),
            location_y: Some(json!(null)),
            expression: Some("{!x} > 1".to_string()),
        });
        let raw = scan_result(vec![rule_result(Some("A"), Some("warning"), vec![d])]);
        let row = &flatten_one("F", &raw)[0];
        assert_eq!(row.kind, "decisions");
        assert_eq!(row.connects_to, "Assign_1, Assign_2");
        assert_eq!(row.location_x, "176");
        assert_eq!(row.location_y, "");
        assert_eq!(row.data_type, "String");
        assert_eq!(row.expression, "{!x} > 1");
    }

    #[test]
    fn batch_ids_are_qualified_and_unique() {
        let active = options(&[("A", Severity::Warning)]);
        let one = post_process(
            scan_result(vec![rule_result(Some("A"), None, vec![detail("x")])]),
            &active,
        );
        let two = post_process(
            scan_result(vec![rule_result(Some("A"), None, vec![detail("y")])]),
            &active,
        );

        let rows = flatten([("F1", &one), ("F2", &two)]);
        let ids: Vec<_> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["flow-F1-rule-0-detail-0", "flow-F2-rule-0-detail-0"]);
    }

    #[test]
    fn colliding_ids_get_a_suffix() {
        let mut a = detail("a");
        a.id = Some("dup".to_string());
        let mut b = detail("b");
        b.id = Some("dup".to_string());
        let raw = scan_result(vec![rule_result(Some("A"), None, vec![a, b])]);

        let rows = flatten_one("F", &raw);
        assert_eq!(rows[0].id, "dup");
        assert_eq!(rows[1].id, "dup-2");
    }

    #[test]
    fn same_flow_name_twice_in_batch_stays_unique() {
        let active = options(&[("A", Severity::Warning)]);
        let r = post_process(
            scan_result(vec![rule_result(Some("A"), None, vec![detail("x")])]),
            &active,
        );
        let rows = flatten([("F", &r), ("F", &r)]);
        assert_eq!(rows.len(), 2);
        assert_ne!(rows[0].id, rows[1].id);
    }

    #[test]
    fn empty_results_give_no_rows() {
        assert!(flatten_one("F", &ScanResult::default()).is_empty());
        assert!(flatten(std::iter::empty()).is_empty());
    }
}
