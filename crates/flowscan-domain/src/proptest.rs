//! Property-based tests for the domain crate.
//!
//! These tests use proptest to verify invariants around:
//! - Rule configuration merging (coverage, override validity, idempotence)
//! - Scan post-processing (only active rules survive, positional ids)
//! - Projection (one row per detail, unique ids)
//! - Sorting (permutation, stability, determinism, direction reversal)
//! - Filtering (ordered subsets, other-fields monotonicity)

use crate::projection::{flatten, flatten_one};
use crate::query::{OTHER_FIELD_COLUMNS, SortDirection, ViolationFilter, filter, sort};
use crate::resolve::{merge, overrides_from_resolved};
use crate::scan::{active_rules, post_process};
use flowscan_types::{
    OverrideRecord, RuleDefinition, RuleOptions, RuleResult, ScanResult, Severity,
    ViolationDetail, ViolationRow,
};
use proptest::prelude::*;
use std::collections::{BTreeSet, HashSet};

// ============================================================================
// Strategies
// ============================================================================

fn arb_rule_name() -> impl Strategy<Value = String> {
    prop::sample::select(vec![
        "MissingFaultPath",
        "HardcodedId",
        "DMLStatementInLoop",
        "SOQLQueryInLoop",
        "UnusedVariable",
        "FlowName",
        "APIVersion",
    ])
    .prop_map(str::to_string)
}

fn arb_severity() -> impl Strategy<Value = Severity> {
    prop_oneof![
        Just(Severity::Info),
        Just(Severity::Warning),
        Just(Severity::Error),
    ]
}

fn arb_severity_text() -> impl Strategy<Value = String> {
    prop_oneof![
        arb_severity().prop_map(|s| s.as_str().to_string()),
        Just("Error".to_string()),
        Just("WARN".to_string()),
        Just("critical".to_string()),
        Just(String::new()),
    ]
}

fn arb_catalog() -> impl Strategy<Value = Vec<RuleDefinition>> {
    prop::collection::vec((arb_rule_name(), arb_severity()), 0..8)
        .prop_map(|pairs| {
            pairs
                .into_iter()
                .map(|(name, severity)| RuleDefinition::new(name, severity))
                .collect()
        })
}

fn arb_override() -> impl Strategy<Value = OverrideRecord> {
    (
        prop_oneof![arb_rule_name(), Just("NotARule".to_string())],
        prop::option::of(arb_severity_text()),
        prop::option::of(prop_oneof![Just("x > 1".to_string()), Just(String::new())]),
        prop::option::of(any::<bool>()),
    )
        .prop_map(|(rule_name, severity, expression, disabled)| OverrideRecord {
            rule_name,
            severity,
            expression,
            disabled,
        })
}

fn arb_user_edit() -> impl Strategy<Value = RuleDefinition> {
    (arb_rule_name(), arb_severity(), any::<bool>()).prop_map(|(name, severity, active)| {
        let mut rule = RuleDefinition::new(name, severity);
        rule.is_active = active;
        rule
    })
}

fn arb_raw_scan() -> impl Strategy<Value = ScanResult> {
    let detail = prop::option::of("[A-Za-z_]{1,8}").prop_map(|name| ViolationDetail {
        name,
        ..ViolationDetail::default()
    });
    let rule_result = (
        prop::option::of(prop_oneof![arb_rule_name(), Just("Unknown".to_string())]),
        prop::option::of(arb_severity_text()),
        prop::collection::vec(detail, 0..4),
    )
        .prop_map(|(rule_name, severity, details)| RuleResult {
            id: None,
            rule_name,
            severity,
            details,
        });
    prop::collection::vec(rule_result, 0..6).prop_map(|rule_results| ScanResult { rule_results })
}

fn arb_text() -> impl Strategy<Value = String> {
    "[a-cA-C ]{0,5}"
}

fn arb_row_fields() -> impl Strategy<Value = (Vec<String>, String)> {
    (
        prop::collection::vec(arb_text(), 10),
        prop_oneof![Just(String::new()), (0u32..500).prop_map(|n| n.to_string())],
    )
}

fn arb_rows() -> impl Strategy<Value = Vec<ViolationRow>> {
    prop::collection::vec(arb_row_fields(), 0..12).prop_map(|items| {
        items
            .into_iter()
            .enumerate()
            .map(|(i, (mut text, location_x))| {
                let mut next = || text.pop().unwrap_or_default();
                ViolationRow {
                    id: format!("row-{i}"),
                    flow_name: next(),
                    rule_name: next(),
                    severity: next(),
                    name: next(),
                    kind: next(),
                    meta_type: next(),
                    data_type: next(),
                    location_x,
                    location_y: next(),
                    connects_to: next(),
                    expression: next(),
                }
            })
            .collect()
    })
}

fn unique_names(catalog: &[RuleDefinition]) -> BTreeSet<String> {
    catalog.iter().map(|r| r.name.clone()).collect()
}

// ============================================================================
// Resolver
// ============================================================================

proptest! {
    #[test]
    fn options_cover_exactly_the_catalog(
        catalog in arb_catalog(),
        overrides in prop::collection::vec(arb_override(), 0..8),
        edits in prop::option::of(prop::collection::vec(arb_user_edit(), 0..6)),
    ) {
        let resolved = merge(&catalog, &overrides, edits.as_deref());
        let keys: BTreeSet<String> = resolved.options.rules.keys().cloned().collect();
        prop_assert_eq!(keys, unique_names(&catalog));
        prop_assert_eq!(resolved.rules.len(), resolved.options.len());
    }

    #[test]
    fn disabled_flag_mirrors_inactive_rules(
        catalog in arb_catalog(),
        overrides in prop::collection::vec(arb_override(), 0..8),
    ) {
        let resolved = merge(&catalog, &overrides, None);
        for rule in &resolved.rules {
            let cfg = resolved.options.get(&rule.name);
            prop_assert!(cfg.is_some());
            if let Some(cfg) = cfg {
                prop_assert_eq!(cfg.is_disabled(), !rule.is_active);
                prop_assert_eq!(cfg.severity, rule.severity);
            }
        }
    }

    #[test]
    fn merging_is_idempotent(
        catalog in arb_catalog(),
        overrides in prop::collection::vec(arb_override(), 0..8),
    ) {
        let first = merge(&catalog, &overrides, None);
        let again = merge(&catalog, &overrides, None);
        prop_assert_eq!(&first, &again);

        let replayed = merge(&catalog, &overrides_from_resolved(&first), None);
        prop_assert_eq!(first.options, replayed.options);
    }
}

// ============================================================================
// Post-processing and projection
// ============================================================================

proptest! {
    #[test]
    fn only_active_rules_survive(
        catalog in arb_catalog(),
        overrides in prop::collection::vec(arb_override(), 0..8),
        raw in arb_raw_scan(),
    ) {
        let active = active_rules(&merge(&catalog, &overrides, None).options);
        let out = post_process(raw, &active);

        for (i, rr) in out.rule_results.iter().enumerate() {
            let name = rr.rule_name.as_deref().unwrap_or_default();
            let cfg = active.get(name);
            prop_assert!(cfg.is_some());
            if let Some(cfg) = cfg {
                prop_assert_eq!(rr.severity.as_deref(), Some(cfg.severity.as_str()));
            }
            let expected_id = format!("rule-{i}");
            prop_assert_eq!(rr.id.as_deref(), Some(expected_id.as_str()));
            for (j, d) in rr.details.iter().enumerate() {
                let expected = format!("rule-{i}-detail-{j}");
                prop_assert_eq!(d.id.as_deref(), Some(expected.as_str()));
            }
        }
    }

    #[test]
    fn post_processing_twice_changes_nothing(raw in arb_raw_scan(), catalog in arb_catalog()) {
        let active = active_rules(&merge(&catalog, &[], None).options);
        let once = post_process(raw, &active);
        let twice = post_process(once.clone(), &active);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn projection_emits_one_unique_row_per_detail(
        first in arb_raw_scan(),
        second in arb_raw_scan(),
    ) {
        let single = flatten_one("F", &first);
        prop_assert_eq!(single.len(), first.violation_count());
        let ids: HashSet<&str> = single.iter().map(|r| r.id.as_str()).collect();
        prop_assert_eq!(ids.len(), single.len());

        let batch = flatten([("A", &first), ("A", &second)]);
        prop_assert_eq!(batch.len(), first.violation_count() + second.violation_count());
        let ids: HashSet<&str> = batch.iter().map(|r| r.id.as_str()).collect();
        prop_assert_eq!(ids.len(), batch.len());
    }

    #[test]
    fn empty_active_set_always_yields_no_rows(raw in arb_raw_scan()) {
        let out = post_process(raw, &RuleOptions::default());
        prop_assert!(flatten_one("F", &out).is_empty());
    }
}

// ============================================================================
// Filter and sort
// ============================================================================

proptest! {
    #[test]
    fn sort_is_a_permutation(rows in arb_rows(), desc in any::<bool>()) {
        let direction = if desc { SortDirection::Desc } else { SortDirection::Asc };
        let sorted = sort(&rows, "locationX", direction);
        let mut before: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
        let mut after: Vec<&str> = sorted.iter().map(|r| r.id.as_str()).collect();
        before.sort_unstable();
        after.sort_unstable();
        prop_assert_eq!(before, after);
    }

    #[test]
    fn ascending_text_sort_is_stable(rows in arb_rows()) {
        let sorted = sort(&rows, "flowName", SortDirection::Asc);
        for pair in sorted.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            let (ka, kb) = (a.flow_name.to_lowercase(), b.flow_name.to_lowercase());
            prop_assert!(ka <= kb);
            if ka == kb {
                // Ids encode input position.
                let ia: usize = a.id.trim_start_matches("row-").parse().unwrap_or_default();
                let ib: usize = b.id.trim_start_matches("row-").parse().unwrap_or_default();
                prop_assert!(ia < ib);
            }
        }
    }

    #[test]
    fn filter_returns_an_ordered_subset(rows in arb_rows(), term in "[a-z]{0,2}") {
        let f = ViolationFilter { flow_name_term: Some(term.clone()), other_fields_term: None };
        let out = filter(&rows, &f);
        prop_assert!(out.len() <= rows.len());
        for row in &out {
            prop_assert!(row.flow_name.to_lowercase().contains(&term));
        }
        let positions: Vec<usize> = out
            .iter()
            .filter_map(|r| rows.iter().position(|x| x.id == r.id))
            .collect();
        prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn other_fields_term_keeps_every_single_column_match(
        rows in arb_rows(),
        term in "[a-c]{1,2}",
    ) {
        let f = ViolationFilter { flow_name_term: None, other_fields_term: Some(term.clone()) };
        let out = filter(&rows, &f);
        for row in &rows {
            for column in OTHER_FIELD_COLUMNS {
                if row.field(column).to_lowercase().contains(&term) {
                    prop_assert!(out.iter().any(|r| r.id == row.id));
                }
            }
        }
    }

    #[test]
    fn descending_reverses_ascending_for_distinct_keys(rows in arb_rows()) {
        let mut seen = HashSet::new();
        let rows: Vec<ViolationRow> = rows
            .into_iter()
            .filter(|r| seen.insert(r.flow_name.to_lowercase()))
            .collect();

        let asc = sort(&rows, "flowName", SortDirection::Asc);
        let desc = sort(&asc, "flowName", SortDirection::Desc);
        let mut reversed = asc.clone();
        reversed.reverse();
        prop_assert_eq!(desc, reversed);
    }
}
