//! Scan-result post-processing.
//!
//! The external scanner is not trusted to honor the rule set it was given, so
//! every raw result is filtered against the active rules again, re-stamped with
//! the configured severity, and given positional ids.

use flowscan_types::ids::{detail_id, rule_result_id};
use flowscan_types::{RuleOptions, ScanResult};

/// Subset of `options` with disabled rules removed.
pub fn active_rules(options: &RuleOptions) -> RuleOptions {
    RuleOptions {
        rules: options
            .rules
            .iter()
            .filter(|(_, cfg)| !cfg.is_disabled())
            .map(|(name, cfg)| (name.clone(), cfg.clone()))
            .collect(),
    }
}

/// Keep only rule results for active rules, apply configured severities, and
/// assign `rule-{i}` / `rule-{i}-detail-{j}` ids.
///
/// Indices are positions after filtering. The input is consumed; a new result
/// is returned.
pub fn post_process(raw: ScanResult, active: &RuleOptions) -> ScanResult {
    let rule_results = raw
        .rule_results
        .into_iter()
        .filter_map(|mut rule_result| {
            let config = active.get(rule_result.rule_name.as_deref()?)?;
            rule_result.severity = Some(config.severity.as_str().to_string());
            Some(rule_result)
        })
        .enumerate()
        .map(|(r, mut rule_result)| {
            rule_result.id = Some(rule_result_id(r));
            for (d, detail) in rule_result.details.iter_mut().enumerate() {
                detail.id = Some(detail_id(r, d));
            }
            rule_result
        })
        .collect();

    ScanResult { rule_results }
}

/// Number of raw rule results `post_process` would discard.
pub fn dropped_rule_results(raw: &ScanResult, active: &RuleOptions) -> usize {
    raw.rule_results
        .iter()
        .filter(|r| r.rule_name.as_deref().is_none_or(|name| !active.contains(name)))
        .count()
}
