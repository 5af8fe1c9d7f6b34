use flowscan_types::{
    FlowRecord, OverrideRecord, RuleConfig, RuleDefinition, RuleOptions, RuleResult, ScanResult,
    Severity, ViolationDetail, ViolationRow,
};

pub fn rule(name: &str, severity: Severity) -> RuleDefinition {
    RuleDefinition::new(name, severity)
}

pub fn override_record(
    rule_name: &str,
    severity: Option<&str>,
    expression: Option<&str>,
    disabled: Option<bool>,
) -> OverrideRecord {
    OverrideRecord {
        rule_name: rule_name.to_string(),
        severity: severity.map(str::to_string),
        expression: expression.map(str::to_string),
        disabled,
    }
}

pub fn options(entries: &[(&str, Severity)]) -> RuleOptions {
    RuleOptions {
        rules: entries
            .iter()
            .map(|(name, severity)| {
                (
                    name.to_string(),
                    RuleConfig {
                        severity: *severity,
                        expression: None,
                        disabled: None,
                    },
                )
            })
            .collect(),
    }
}

pub fn detail(name: &str) -> ViolationDetail {
    ViolationDetail {
        name: Some(name.to_string()),
        ..ViolationDetail::default()
    }
}

pub fn rule_result(
    rule_name: Option<&str>,
    severity: Option<&str>,
    details: Vec<ViolationDetail>,
) -> RuleResult {
    RuleResult {
        id: None,
        rule_name: rule_name.map(str::to_string),
        severity: severity.map(str::to_string),
        details,
    }
}

pub fn scan_result(rule_results: Vec<RuleResult>) -> ScanResult {
    ScanResult { rule_results }
}

pub fn row(id: &str, flow_name: &str, rule_name: &str) -> ViolationRow {
    ViolationRow {
        id: id.to_string(),
        flow_name: flow_name.to_string(),
        rule_name: rule_name.to_string(),
        ..ViolationRow::default()
    }
}

pub fn flow_record(
    id: &str,
    developer_name: &str,
    master_label: &str,
    process_type: &str,
    is_active: bool,
) -> FlowRecord {
    FlowRecord {
        id: id.to_string(),
        developer_name: developer_name.to_string(),
        developer_name_url: format!("/{id}"),
        is_active,
        master_label: master_label.to_string(),
        process_type: process_type.to_string(),
        last_modified_date: None,
        version_id: None,
    }
}
