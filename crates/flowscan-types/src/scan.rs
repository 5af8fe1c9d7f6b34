use crate::columns::ExportColumn;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Scan output for one flow, as returned by the external scanner.
///
/// Everything below the top level is optional so that partially populated
/// results still deserialize; projection fills the gaps with empty strings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    #[serde(default)]
    pub rule_results: Vec<RuleResult>,
}

impl ScanResult {
    /// Total number of details across all rule results.
    pub fn violation_count(&self) -> usize {
        self.rule_results.iter().map(|r| r.details.len()).sum()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RuleResult {
    /// Assigned during post-processing (`rule-{index}`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(default)]
    pub details: Vec<ViolationDetail>,
}

/// One reported violation instance.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ViolationDetail {
    /// Assigned during post-processing (`rule-{r}-detail-{d}`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_type: Option<String>,
    /// Scanners report either a single element name or a list of them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connects_to: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<DetailAttributes>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DetailAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_x: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_y: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
}

/// A flattened violation, one per scan-result detail.
///
/// Every field is a plain string; missing source data is an empty string.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ViolationRow {
    pub id: String,
    pub flow_name: String,
    pub rule_name: String,
    pub severity: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub meta_type: String,
    pub data_type: String,
    pub location_x: String,
    pub location_y: String,
    pub connects_to: String,
    pub expression: String,
}

impl ViolationRow {
    pub fn field(&self, column: ExportColumn) -> &str {
        match column {
            ExportColumn::FlowName => &self.flow_name,
            ExportColumn::RuleName => &self.rule_name,
            ExportColumn::Severity => &self.severity,
            ExportColumn::Name => &self.name,
            ExportColumn::Type => &self.kind,
            ExportColumn::MetaType => &self.meta_type,
            ExportColumn::DataType => &self.data_type,
            ExportColumn::LocationX => &self.location_x,
            ExportColumn::LocationY => &self.location_y,
            ExportColumn::ConnectsTo => &self.connects_to,
            ExportColumn::Expression => &self.expression,
        }
    }
}

/// Render a loosely typed scanner value as display text.
///
/// `null`/missing become `""`, arrays are joined with `", "`.
pub fn json_text(value: Option<&JsonValue>) -> String {
    match value {
        None | Some(JsonValue::Null) => String::new(),
        Some(JsonValue::String(s)) => s.clone(),
        Some(JsonValue::Bool(b)) => b.to_string(),
        Some(JsonValue::Number(n)) => n.to_string(),
        Some(JsonValue::Array(items)) => items
            .iter()
            .map(|v| json_text(Some(v)))
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Some(other @ JsonValue::Object(_)) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scan_result_tolerates_missing_nested_fields() {
        let raw = json!({
            "ruleResults": [
                { "ruleName": "MissingFaultPath", "details": [ { "name": "Get_Records" } ] },
                { "severity": "error" }
            ],
            "flow": { "name": "ignored" }
        });
        let result: ScanResult = serde_json::from_value(raw).expect("parse scan result");
        assert_eq!(result.rule_results.len(), 2);
        assert_eq!(result.violation_count(), 1);
        assert!(result.rule_results[0].details[0].details.is_none());
        assert!(result.rule_results[1].rule_name.is_none());
    }

    #[test]
    fn detail_type_uses_wire_name() {
        let detail: ViolationDetail =
            serde_json::from_value(json!({"name": "x", "type": "recordLookups"}))
                .expect("parse detail");
        assert_eq!(detail.kind.as_deref(), Some("recordLookups"));
    }

    #[test]
    fn json_text_flattens_loose_values() {
        assert_eq!(json_text(None), "");
        assert_eq!(json_text(Some(&JsonValue::Null)), "");
        assert_eq!(json_text(Some(&json!(176))), "176");
        assert_eq!(json_text(Some(&json!("Decision_1"))), "Decision_1");
        assert_eq!(json_text(Some(&json!(["A", "B"]))), "A, B");
        assert_eq!(json_text(Some(&json!(true))), "true");
    }
}
