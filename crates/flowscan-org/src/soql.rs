//! SOQL query builders and record mappers for the org adapter.

use flowscan_types::OverrideRecord;
use serde_json::Value;

/// Namespace prefix of the org, used to qualify custom metadata names.
pub const NAMESPACE_QUERY: &str = "SELECT NamespacePrefix FROM Organization LIMIT 1";

const FLOW_DEFINITION_FIELDS: &str = "Id, CreatedDate, DeveloperName, ActiveVersionId, LatestVersionId, \
ActiveVersion.Status, ActiveVersion.MasterLabel, ActiveVersion.ProcessType, ActiveVersion.LastModifiedDate, \
LatestVersion.Status, LatestVersion.MasterLabel, LatestVersion.ProcessType, LatestVersion.LastModifiedDate, \
LastModifiedDate, LastModifiedBy.Name";

/// Escape a value for use inside a single-quoted SOQL literal.
pub fn escape_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            _ => out.push(c),
        }
    }
    out
}

/// Flow definition listing, optionally narrowed by a name search.
pub fn flow_list_query(search_term: Option<&str>, limit: u32) -> String {
    let mut soql = format!("SELECT {FLOW_DEFINITION_FIELDS} FROM FlowDefinition");
    if let Some(term) = search_term.map(str::trim).filter(|t| !t.is_empty()) {
        let term = escape_literal(term);
        soql.push_str(&format!(
            " WHERE DeveloperName LIKE '%{term}%' OR MasterLabel LIKE '%{term}%'"
        ));
    }
    soql.push_str(&format!(" LIMIT {limit}"));
    soql
}

/// Metadata of one flow version.
///
/// Returns `None` when `version_id` is not a plausible record id.
pub fn flow_metadata_query(version_id: &str) -> Option<String> {
    if !is_record_id(version_id) {
        return None;
    }
    Some(format!(
        "SELECT Id, FullName, Metadata FROM Flow WHERE Id = '{version_id}' LIMIT 1"
    ))
}

/// Salesforce ids are 15 or 18 alphanumeric characters.
pub fn is_record_id(value: &str) -> bool {
    matches!(value.len(), 15 | 18) && value.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Names of the rule-override custom metadata type and its fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OverrideObject {
    pub object: String,
    pub rule_name: String,
    pub severity: String,
    pub expression: String,
    pub disabled: String,
}

impl OverrideObject {
    /// Qualify names with `{ns}__` when the org has a namespace prefix.
    pub fn new(namespace: Option<&str>) -> Self {
        let prefix = namespace
            .map(str::trim)
            .filter(|ns| !ns.is_empty())
            .map(|ns| format!("{ns}__"))
            .unwrap_or_default();
        Self {
            object: format!("{prefix}ScanRuleConfiguration__mdt"),
            rule_name: format!("{prefix}RuleName__c"),
            severity: format!("{prefix}Severity__c"),
            expression: format!("{prefix}Expression__c"),
            disabled: format!("{prefix}Disabled__c"),
        }
    }

    pub fn query(&self) -> String {
        format!(
            "SELECT {}, {}, {}, {} FROM {}",
            self.rule_name, self.severity, self.expression, self.disabled, self.object
        )
    }

    /// Map a queried record. Records without a rule name are skipped.
    ///
    /// `disabled` is taken only when the field is present and non-null, by
    /// truthiness.
    pub fn to_override(&self, record: &Value) -> Option<OverrideRecord> {
        let rule_name = record.get(&self.rule_name)?.as_str()?.to_string();
        let text = |field: &str| {
            record
                .get(field)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let disabled = match record.get(&self.disabled) {
            None | Some(Value::Null) => None,
            Some(v) => Some(truthy(v)),
        };
        Some(OverrideRecord {
            rule_name,
            severity: text(&self.severity).map(|s| s.to_lowercase()),
            expression: text(&self.expression),
            disabled,
        })
    }
}

/// Namespace prefix from an `Organization` query result record.
pub fn namespace_from_record(record: Option<&Value>) -> Option<String> {
    record
        .and_then(|r| r.get("NamespacePrefix"))
        .and_then(Value::as_str)
        .filter(|ns| !ns.is_empty())
        .map(str::to_string)
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn list_query_without_term_only_limits() {
        let q = flow_list_query(None, 50);
        assert!(q.starts_with("SELECT Id, CreatedDate, DeveloperName"));
        assert!(q.ends_with("FROM FlowDefinition LIMIT 50"));
        assert!(!q.contains("WHERE"));
        assert_eq!(flow_list_query(Some("   "), 50), q);
    }

    #[test]
    fn list_query_escapes_quotes() {
        let q = flow_list_query(Some("O'Brien"), 10);
        assert!(q.contains("WHERE DeveloperName LIKE '%O\\'Brien%' OR MasterLabel LIKE '%O\\'Brien%'"));
        assert!(q.ends_with(" LIMIT 10"));
    }

    #[test]
    fn metadata_query_requires_record_id() {
        assert_eq!(
            flow_metadata_query("301000000000001AAA").as_deref(),
            Some("SELECT Id, FullName, Metadata FROM Flow WHERE Id = '301000000000001AAA' LIMIT 1")
        );
        assert!(flow_metadata_query("x' OR Id != '").is_none());
        assert!(flow_metadata_query("").is_none());
    }

    #[test]
    fn override_object_is_namespaced() {
        let plain = OverrideObject::new(None);
        assert_eq!(
            plain.query(),
            "SELECT RuleName__c, Severity__c, Expression__c, Disabled__c FROM ScanRuleConfiguration__mdt"
        );
        let ns = OverrideObject::new(Some("lfs"));
        assert_eq!(ns.object, "lfs__ScanRuleConfiguration__mdt");
        assert_eq!(ns.disabled, "lfs__Disabled__c");
        assert_eq!(OverrideObject::new(Some("")), plain);
    }

    #[test]
    fn maps_override_records() {
        let obj = OverrideObject::new(Some("lfs"));
        let rec = json!({
            "lfs__RuleName__c": "HardcodedId",
            "lfs__Severity__c": "Error",
            "lfs__Expression__c": null,
            "lfs__Disabled__c": false
        });
        let mapped = obj.to_override(&rec).expect("mapped");
        assert_eq!(mapped.rule_name, "HardcodedId");
        assert_eq!(mapped.severity.as_deref(), Some("error"));
        assert_eq!(mapped.expression, None);
        assert_eq!(mapped.disabled, Some(false));

        let no_flag = json!({ "lfs__RuleName__c": "A", "lfs__Disabled__c": null });
        assert_eq!(obj.to_override(&no_flag).and_then(|o| o.disabled), None);

        assert!(obj.to_override(&json!({ "lfs__Severity__c": "error" })).is_none());
    }

    #[test]
    fn namespace_is_read_from_organization_record() {
        assert_eq!(
            namespace_from_record(Some(&json!({ "NamespacePrefix": "lfs" }))).as_deref(),
            Some("lfs")
        );
        assert_eq!(namespace_from_record(Some(&json!({ "NamespacePrefix": null }))), None);
        assert_eq!(namespace_from_record(None), None);
    }
}
