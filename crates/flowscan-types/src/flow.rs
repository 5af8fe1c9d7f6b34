use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use time::OffsetDateTime;

/// A flow definition as listed by a flow source.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FlowRecord {
    pub id: String,
    pub developer_name: String,
    /// Relative link to the definition (`/{id}`).
    pub developer_name_url: String,
    pub is_active: bool,
    #[serde(default)]
    pub master_label: String,
    #[serde(default)]
    pub process_type: String,
    #[schemars(with = "Option<String>")]
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_modified_date: Option<OffsetDateTime>,
    /// Active version when there is one, otherwise the latest version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,
}

impl FlowRecord {
    /// Name shown for the flow: label first, developer name as fallback.
    pub fn display_name(&self) -> &str {
        if self.master_label.is_empty() {
            &self.developer_name
        } else {
            &self.master_label
        }
    }
}

/// Flow metadata fetched for one flow version.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FlowMetadata {
    pub name: String,
    pub metadata: JsonValue,
}

/// Everything needed to scan one flow.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FlowInput {
    pub flow_name: String,
    pub flow_id: String,
    pub metadata: JsonValue,
    pub version_uri: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_falls_back_to_developer_name() {
        let mut record = FlowRecord {
            id: "300xx".to_string(),
            developer_name: "Account_Update".to_string(),
            developer_name_url: "/300xx".to_string(),
            is_active: true,
            master_label: String::new(),
            process_type: "AutoLaunchedFlow".to_string(),
            last_modified_date: None,
            version_id: None,
        };
        assert_eq!(record.display_name(), "Account_Update");
        record.master_label = "Account Update".to_string();
        assert_eq!(record.display_name(), "Account Update");
    }
}
