//! Normalization of raw Tooling API records into flowscan types.

use flowscan_types::{FlowMetadata, FlowRecord};
use serde::Deserialize;
use serde_json::Value;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FlowDefinitionRecord {
    pub id: String,
    #[serde(default)]
    pub developer_name: String,
    #[serde(default)]
    pub created_date: Option<String>,
    #[serde(default)]
    pub last_modified_date: Option<String>,
    #[serde(default)]
    pub active_version_id: Option<String>,
    #[serde(default)]
    pub latest_version_id: Option<String>,
    #[serde(default)]
    pub active_version: Option<FlowVersionRecord>,
    #[serde(default)]
    pub latest_version: Option<FlowVersionRecord>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FlowVersionRecord {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub master_label: Option<String>,
    #[serde(default)]
    pub process_type: Option<String>,
    #[serde(default)]
    pub last_modified_date: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct FlowVersionMetadataRecord {
    full_name: String,
    #[serde(default)]
    metadata: Value,
}

/// Turn a flow definition into a listing row.
///
/// The active version is described when there is one, otherwise the latest.
/// The timestamp falls back from version to definition to creation date.
pub fn normalize_flow_definition(record: FlowDefinitionRecord) -> FlowRecord {
    let active_id = record.active_version_id.filter(|id| !id.is_empty());
    let latest_id = record.latest_version_id.filter(|id| !id.is_empty());
    let version = if active_id.is_some() {
        record.active_version
    } else {
        record.latest_version
    }
    .unwrap_or_default();

    let last_modified_date = [
        version.last_modified_date.as_deref(),
        record.last_modified_date.as_deref(),
        record.created_date.as_deref(),
    ]
    .into_iter()
    .flatten()
    .find(|s| !s.is_empty())
    .and_then(parse_timestamp);

    FlowRecord {
        developer_name_url: format!("/{}", record.id),
        is_active: active_id.is_some(),
        master_label: version.master_label.unwrap_or_default(),
        process_type: version.process_type.unwrap_or_default(),
        last_modified_date,
        version_id: active_id.or(latest_id),
        developer_name: record.developer_name,
        id: record.id,
    }
}

/// Parse and normalize a page of raw flow-definition records.
///
/// Records that do not have the expected shape are skipped.
pub fn flow_records_from_values(values: Vec<Value>) -> Vec<FlowRecord> {
    values
        .into_iter()
        .filter_map(|v| serde_json::from_value::<FlowDefinitionRecord>(v).ok())
        .map(normalize_flow_definition)
        .collect()
}

/// Metadata from a `Flow` query record.
pub fn flow_metadata_from_value(value: Value) -> anyhow::Result<FlowMetadata> {
    let record: FlowVersionMetadataRecord = serde_json::from_value(value)?;
    Ok(FlowMetadata {
        name: record.full_name,
        metadata: record.metadata,
    })
}

/// Accepts RFC 3339 and the API's `2024-01-15T10:30:00.000+0000` form.
pub fn parse_timestamp(raw: &str) -> Option<OffsetDateTime> {
    let raw = raw.trim();
    OffsetDateTime::parse(raw, &Rfc3339).ok().or_else(|| {
        let api = format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond][offset_hour sign:mandatory][offset_minute]"
        );
        OffsetDateTime::parse(raw, api).ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::datetime;

    #[test]
    fn active_version_wins() {
        let raw = json!({
            "Id": "300000000000001AAA",
            "DeveloperName": "Account_Update",
            "ActiveVersionId": "301000000000002AAA",
            "LatestVersionId": "301000000000003AAA",
            "ActiveVersion": {
                "MasterLabel": "Account Update",
                "ProcessType": "AutoLaunchedFlow",
                "LastModifiedDate": "2024-01-15T10:30:00.000+0000"
            },
            "LatestVersion": { "MasterLabel": "Account Update (draft)", "ProcessType": "Flow" },
            "CreatedDate": "2023-01-01T00:00:00.000+0000"
        });
        let records = flow_records_from_values(vec![raw]);
        let r = &records[0];
        assert!(r.is_active);
        assert_eq!(r.developer_name_url, "/300000000000001AAA");
        assert_eq!(r.master_label, "Account Update");
        assert_eq!(r.process_type, "AutoLaunchedFlow");
        assert_eq!(r.version_id.as_deref(), Some("301000000000002AAA"));
        assert_eq!(r.last_modified_date, Some(datetime!(2024-01-15 10:30 UTC)));
    }

    #[test]
    fn inactive_flow_uses_latest_version_and_falls_back_on_dates() {
        let raw = json!({
            "Id": "300000000000009AAA",
            "DeveloperName": "Draft_Flow",
            "ActiveVersionId": null,
            "LatestVersionId": "301000000000010AAA",
            "LatestVersion": { "MasterLabel": "Draft Flow", "ProcessType": "Flow" },
            "CreatedDate": "2023-05-01T08:00:00Z"
        });
        let r = &flow_records_from_values(vec![raw])[0];
        assert!(!r.is_active);
        assert_eq!(r.master_label, "Draft Flow");
        assert_eq!(r.version_id.as_deref(), Some("301000000000010AAA"));
        assert_eq!(r.last_modified_date, Some(datetime!(2023-05-01 08:00 UTC)));
    }

    #[test]
    fn missing_versions_yield_empty_fields() {
        let raw = json!({ "Id": "300000000000011AAA", "DeveloperName": "Bare" });
        let r = &flow_records_from_values(vec![raw, json!("not a record")])[0];
        assert_eq!(r.master_label, "");
        assert_eq!(r.process_type, "");
        assert!(r.version_id.is_none());
        assert!(r.last_modified_date.is_none());
    }

    #[test]
    fn metadata_record_requires_full_name() {
        let ok = flow_metadata_from_value(json!({
            "Id": "301000000000002AAA",
            "FullName": "Account_Update-3",
            "Metadata": { "processType": "AutoLaunchedFlow" }
        }))
        .expect("metadata");
        assert_eq!(ok.name, "Account_Update-3");
        assert_eq!(ok.metadata["processType"], "AutoLaunchedFlow");

        assert!(flow_metadata_from_value(json!({ "Metadata": {} })).is_err());
    }
}
