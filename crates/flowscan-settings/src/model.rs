use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// `flowscan.toml` schema v1.
///
/// This is a *user-facing* config model: it is intentionally permissive so forward-compat is easy.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FlowscanConfigV1 {
    /// Optional schema string for tooling (`flowscan.config.v1`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Tooling API version, e.g. `60.0`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    /// Maximum number of flow definitions returned by a search.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_limit: Option<u32>,

    /// Org instance URL, e.g. `https://example.my.salesforce.com`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_url: Option<String>,

    /// Locally stored rule overrides.
    #[serde(default)]
    pub overrides: Vec<OverrideEntry>,

    #[serde(default)]
    pub export: ExportConfig,
}

/// One `[[overrides]]` table.
///
/// Values are passed through unvalidated; bad entries surface as resolver warnings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OverrideEntry {
    pub rule_name: String,

    /// `info`, `warning` or `error` (case-insensitive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExportConfig {
    /// CSV column order, e.g. `["flowName", "ruleName", "severity"]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<String>>,

    /// Title of the printable HTML report.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}
