use crate::defaults::{DEFAULT_REPORT_TITLE, MAX_SEARCH_LIMIT, SCHEMA_CONFIG_V1};
use crate::model::FlowscanConfigV1;
use anyhow::Context;
use flowscan_types::ids::{DEFAULT_API_VERSION, DEFAULT_SEARCH_LIMIT};
use flowscan_types::{DEFAULT_COLUMNS, ExportColumn, OverrideRecord};
use std::collections::HashSet;

/// Values supplied on the command line. `Some` wins over the file.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub api_version: Option<String>,
    pub search_limit: Option<u32>,
    pub instance_url: Option<String>,
    pub columns: Option<Vec<String>>,
    pub title: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedConfig {
    pub api_version: String,
    pub search_limit: u32,
    pub instance_url: Option<String>,
    /// Raw override entries; validated later by the rule resolver.
    pub overrides: Vec<OverrideRecord>,
    pub columns: Vec<ExportColumn>,
    pub title: String,
}

pub fn resolve_config(
    cfg: FlowscanConfigV1,
    overrides: Overrides,
) -> anyhow::Result<ResolvedConfig> {
    if let Some(schema) = cfg.schema.as_deref() {
        if schema != SCHEMA_CONFIG_V1 {
            anyhow::bail!("unsupported config schema: {schema} (expected {SCHEMA_CONFIG_V1})");
        }
    }

    let api_version = overrides
        .api_version
        .or(cfg.api_version)
        .unwrap_or_else(|| DEFAULT_API_VERSION.to_string());
    validate_api_version(&api_version)?;

    let search_limit = overrides
        .search_limit
        .or(cfg.search_limit)
        .unwrap_or(DEFAULT_SEARCH_LIMIT);
    if search_limit == 0 || search_limit > MAX_SEARCH_LIMIT {
        anyhow::bail!("search_limit must be between 1 and {MAX_SEARCH_LIMIT}, got {search_limit}");
    }

    let instance_url = overrides
        .instance_url
        .or(cfg.instance_url)
        .map(|u| u.trim_end_matches('/').to_string());

    let columns = match overrides.columns.or(cfg.export.columns) {
        Some(names) => parse_columns(&names)?,
        None => DEFAULT_COLUMNS.to_vec(),
    };

    let title = overrides
        .title
        .or(cfg.export.title)
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_REPORT_TITLE.to_string());

    let overrides = cfg
        .overrides
        .into_iter()
        .map(|o| OverrideRecord {
            rule_name: o.rule_name,
            severity: o.severity,
            expression: o.expression,
            disabled: o.disabled,
        })
        .collect();

    Ok(ResolvedConfig {
        api_version,
        search_limit,
        instance_url,
        overrides,
        columns,
        title,
    })
}

fn validate_api_version(v: &str) -> anyhow::Result<()> {
    let valid = match v.split_once('.') {
        Some((major, minor)) => {
            !major.is_empty()
                && !minor.is_empty()
                && major.chars().all(|c| c.is_ascii_digit())
                && minor.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    };
    if !valid {
        anyhow::bail!("invalid api_version: {v} (expected e.g. '60.0')");
    }
    Ok(())
}

fn parse_columns(names: &[String]) -> anyhow::Result<Vec<ExportColumn>> {
    if names.is_empty() {
        anyhow::bail!("export.columns must name at least one column");
    }
    let mut seen = HashSet::new();
    let mut columns = Vec::with_capacity(names.len());
    for name in names {
        let column: ExportColumn = name
            .parse()
            .with_context(|| format!("invalid export column: {name}"))?;
        if !seen.insert(column) {
            anyhow::bail!("export column listed twice: {name}");
        }
        columns.push(column);
    }
    Ok(columns)
}
