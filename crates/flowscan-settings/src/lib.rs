//! Config parsing and resolution.
//!
//! This crate is intentionally IO-free: it parses and resolves configuration provided as strings.

#![forbid(unsafe_code)]

mod defaults;
mod model;
mod resolve;

pub use defaults::{DEFAULT_REPORT_TITLE, MAX_SEARCH_LIMIT, SCHEMA_CONFIG_V1};
pub use model::{ExportConfig, FlowscanConfigV1, OverrideEntry};
pub use resolve::{Overrides, ResolvedConfig};

/// Parse `flowscan.toml` (or equivalent) into a typed model.
pub fn parse_config_toml(input: &str) -> anyhow::Result<FlowscanConfigV1> {
    let cfg: FlowscanConfigV1 = toml::from_str(input)?;
    Ok(cfg)
}

/// Resolve the effective config (CLI overrides > file values > defaults).
pub fn resolve_config(
    cfg: FlowscanConfigV1,
    overrides: Overrides,
) -> anyhow::Result<ResolvedConfig> {
    resolve::resolve_config(cfg, overrides)
}
