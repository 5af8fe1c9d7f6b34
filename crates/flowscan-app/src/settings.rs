//! Loading the effective configuration.

use anyhow::Context;
use flowscan_settings::{FlowscanConfigV1, Overrides, ResolvedConfig};

/// Parse and resolve config text. Empty text means "all defaults".
pub fn load_settings(config_text: &str, overrides: Overrides) -> anyhow::Result<ResolvedConfig> {
    let cfg = if config_text.trim().is_empty() {
        FlowscanConfigV1::default()
    } else {
        flowscan_settings::parse_config_toml(config_text).context("parse config")?
    };
    flowscan_settings::resolve_config(cfg, overrides).context("resolve config")
}
