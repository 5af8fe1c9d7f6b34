/// Stable schema identifier for `flowscan.toml`.
pub const SCHEMA_CONFIG_V1: &str = "flowscan.config.v1";

/// Title of the printable report when none is configured.
pub const DEFAULT_REPORT_TITLE: &str = "Flow Scan Report";

/// Upper bound accepted for `search_limit` (SOQL `LIMIT` on a single page).
pub const MAX_SEARCH_LIMIT: u32 = 2000;
