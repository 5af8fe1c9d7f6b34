//! CLI entry point for flowscan.
//!
//! This module is intentionally thin: it handles argument parsing, I/O, and exit codes.
//! All business logic lives in the `flowscan-app` crate.

mod engine;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand, ValueEnum};
use engine::{CatalogFile, CommandEngine};
use flowscan_app::{
    FlowSource, LocalSource, OrgSource, OverrideStore, ProjectionSource, RuleCatalogProvider,
    RuleConfiguration, RuleEdit, ScanSequence, StaticOverrides, error_chain, export_csv,
    export_html, list_flows, load_settings, parse_scan_results, project_violations,
    query_violations, resolve_configuration, scan_flow_records, select_flows,
    serialize_scan_results, sort_from_clicks, write_text,
};
use flowscan_domain::flows::FlowListQuery;
use flowscan_domain::query::ViolationFilter;
use flowscan_org::{LocalFlowSource, OrgClient, OrgConfig};
use flowscan_render::ReportMeta;
use flowscan_settings::{Overrides, ResolvedConfig};
use flowscan_types::{FlowRecord, Severity};
use futures::executor::block_on;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{debug, info, warn};

const ACCESS_TOKEN_ENV: &str = "FLOWSCAN_ACCESS_TOKEN";

#[derive(Parser, Debug)]
#[command(
    name = "flowscan",
    version,
    about = "Rule configuration, batch scanning and violation reports for flows"
)]
struct Cli {
    /// Path to flowscan config TOML (a missing file means defaults).
    #[arg(long, default_value = "flowscan.toml")]
    config: Utf8PathBuf,

    /// Rule catalog JSON file. Defaults to asking the engine (`<engine> rules`).
    #[arg(long)]
    catalog: Option<Utf8PathBuf>,

    /// Scanner program.
    #[arg(long)]
    engine: Option<String>,

    /// Extra argument passed to the scanner program before its subcommand.
    #[arg(long = "engine-arg", allow_hyphen_values = true)]
    engine_args: Vec<String>,

    /// Directory of exported flow JSON files.
    #[arg(long)]
    flows_dir: Option<Utf8PathBuf>,

    /// Org instance URL (overrides the config file).
    #[arg(long)]
    instance_url: Option<String>,

    /// Org access token. Falls back to $FLOWSCAN_ACCESS_TOKEN.
    #[arg(long)]
    access_token: Option<String>,

    /// API version, e.g. 60.0 (overrides the config file).
    #[arg(long)]
    api_version: Option<String>,

    /// Maximum number of flows a search returns (overrides the config file).
    #[arg(long)]
    search_limit: Option<u32>,

    /// Log progress (info level).
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Log everything (debug level).
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the resolved rule configuration.
    Rules {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        rules: RuleArgs,
    },

    /// List flows from the configured source.
    Flows {
        /// Server-side name search.
        #[arg(long)]
        search: Option<String>,

        /// Narrow to labels or developer names containing this text.
        #[arg(long)]
        name: Option<String>,

        /// Only active flows.
        #[arg(long)]
        active_only: bool,

        /// Narrow to process types containing this text.
        #[arg(long = "type")]
        process_type: Option<String>,

        /// Sort column; repeat to toggle the direction.
        #[arg(long = "sort")]
        sort: Vec<String>,

        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Scan flows and write a scan-results artifact.
    Scan {
        /// Server-side name search selecting the flows to scan.
        #[arg(long)]
        search: Option<String>,

        /// Scan only this flow (developer name or label); repeatable.
        #[arg(long = "flow")]
        flows: Vec<String>,

        /// Where to write the scan results.
        #[arg(long, default_value = "artifacts/flowscan/scan-results.json")]
        out: Utf8PathBuf,

        #[command(flatten)]
        rules: RuleArgs,
    },

    /// Filter, sort and export violations from a scan-results artifact.
    Report {
        /// Path to the scan-results JSON.
        #[arg(long, default_value = "artifacts/flowscan/scan-results.json")]
        results: Utf8PathBuf,

        /// Keep rows whose flow name contains this text.
        #[arg(long)]
        flow_filter: Option<String>,

        /// Keep rows where any rule/element field contains this text.
        #[arg(long)]
        filter: Option<String>,

        /// Sort column; repeat to toggle the direction.
        #[arg(long = "sort")]
        sort: Vec<String>,

        #[arg(long, value_enum, default_value = "csv")]
        format: ReportFormat,

        /// Where to write the export (if not specified, prints to stdout).
        #[arg(long, short)]
        output: Option<Utf8PathBuf>,
    },
}

#[derive(Args, Debug)]
struct RuleArgs {
    /// Where stored overrides come from. Defaults to the org when one is
    /// configured, otherwise the config file.
    #[arg(long, value_enum)]
    overrides_from: Option<OverridesFrom>,

    /// Activate a rule for this run; repeatable.
    #[arg(long = "enable", value_name = "RULE")]
    enable: Vec<String>,

    /// Deactivate a rule for this run; repeatable.
    #[arg(long = "disable", value_name = "RULE")]
    disable: Vec<String>,

    /// Change a rule's severity for this run, e.g. `MissingFaultPath=error`.
    #[arg(long = "rule-severity", value_name = "RULE=SEVERITY", value_parser = parse_rule_severity)]
    rule_severity: Vec<RuleEdit>,
}

impl RuleArgs {
    fn edits(&self) -> Vec<RuleEdit> {
        self.enable
            .iter()
            .map(RuleEdit::enable)
            .chain(self.disable.iter().map(RuleEdit::disable))
            .chain(self.rule_severity.iter().cloned())
            .collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OverridesFrom {
    Config,
    Org,
    None,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Csv,
    Html,
}

fn parse_rule_severity(value: &str) -> Result<RuleEdit, String> {
    let (rule, severity) = value
        .split_once('=')
        .ok_or_else(|| format!("expected RULE=SEVERITY, got `{value}`"))?;
    let rule = rule.trim();
    if rule.is_empty() {
        return Err(format!("missing rule name in `{value}`"));
    }
    let severity = Severity::parse(severity)
        .ok_or_else(|| format!("unknown severity `{severity}` (expected info, warning or error)"))?;
    Ok(RuleEdit::severity(rule, severity))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.debug);

    let settings = load_cli_settings(&cli)?;
    match &cli.cmd {
        Commands::Rules { json, rules } => cmd_rules(&cli, &settings, *json, rules),
        Commands::Flows {
            search,
            name,
            active_only,
            process_type,
            sort,
            json,
        } => {
            let mut query = FlowListQuery {
                active_only: *active_only,
                name_term: name.clone(),
                type_term: process_type.clone(),
                ..FlowListQuery::default()
            };
            query.sort = sort
                .iter()
                .fold(query.sort, |state, field| state.toggle(field));
            cmd_flows(&cli, &settings, search.as_deref(), &query, *json)
        }
        Commands::Scan {
            search,
            flows,
            out,
            rules,
        } => cmd_scan(&cli, &settings, search.as_deref(), flows, out, rules),
        Commands::Report {
            results,
            flow_filter,
            filter,
            sort,
            format,
            output,
        } => {
            let filter = ViolationFilter {
                flow_name_term: flow_filter.clone(),
                other_fields_term: filter.clone(),
            };
            cmd_report(&settings, results, &filter, sort, *format, output.as_deref())
        }
    }
}

fn init_logging(verbose: bool, debug: bool) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    debug!("Logging initialized at level: {}", level);
}

fn load_cli_settings(cli: &Cli) -> anyhow::Result<ResolvedConfig> {
    // Missing config file is allowed (defaults apply).
    let cfg_text = match std::fs::read_to_string(&cli.config) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e).with_context(|| format!("read config: {}", cli.config)),
    };
    let overrides = Overrides {
        api_version: cli.api_version.clone(),
        search_limit: cli.search_limit,
        instance_url: cli.instance_url.clone(),
        ..Overrides::default()
    };
    load_settings(&cfg_text, overrides)
}

/// The collaborators a command may need, built from flags and config.
struct Wiring {
    org: Option<OrgSource>,
    local: Option<LocalSource>,
    config_overrides: StaticOverrides,
    no_overrides: StaticOverrides,
}

impl Wiring {
    fn new(cli: &Cli, settings: &ResolvedConfig) -> anyhow::Result<Self> {
        let org = match &settings.instance_url {
            Some(instance_url) => {
                let access_token = cli
                    .access_token
                    .clone()
                    .or_else(|| std::env::var(ACCESS_TOKEN_ENV).ok())
                    .with_context(|| {
                        format!("--access-token or ${ACCESS_TOKEN_ENV} is required with an instance url")
                    })?;
                let client = OrgClient::new(OrgConfig {
                    instance_url: instance_url.clone(),
                    access_token,
                    api_version: settings.api_version.clone(),
                })?;
                Some(OrgSource::new(client, settings.search_limit))
            }
            None => None,
        };
        let local = match &cli.flows_dir {
            Some(dir) => Some(LocalSource::new(
                LocalFlowSource::new(dir.clone())?,
                settings.search_limit,
            )),
            None => None,
        };
        Ok(Self {
            org,
            local,
            config_overrides: StaticOverrides(settings.overrides.clone()),
            no_overrides: StaticOverrides::default(),
        })
    }

    /// Local files win over the org when both are configured.
    fn flow_source(&self) -> anyhow::Result<&dyn FlowSource> {
        if let Some(local) = &self.local {
            return Ok(local);
        }
        if let Some(org) = &self.org {
            return Ok(org);
        }
        anyhow::bail!("no flow source configured: pass --flows-dir or --instance-url")
    }

    fn override_store(&self, from: Option<OverridesFrom>) -> anyhow::Result<&dyn OverrideStore> {
        let from = from.unwrap_or(if self.org.is_some() {
            OverridesFrom::Org
        } else {
            OverridesFrom::Config
        });
        match from {
            OverridesFrom::Config => Ok(&self.config_overrides),
            OverridesFrom::None => Ok(&self.no_overrides),
            OverridesFrom::Org => match &self.org {
                Some(org) => Ok(org),
                None => anyhow::bail!("--overrides-from org requires --instance-url"),
            },
        }
    }
}

fn catalog_provider(cli: &Cli) -> anyhow::Result<Box<dyn RuleCatalogProvider>> {
    if let Some(path) = &cli.catalog {
        return Ok(Box::new(CatalogFile::new(path.clone())));
    }
    match &cli.engine {
        Some(program) => Ok(Box::new(CommandEngine::new(
            program.clone(),
            cli.engine_args.clone(),
        ))),
        None => anyhow::bail!("no rule catalog: pass --catalog or --engine"),
    }
}

fn report_configuration_warnings(cfg: &RuleConfiguration) {
    if let Some(err) = &cfg.overrides_error {
        eprintln!("flowscan: warning: {}; using catalog defaults", error_chain(err));
    }
    if !cfg.warnings.is_empty() {
        eprintln!("flowscan: {} override warning(s)", cfg.warnings.len());
    }
}

fn cmd_rules(
    cli: &Cli,
    settings: &ResolvedConfig,
    json: bool,
    args: &RuleArgs,
) -> anyhow::Result<()> {
    let wiring = Wiring::new(cli, settings)?;
    let catalog = catalog_provider(cli)?;
    let store = wiring.override_store(args.overrides_from)?;

    let cfg = block_on(resolve_configuration(catalog.as_ref(), store, &args.edits()))?;
    report_configuration_warnings(&cfg);

    if json {
        let value = serde_json::json!({
            "rules": cfg.rules,
            "options": cfg.options,
            "warnings": cfg.warnings.iter().map(ToString::to_string).collect::<Vec<_>>(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&value).context("serialize rules")?
        );
        return Ok(());
    }

    let width = cfg.rules.iter().map(|r| r.name.len()).max().unwrap_or(4).max(4);
    println!("{:<width$}  {:<8}  {:<6}  CATEGORY", "RULE", "SEVERITY", "ACTIVE");
    for rule in &cfg.rules {
        println!(
            "{:<width$}  {:<8}  {:<6}  {}",
            rule.name,
            rule.severity.as_str(),
            if rule.is_active { "yes" } else { "no" },
            rule.category
        );
    }
    println!("{} of {} rule(s) active", cfg.active_count(), cfg.rules.len());
    Ok(())
}

fn cmd_flows(
    cli: &Cli,
    settings: &ResolvedConfig,
    search: Option<&str>,
    query: &FlowListQuery,
    json: bool,
) -> anyhow::Result<()> {
    let wiring = Wiring::new(cli, settings)?;
    let records = block_on(list_flows(wiring.flow_source()?, search, query))?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&records).context("serialize flows")?
        );
        return Ok(());
    }
    for record in &records {
        println!("{}", flow_line(record));
    }
    Ok(())
}

fn flow_line(record: &FlowRecord) -> String {
    let modified = record
        .last_modified_date
        .and_then(|d| d.format(&Rfc3339).ok())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{}\t{}\t{}\t{}\t{}",
        record.developer_name,
        record.display_name(),
        record.process_type,
        if record.is_active { "active" } else { "inactive" },
        modified
    )
}

fn cmd_scan(
    cli: &Cli,
    settings: &ResolvedConfig,
    search: Option<&str>,
    names: &[String],
    out: &Utf8Path,
    args: &RuleArgs,
) -> anyhow::Result<()> {
    let wiring = Wiring::new(cli, settings)?;
    let catalog = catalog_provider(cli)?;
    let program = cli
        .engine
        .as_deref()
        .context("no scan engine: pass --engine")?;
    let engine = CommandEngine::new(program, cli.engine_args.clone());
    let source = wiring.flow_source()?;
    let store = wiring.override_store(args.overrides_from)?;

    let cfg = block_on(resolve_configuration(catalog.as_ref(), store, &args.edits()))?;
    report_configuration_warnings(&cfg);

    let listed = block_on(list_flows(source, search, &FlowListQuery::default()))?;
    let (selected, missing) = select_flows(&listed, names);
    for name in &missing {
        warn!(flow = %name, "no listed flow matches");
    }
    if selected.is_empty() {
        anyhow::bail!("no flows to scan");
    }
    info!(flows = selected.len(), rules = cfg.active_count(), "scanning");

    let sequence = ScanSequence::new();
    let output = block_on(scan_flow_records(
        source,
        &engine,
        &sequence,
        &selected,
        &cfg.options,
        &settings.api_version,
    ))?;

    let artifact = output.to_artifact(OffsetDateTime::now_utc());
    let text = serialize_scan_results(&artifact)?;
    write_text(out, &text).context("write scan results")?;

    for failure in &artifact.failures {
        eprintln!("flowscan: {} not scanned: {}", failure.flow_name, failure.error);
    }
    eprintln!(
        "flowscan: scanned {} flow(s) with {} rule(s): {} violation(s), {} failure(s)",
        artifact.results.len(),
        artifact.number_of_rules,
        artifact.violation_count(),
        artifact.failures.len()
    );
    Ok(())
}

fn cmd_report(
    settings: &ResolvedConfig,
    results: &Utf8Path,
    filter: &ViolationFilter,
    sort: &[String],
    format: ReportFormat,
    output: Option<&Utf8Path>,
) -> anyhow::Result<()> {
    let text =
        std::fs::read_to_string(results).with_context(|| format!("read scan results: {results}"))?;
    let artifact = parse_scan_results(&text)?;

    let rows = project_violations(ProjectionSource::Batch(&artifact.results));
    let rows = query_violations(&rows, filter, &sort_from_clicks(sort));
    debug!(rows = rows.len(), "queried violations");

    let rendered = match format {
        ReportFormat::Csv => export_csv(&rows, &settings.columns),
        ReportFormat::Html => export_html(
            &rows,
            &ReportMeta {
                title: settings.title.clone(),
                generated_at: artifact.generated_at,
                total_rules: artifact.number_of_rules,
            },
        ),
    };

    match output {
        Some(path) => write_text(path, &rendered).context("write report output")?,
        None => println!("{rendered}"),
    }
    Ok(())
}
