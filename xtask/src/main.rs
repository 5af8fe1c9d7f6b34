//! Developer tasks (schema generation, contract fixtures).
//!
//! Keeping this separate avoids bloating the end-user CLI.

use anyhow::{Context, bail};
use flowscan_app::{ProjectionSource, export_csv, parse_scan_results, project_violations};
use flowscan_types::DEFAULT_COLUMNS;
use schemars::schema_for;
use std::fs;
use std::path::{Path, PathBuf};

/// Get the project root (parent of xtask directory).
fn project_root() -> PathBuf {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR")
        .map(PathBuf::from)
        .or_else(|_| std::env::current_dir())
        .unwrap_or_else(|_| PathBuf::from("."));

    if manifest_dir.ends_with("xtask") {
        manifest_dir
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or(manifest_dir)
    } else {
        manifest_dir
    }
}

/// `schemas/` under the project root, or `FLOWSCAN_SCHEMAS_DIR` when set.
fn schemas_dir() -> PathBuf {
    std::env::var_os("FLOWSCAN_SCHEMAS_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| project_root().join("schemas"))
}

fn contracts_fixtures_dir() -> PathBuf {
    project_root().join("contracts").join("fixtures")
}

/// Schema definition with its target filename.
struct SchemaSpec {
    filename: &'static str,
    generate: fn() -> schemars::Schema,
}

fn generate_scan_results_schema() -> schemars::Schema {
    schema_for!(flowscan_types::ScanResultsArtifact)
}

fn generate_config_schema() -> schemars::Schema {
    schema_for!(flowscan_settings::FlowscanConfigV1)
}

fn generate_rule_catalog_schema() -> schemars::Schema {
    schema_for!(Vec<flowscan_types::RuleDefinition>)
}

fn schema_specs() -> Vec<SchemaSpec> {
    vec![
        SchemaSpec {
            filename: "flowscan.scan-results.v1.json",
            generate: generate_scan_results_schema,
        },
        SchemaSpec {
            filename: "flowscan.config.v1.json",
            generate: generate_config_schema,
        },
        SchemaSpec {
            filename: "flowscan.rule-catalog.v1.json",
            generate: generate_rule_catalog_schema,
        },
    ]
}

/// Serialize a schema to pretty-printed JSON with trailing newline.
fn serialize_schema(schema: &schemars::Schema) -> anyhow::Result<String> {
    let mut json = serde_json::to_string_pretty(schema).context("Failed to serialize schema")?;
    json.push('\n');
    Ok(json)
}

fn emit_schemas() -> anyhow::Result<()> {
    let dir = schemas_dir();
    fs::create_dir_all(&dir).context("Failed to create schemas directory")?;

    for spec in schema_specs() {
        let json = serialize_schema(&(spec.generate)())?;
        let path = dir.join(spec.filename);
        fs::write(&path, &json)
            .with_context(|| format!("Failed to write schema to {}", path.display()))?;
        println!("Wrote {}", path.display());
    }

    println!("\nSchemas emitted successfully.");
    Ok(())
}

/// Validate that schemas in the repo match what would be generated.
fn validate_schemas() -> anyhow::Result<()> {
    let dir = schemas_dir();
    let mut missing = Vec::new();
    let mut mismatched = Vec::new();

    for spec in schema_specs() {
        let path = dir.join(spec.filename);
        if !path.exists() {
            missing.push(spec.filename);
            continue;
        }
        let expected = serialize_schema(&(spec.generate)())?;
        let actual = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if expected != actual {
            mismatched.push(spec.filename);
        }
    }

    if missing.is_empty() && mismatched.is_empty() {
        println!("All schemas are up to date.");
        return Ok(());
    }
    if !missing.is_empty() {
        eprintln!("Missing schemas:");
        for name in &missing {
            eprintln!("  - {}", name);
        }
    }
    if !mismatched.is_empty() {
        eprintln!("Schemas out of date:");
        for name in &mismatched {
            eprintln!("  - {}", name);
        }
    }
    eprintln!("\nRun `cargo xtask emit-schemas` to regenerate.");
    bail!("Schema validation failed")
}

/// Validate contract fixtures.
///
/// Every `*.scan-results.json` under `contracts/fixtures/` must:
/// 1. validate against the generated scan-results schema,
/// 2. load through the report pipeline,
/// 3. export to exactly the sibling `*.expected.csv`, when one exists.
fn conform() -> anyhow::Result<()> {
    let schema_value = serde_json::to_value(generate_scan_results_schema())
        .context("Failed to convert schema to JSON")?;
    let compiled = jsonschema::validator_for(&schema_value)
        .map_err(|e| anyhow::anyhow!("Failed to compile schema: {}", e))?;

    let fixtures_dir = contracts_fixtures_dir();
    if !fixtures_dir.exists() {
        bail!("contracts/fixtures/ not found at {}", fixtures_dir.display());
    }

    let mut paths: Vec<PathBuf> = fs::read_dir(&fixtures_dir)
        .context("Failed to read contracts/fixtures/")?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(".scan-results.json"))
        })
        .collect();
    paths.sort();

    let mut errors = Vec::new();
    for path in &paths {
        let filename = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read {}", filename))?;
        let value: serde_json::Value = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {} as JSON", filename))?;

        for err in compiled.iter_errors(&value) {
            errors.push(format!("{}: schema validation: {}", filename, err));
        }

        let artifact = match parse_scan_results(&content) {
            Ok(artifact) => artifact,
            Err(err) => {
                errors.push(format!("{}: {:#}", filename, err));
                continue;
            }
        };

        let golden = path.with_file_name(filename.replace(".scan-results.json", ".expected.csv"));
        if golden.exists() {
            let rows = project_violations(ProjectionSource::Batch(&artifact.results));
            let actual = export_csv(&rows, &DEFAULT_COLUMNS);
            let expected = fs::read_to_string(&golden)
                .with_context(|| format!("Failed to read {}", golden.display()))?;
            if actual != expected.trim_end_matches('\n') {
                errors.push(format!("{}: CSV export differs from golden file", filename));
            } else {
                println!("  ✓ {} matches golden CSV", filename);
            }
        } else {
            println!("  ✓ {} is valid (no golden file)", filename);
        }
    }

    if paths.is_empty() {
        bail!("no *.scan-results.json fixtures in {}", fixtures_dir.display());
    }
    if !errors.is_empty() {
        eprintln!("\nConformance errors:");
        for err in &errors {
            eprintln!("  - {}", err);
        }
        bail!("Conformance validation failed with {} errors", errors.len());
    }

    println!("\n✓ {} fixture(s) conform", paths.len());
    Ok(())
}

fn print_help() {
    eprintln!("xtask commands:");
    eprintln!("  help              Show this message");
    eprintln!("  emit-schemas      Generate JSON schemas from Rust types to schemas/");
    eprintln!("  validate-schemas  Check if schemas/ matches generated output (for CI)");
    eprintln!("  print-schema-ids  Print known schema IDs");
    eprintln!("  conform           Validate contract fixtures and their golden CSV exports");
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let cmd = args.get(1).map(|s| s.as_str()).unwrap_or("help");

    match cmd {
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        "emit-schemas" => emit_schemas(),
        "validate-schemas" => validate_schemas(),
        "conform" => conform(),
        "print-schema-ids" => {
            for spec in schema_specs() {
                println!("{}", spec.filename.trim_end_matches(".json"));
            }
            Ok(())
        }
        other => bail!("unknown xtask command: {other}\n\nRun `cargo xtask help` for usage."),
    }
    .context("xtask failed")
}
