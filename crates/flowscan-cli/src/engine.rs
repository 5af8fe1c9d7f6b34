//! The external scanner, driven as a child process.
//!
//! `<program> [args..] rules` prints the rule catalog as JSON.
//! `<program> [args..] scan` reads `{ "flows": [...], "options": {...} }` on
//! stdin and prints one scan result per flow.

use anyhow::Context;
use camino::Utf8PathBuf;
use flowscan_app::{CatalogError, ParsedFlow, RuleCatalogProvider, ScanEngine, ScanEngineError};
use flowscan_types::{RuleDefinition, RuleOptions, ScanResult};
use serde::Serialize;
use std::io::Write;
use std::process::{Command, Output, Stdio};
use std::time::Instant;
use tracing::debug;

#[derive(Serialize)]
struct ScanRequest<'a> {
    flows: &'a [ParsedFlow],
    options: &'a RuleOptions,
}

enum RunError {
    /// The program could not be started.
    Spawn(String),
    /// It ran and exited unsuccessfully.
    Exit(String),
}

pub struct CommandEngine {
    program: String,
    args: Vec<String>,
}

impl CommandEngine {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    fn run(&self, subcommand: &str, input: Option<Vec<u8>>) -> Result<Vec<u8>, RunError> {
        let started = Instant::now();
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(subcommand)
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| RunError::Spawn(format!("{}: {e}", self.program)))?;

        // The child may fill stdout before it drains stdin.
        let writer = match (input, child.stdin.take()) {
            (Some(bytes), Some(mut stdin)) => {
                Some(std::thread::spawn(move || stdin.write_all(&bytes)))
            }
            _ => None,
        };

        let output = child
            .wait_with_output()
            .map_err(|e| RunError::Exit(format!("{}: {e}", self.program)))?;
        if let Some(writer) = writer {
            match writer.join() {
                Ok(Ok(())) => {}
                Ok(Err(e)) if output.status.success() => {
                    return Err(RunError::Exit(format!("write scan request: {e}")));
                }
                _ => {}
            }
        }
        debug!(
            program = %self.program,
            subcommand,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "engine call finished"
        );
        check_status(&self.program, subcommand, output)
    }
}

fn check_status(program: &str, subcommand: &str, output: Output) -> Result<Vec<u8>, RunError> {
    if output.status.success() {
        return Ok(output.stdout);
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    Err(RunError::Exit(if stderr.is_empty() {
        format!("`{program} {subcommand}` exited with {}", output.status)
    } else {
        format!("`{program} {subcommand}` exited with {}: {stderr}", output.status)
    }))
}

impl RuleCatalogProvider for CommandEngine {
    fn rule_catalog(&self) -> Result<Vec<RuleDefinition>, CatalogError> {
        let stdout = self.run("rules", None).map_err(|e| match e {
            RunError::Spawn(msg) | RunError::Exit(msg) => CatalogError::Unavailable(msg),
        })?;
        serde_json::from_slice(&stdout).map_err(|e| CatalogError::Malformed(e.to_string()))
    }
}

impl ScanEngine for CommandEngine {
    fn scan(
        &self,
        flows: &[ParsedFlow],
        options: &RuleOptions,
    ) -> Result<Vec<ScanResult>, ScanEngineError> {
        let request = serde_json::to_vec(&ScanRequest { flows, options })
            .map_err(|e| ScanEngineError::Failed(format!("encode scan request: {e}")))?;
        let stdout = self.run("scan", Some(request)).map_err(|e| match e {
            RunError::Spawn(msg) => ScanEngineError::Unavailable(msg),
            RunError::Exit(msg) => ScanEngineError::Failed(msg),
        })?;
        let results: Vec<ScanResult> = serde_json::from_slice(&stdout)
            .map_err(|e| ScanEngineError::Malformed(e.to_string()))?;
        if results.len() != flows.len() {
            return Err(ScanEngineError::Malformed(format!(
                "expected {} result(s), got {}",
                flows.len(),
                results.len()
            )));
        }
        Ok(results)
    }
}

/// A rule catalog read from a JSON file.
pub struct CatalogFile {
    path: Utf8PathBuf,
}

impl CatalogFile {
    pub fn new(path: Utf8PathBuf) -> Self {
        Self { path }
    }

    fn read(&self) -> anyhow::Result<String> {
        std::fs::read_to_string(&self.path).with_context(|| format!("read {}", self.path))
    }
}

impl RuleCatalogProvider for CatalogFile {
    fn rule_catalog(&self) -> Result<Vec<RuleDefinition>, CatalogError> {
        let text = self
            .read()
            .map_err(|e| CatalogError::Unavailable(format!("{e:#}")))?;
        serde_json::from_str(&text)
            .map_err(|e| CatalogError::Malformed(format!("{}: {e}", self.path)))
    }
}
