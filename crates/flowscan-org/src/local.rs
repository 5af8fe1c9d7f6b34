//! Flow source backed by a directory of exported flow JSON files.
//!
//! Each file holds either `{ "name": "...", "metadata": { ... } }` or a bare
//! metadata object. Records are identified by their path relative to the root.

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use flowscan_types::{FlowMetadata, FlowRecord};
use globset::{Glob, GlobMatcher};
use serde_json::Value;
use time::OffsetDateTime;
use walkdir::WalkDir;

pub const DEFAULT_FLOW_PATTERN: &str = "**/*.json";

pub struct LocalFlowSource {
    root: Utf8PathBuf,
    include: GlobMatcher,
}

impl LocalFlowSource {
    pub fn new(root: impl Into<Utf8PathBuf>) -> anyhow::Result<Self> {
        Self::with_pattern(root, DEFAULT_FLOW_PATTERN)
    }

    /// Only files whose root-relative path matches `pattern` are flows.
    pub fn with_pattern(root: impl Into<Utf8PathBuf>, pattern: &str) -> anyhow::Result<Self> {
        let include = Glob::new(pattern)
            .with_context(|| format!("invalid flow file pattern: {pattern}"))?
            .compile_matcher();
        Ok(Self {
            root: root.into(),
            include,
        })
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Root-relative paths of all flow files, sorted.
    pub fn discover(&self) -> anyhow::Result<Vec<String>> {
        if !self.root.is_dir() {
            anyhow::bail!("flows directory not found: {}", self.root);
        }
        let mut out: Vec<String> = WalkDir::new(&self.root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| {
                let rel = e.path().strip_prefix(&self.root).ok()?;
                let rel = rel.to_str()?.replace('\\', "/");
                self.include.is_match(&rel).then_some(rel)
            })
            .collect();
        out.sort();
        Ok(out)
    }

    /// Listing of local flows, narrowed by a case-insensitive name search.
    pub fn list(&self, search_term: Option<&str>) -> anyhow::Result<Vec<FlowRecord>> {
        let term = search_term
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase);

        let mut records = Vec::new();
        for rel in self.discover()? {
            let abs = self.root.join(&rel);
            let text = std::fs::read_to_string(&abs).with_context(|| format!("read {abs}"))?;
            let flow = parse_flow_file(&file_stem(&rel), &text)
                .with_context(|| format!("parse {abs}"))?;
            let modified = std::fs::metadata(&abs)
                .and_then(|m| m.modified())
                .ok()
                .map(OffsetDateTime::from);
            let record = record_for(&rel, &flow, modified);

            let hit = term.as_deref().is_none_or(|t| {
                record.developer_name.to_lowercase().contains(t)
                    || record.master_label.to_lowercase().contains(t)
            });
            if hit {
                records.push(record);
            }
        }
        Ok(records)
    }

    /// Metadata of the flow stored at `version_id` (a root-relative path).
    pub fn metadata(&self, version_id: &str) -> anyhow::Result<FlowMetadata> {
        let rel = Utf8Path::new(version_id);
        if rel.is_absolute()
            || rel
                .components()
                .any(|c| matches!(c, camino::Utf8Component::ParentDir))
        {
            anyhow::bail!("flow path escapes the flows directory: {version_id}");
        }
        let abs = self.root.join(rel);
        let text = std::fs::read_to_string(&abs).with_context(|| format!("read {abs}"))?;
        parse_flow_file(&file_stem(version_id), &text).with_context(|| format!("parse {abs}"))
    }
}

/// Parse one flow file. The file stem names the flow when the file does not.
pub fn parse_flow_file(default_name: &str, text: &str) -> anyhow::Result<FlowMetadata> {
    let value: Value = serde_json::from_str(text).context("flow file is not valid JSON")?;
    let Value::Object(mut obj) = value else {
        anyhow::bail!("flow file must contain a JSON object");
    };

    if let Some(metadata) = obj.remove("metadata") {
        if !metadata.is_object() {
            anyhow::bail!("`metadata` must be a JSON object");
        }
        let name = obj
            .get("name")
            .and_then(Value::as_str)
            .filter(|n| !n.is_empty())
            .unwrap_or(default_name)
            .to_string();
        return Ok(FlowMetadata { name, metadata });
    }

    Ok(FlowMetadata {
        name: default_name.to_string(),
        metadata: Value::Object(obj),
    })
}

fn record_for(rel: &str, flow: &FlowMetadata, modified: Option<OffsetDateTime>) -> FlowRecord {
    let text = |key: &str| {
        flow.metadata
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    FlowRecord {
        id: rel.to_string(),
        developer_name: flow.name.clone(),
        developer_name_url: format!("/{rel}"),
        is_active: text("status").eq_ignore_ascii_case("active"),
        master_label: text("label"),
        process_type: text("processType"),
        last_modified_date: modified,
        version_id: Some(rel.to_string()),
    }
}

fn file_stem(rel: &str) -> String {
    let stem = Utf8Path::new(rel).file_stem().unwrap_or(rel);
    // `Account_Update.flow-meta.json` -> `Account_Update`
    stem.split('.').next().unwrap_or(stem).to_string()
}
