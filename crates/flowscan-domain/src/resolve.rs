//! Rule configuration resolution.
//!
//! Three sources are merged in a fixed order, each stage consuming the previous
//! snapshot and producing a new one:
//!
//! 1. catalog defaults (the set of known rules)
//! 2. stored overrides (severity, expression, disabled)
//! 3. user edits (active flag and severity)
//!
//! The final snapshot yields both the UI-facing rule list and the full
//! [`RuleOptions`], inactive rules included.

use flowscan_types::{OverrideRecord, RuleConfig, RuleDefinition, RuleOptions, Severity};
use std::collections::BTreeMap;
use std::fmt;

/// Precedence stage a snapshot was produced by. Later stages win.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum MergeStage {
    CatalogDefaults,
    StoredOverrides,
    UserEdits,
}

/// Non-fatal problem found while merging. The offending entry is skipped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolveWarning {
    DuplicateCatalogRule { rule_name: String },
    EmptyOverrideRuleName,
    UnknownOverrideRule { rule_name: String },
    InvalidOverrideSeverity { rule_name: String, value: String },
    UnknownUserEditRule { rule_name: String },
}

impl fmt::Display for ResolveWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveWarning::DuplicateCatalogRule { rule_name } => {
                write!(f, "catalog lists rule '{rule_name}' more than once; keeping the first")
            }
            ResolveWarning::EmptyOverrideRuleName => {
                write!(f, "override entry without a rule name ignored")
            }
            ResolveWarning::UnknownOverrideRule { rule_name } => {
                write!(f, "override for unknown rule '{rule_name}' ignored")
            }
            ResolveWarning::InvalidOverrideSeverity { rule_name, value } => write!(
                f,
                "override severity '{value}' for rule '{rule_name}' ignored (expected info|warning|error)"
            ),
            ResolveWarning::UnknownUserEditRule { rule_name } => {
                write!(f, "edit for unknown rule '{rule_name}' ignored")
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct RuleEntry {
    definition: RuleDefinition,
    /// Only stored overrides carry expressions.
    expression: Option<String>,
}

/// Name-keyed rule state after a merge stage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuleSnapshot {
    stage: MergeStage,
    /// Catalog order, used for the UI-facing rule list.
    order: Vec<String>,
    entries: BTreeMap<String, RuleEntry>,
}

impl RuleSnapshot {
    /// Stage 1: every catalog rule becomes known, active, at its catalog severity.
    pub fn from_catalog(catalog: &[RuleDefinition], warnings: &mut Vec<ResolveWarning>) -> Self {
        let mut order = Vec::with_capacity(catalog.len());
        let mut entries = BTreeMap::new();

        for rule in catalog {
            if entries.contains_key(&rule.name) {
                warnings.push(ResolveWarning::DuplicateCatalogRule {
                    rule_name: rule.name.clone(),
                });
                continue;
            }
            order.push(rule.name.clone());
            entries.insert(
                rule.name.clone(),
                RuleEntry {
                    definition: RuleDefinition {
                        is_active: true,
                        ..rule.clone()
                    },
                    expression: None,
                },
            );
        }

        Self {
            stage: MergeStage::CatalogDefaults,
            order,
            entries,
        }
    }

    /// Stage 2: apply stored overrides. Entries for unknown rules are dropped.
    pub fn apply_overrides(
        self,
        overrides: &[OverrideRecord],
        warnings: &mut Vec<ResolveWarning>,
    ) -> Self {
        let Self {
            order, mut entries, ..
        } = self;

        for record in overrides {
            if record.rule_name.is_empty() {
                warnings.push(ResolveWarning::EmptyOverrideRuleName);
                continue;
            }
            let Some(entry) = entries.get_mut(&record.rule_name) else {
                warnings.push(ResolveWarning::UnknownOverrideRule {
                    rule_name: record.rule_name.clone(),
                });
                continue;
            };

            if let Some(raw) = record.severity.as_deref().filter(|s| !s.is_empty()) {
                match Severity::parse(raw) {
                    Some(severity) => entry.definition.severity = severity,
                    None => warnings.push(ResolveWarning::InvalidOverrideSeverity {
                        rule_name: record.rule_name.clone(),
                        value: raw.to_string(),
                    }),
                }
            }
            if let Some(expression) = record.expression.as_deref().filter(|s| !s.is_empty()) {
                entry.expression = Some(expression.to_string());
            }
            if let Some(disabled) = record.disabled {
                entry.definition.is_active = !disabled;
            }
        }

        Self {
            stage: MergeStage::StoredOverrides,
            order,
            entries,
        }
    }

    /// Stage 3: user edits replace active flag and severity. Expressions survive.
    pub fn apply_user_edits(
        self,
        edits: &[RuleDefinition],
        warnings: &mut Vec<ResolveWarning>,
    ) -> Self {
        let Self {
            order, mut entries, ..
        } = self;

        for edit in edits {
            match entries.get_mut(&edit.name) {
                Some(entry) => {
                    entry.definition.is_active = edit.is_active;
                    entry.definition.severity = edit.severity;
                }
                None => warnings.push(ResolveWarning::UnknownUserEditRule {
                    rule_name: edit.name.clone(),
                }),
            }
        }

        Self {
            stage: MergeStage::UserEdits,
            order,
            entries,
        }
    }

    pub fn stage(&self) -> MergeStage {
        self.stage
    }

    /// UI-facing rules in catalog order.
    pub fn rules(&self) -> Vec<RuleDefinition> {
        self.order
            .iter()
            .filter_map(|name| self.entries.get(name))
            .map(|e| e.definition.clone())
            .collect()
    }

    /// Full configuration state: every known rule, `disabled: true` on inactive ones.
    pub fn options(&self) -> RuleOptions {
        let rules = self
            .entries
            .iter()
            .map(|(name, entry)| {
                (
                    name.clone(),
                    RuleConfig {
                        severity: entry.definition.severity,
                        expression: entry.expression.clone(),
                        disabled: (!entry.definition.is_active).then_some(true),
                    },
                )
            })
            .collect();
        RuleOptions { rules }
    }
}

/// Result of [`merge`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedRules {
    pub rules: Vec<RuleDefinition>,
    pub options: RuleOptions,
    pub warnings: Vec<ResolveWarning>,
}

impl ResolvedRules {
    pub fn active_count(&self) -> usize {
        self.rules.iter().filter(|r| r.is_active).count()
    }
}

/// Merge catalog defaults, stored overrides and (optionally) user edits.
///
/// Never fails: an empty catalog yields an empty configuration, and entries that
/// reference unknown rules or carry unparseable values are reported as warnings.
pub fn merge(
    catalog: &[RuleDefinition],
    overrides: &[OverrideRecord],
    user_edits: Option<&[RuleDefinition]>,
) -> ResolvedRules {
    let mut warnings = Vec::new();

    let mut snapshot =
        RuleSnapshot::from_catalog(catalog, &mut warnings).apply_overrides(overrides, &mut warnings);
    if let Some(edits) = user_edits {
        snapshot = snapshot.apply_user_edits(edits, &mut warnings);
    }

    ResolvedRules {
        rules: snapshot.rules(),
        options: snapshot.options(),
        warnings,
    }
}

/// Express a resolved configuration as override records, e.g. to persist UI edits.
///
/// Merging these records over the same catalog reproduces the same options.
pub fn overrides_from_resolved(resolved: &ResolvedRules) -> Vec<OverrideRecord> {
    resolved
        .rules
        .iter()
        .map(|rule| OverrideRecord {
            rule_name: rule.name.clone(),
            severity: Some(rule.severity.as_str().to_string()),
            expression: resolved
                .options
                .get(&rule.name)
                .and_then(|cfg| cfg.expression.clone()),
            disabled: Some(!rule.is_active),
        })
        .collect()
}
