//! The `configure` use case: build the rule configuration a scan runs with.

use crate::error::{AppError, RetrievalOp, error_chain};
use crate::ports::{OverrideStore, RuleCatalogProvider};
use flowscan_domain::resolve::{ResolveWarning, merge};
use flowscan_types::{RuleDefinition, RuleOptions, Severity};
use tracing::{debug, warn};

/// A user-requested change to one rule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuleEdit {
    pub rule_name: String,
    pub is_active: Option<bool>,
    pub severity: Option<Severity>,
}

impl RuleEdit {
    pub fn enable(rule_name: impl Into<String>) -> Self {
        Self {
            rule_name: rule_name.into(),
            is_active: Some(true),
            severity: None,
        }
    }

    pub fn disable(rule_name: impl Into<String>) -> Self {
        Self {
            rule_name: rule_name.into(),
            is_active: Some(false),
            severity: None,
        }
    }

    pub fn severity(rule_name: impl Into<String>, severity: Severity) -> Self {
        Self {
            rule_name: rule_name.into(),
            is_active: None,
            severity: Some(severity),
        }
    }
}

#[derive(Debug)]
pub struct RuleConfiguration {
    /// Rules in catalog order, as shown to the user.
    pub rules: Vec<RuleDefinition>,
    /// Every known rule; inactive ones carry `disabled: true`.
    pub options: RuleOptions,
    pub warnings: Vec<ResolveWarning>,
    /// Set when stored overrides could not be fetched and catalog defaults
    /// were used in their place.
    pub overrides_error: Option<AppError>,
}

impl RuleConfiguration {
    pub fn active_count(&self) -> usize {
        self.rules.iter().filter(|r| r.is_active).count()
    }
}

/// Fetch the catalog and stored overrides, then merge them with `edits`.
///
/// A missing catalog is fatal. A failing override store is not: the rules fall
/// back to catalog defaults and the failure is returned alongside.
pub async fn resolve_configuration(
    catalog: &dyn RuleCatalogProvider,
    store: &dyn OverrideStore,
    edits: &[RuleEdit],
) -> Result<RuleConfiguration, AppError> {
    let catalog_rules = catalog.rule_catalog()?;
    debug!(rules = catalog_rules.len(), "loaded rule catalog");

    let (overrides, overrides_error) = match store.fetch_stored_overrides().await {
        Ok(records) => {
            debug!(overrides = records.len(), "loaded stored overrides");
            (records, None)
        }
        Err(err) => {
            let err = AppError::retrieval(RetrievalOp::StoredOverrides, err);
            warn!(error = %error_chain(&err), "using catalog defaults");
            (Vec::new(), Some(err))
        }
    };

    let base = merge(&catalog_rules, &overrides, None);
    let resolved = if edits.is_empty() {
        base
    } else {
        let user_edits = apply_edits(&base.rules, edits);
        merge(&catalog_rules, &overrides, Some(&user_edits))
    };

    for w in &resolved.warnings {
        warn!("{w}");
    }

    Ok(RuleConfiguration {
        rules: resolved.rules,
        options: resolved.options,
        warnings: resolved.warnings,
        overrides_error,
    })
}

/// The edited rule list, as a UI would submit it: the current rules with the
/// requested changes applied, plus an entry for each edit naming an unknown rule.
fn apply_edits(current: &[RuleDefinition], edits: &[RuleEdit]) -> Vec<RuleDefinition> {
    let mut out = current.to_vec();
    for edit in edits {
        let target = match out.iter().position(|r| r.name == edit.rule_name) {
            Some(i) => &mut out[i],
            None => {
                out.push(RuleDefinition::new(
                    edit.rule_name.clone(),
                    edit.severity.unwrap_or(Severity::Warning),
                ));
                let last = out.len() - 1;
                &mut out[last]
            }
        };
        if let Some(active) = edit.is_active {
            target.is_active = active;
        }
        if let Some(severity) = edit.severity {
            target.severity = severity;
        }
    }
    out
}
