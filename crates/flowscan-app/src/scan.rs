//! The `scan` use cases: single flow, batch of prepared flows, batch of listed flows.

use crate::error::{AppError, RetrievalOp, ScanEngineError, error_chain};
use crate::ports::{FlowSource, ParsedFlow, ScanEngine};
use crate::sequence::{ScanSequence, ScanTicket};
use flowscan_domain::scan::{active_rules, dropped_rule_results, post_process};
use flowscan_types::ids::{TOOL_NAME, flow_version_uri};
use flowscan_types::{
    BatchFailure, BatchScanEntry, FlowInput, FlowRecord, RuleOptions, SCHEMA_SCAN_RESULTS_V1,
    ScanResult, ScanResultsArtifact, ToolMeta,
};
use futures::future::join_all;
use std::time::Instant;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

#[derive(Clone, Debug)]
pub struct SingleScanOutput {
    pub scan_result: ScanResult,
    /// Active rules sent to the engine.
    pub number_of_rules: u32,
    pub ticket: ScanTicket,
}

#[derive(Clone, Debug)]
pub struct BatchScanOutput {
    /// Successfully scanned flows, in input order.
    pub results: Vec<BatchScanEntry>,
    /// Flows left out, in input order.
    pub failures: Vec<BatchFailure>,
    pub number_of_rules: u32,
    pub ticket: ScanTicket,
}

impl BatchScanOutput {
    pub fn to_artifact(&self, generated_at: OffsetDateTime) -> ScanResultsArtifact {
        ScanResultsArtifact {
            schema: SCHEMA_SCAN_RESULTS_V1.to_string(),
            tool: ToolMeta {
                name: TOOL_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            generated_at,
            sequence: self.ticket.value(),
            number_of_rules: self.number_of_rules,
            results: self.results.clone(),
            failures: self.failures.clone(),
        }
    }
}

/// Scan one flow. Any engine failure fails the operation.
pub fn run_single_scan(
    engine: &dyn ScanEngine,
    sequence: &ScanSequence,
    flow: &FlowInput,
    options: &RuleOptions,
) -> Result<SingleScanOutput, AppError> {
    let ticket = sequence.next_ticket();
    let active = active_rules(options);

    let scan_result = scan_flow(engine, flow, &active).map_err(|e| scan_error(flow, e))?;

    Ok(SingleScanOutput {
        scan_result,
        number_of_rules: rule_count(&active),
        ticket,
    })
}

/// Scan prepared flows concurrently.
///
/// A flow whose scan fails is reported in `failures`. An unavailable engine
/// aborts the whole batch.
pub async fn run_batch_scan(
    engine: &dyn ScanEngine,
    sequence: &ScanSequence,
    flows: &[FlowInput],
    options: &RuleOptions,
) -> Result<BatchScanOutput, AppError> {
    let ticket = sequence.next_ticket();
    let active = active_rules(options);

    let outcomes = join_all(flows.iter().map(|flow| {
        let active = &active;
        async move { scan_flow(engine, flow, active).map_err(|e| scan_error(flow, e)) }
    }))
    .await;

    let mut results = Vec::new();
    let mut failures = Vec::new();
    for (flow, outcome) in flows.iter().zip(outcomes) {
        collect_outcome(flow, outcome, &mut results, &mut failures)?;
    }

    Ok(BatchScanOutput {
        results,
        failures,
        number_of_rules: rule_count(&active),
        ticket,
    })
}

/// Fetch metadata for listed flows and scan them, all flows concurrently.
///
/// Flows without a version, or whose metadata cannot be fetched, are reported
/// as failures next to scan failures.
pub async fn scan_flow_records(
    source: &dyn FlowSource,
    engine: &dyn ScanEngine,
    sequence: &ScanSequence,
    records: &[FlowRecord],
    options: &RuleOptions,
    api_version: &str,
) -> Result<BatchScanOutput, AppError> {
    let ticket = sequence.next_ticket();
    let active = active_rules(options);

    let outcomes = join_all(records.iter().map(|record| {
        let active = &active;
        async move {
            let input = prepare_flow(source, record, api_version).await?;
            let outcome = scan_flow(engine, &input, active).map_err(|e| scan_error(&input, e));
            Ok::<_, BatchFailure>((input, outcome))
        }
    }))
    .await;

    let mut results = Vec::new();
    let mut failures = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok((input, outcome)) => {
                collect_outcome(&input, outcome, &mut results, &mut failures)?
            }
            Err(failure) => {
                warn!(flow = %failure.flow_name, error = %failure.error, "flow not scanned");
                failures.push(failure);
            }
        }
    }

    Ok(BatchScanOutput {
        results,
        failures,
        number_of_rules: rule_count(&active),
        ticket,
    })
}

/// Resolve a listed flow into a scannable input.
async fn prepare_flow(
    source: &dyn FlowSource,
    record: &FlowRecord,
    api_version: &str,
) -> Result<FlowInput, BatchFailure> {
    let failure = |error: String| BatchFailure {
        flow_name: record.developer_name.clone(),
        flow_id: record.id.clone(),
        error,
    };
    let version_id = record
        .version_id
        .as_deref()
        .ok_or_else(|| failure("flow has no version to scan".to_string()))?;

    let flow = source
        .fetch_flow_metadata(version_id)
        .await
        .map_err(|e| {
            let err = AppError::retrieval(
                RetrievalOp::FlowMetadata {
                    version_id: version_id.to_string(),
                },
                e,
            );
            failure(error_chain(&err))
        })?;

    Ok(FlowInput {
        flow_name: flow.name,
        flow_id: record.id.clone(),
        metadata: flow.metadata,
        version_uri: flow_version_uri(api_version, version_id),
    })
}

fn scan_flow(
    engine: &dyn ScanEngine,
    flow: &FlowInput,
    active: &RuleOptions,
) -> Result<ScanResult, ScanEngineError> {
    let started = Instant::now();
    let raw = engine
        .scan(&[ParsedFlow::from(flow)], active)?
        .into_iter()
        .next()
        .ok_or_else(|| ScanEngineError::Malformed("no result returned for flow".to_string()))?;

    let dropped = dropped_rule_results(&raw, active);
    if dropped > 0 {
        debug!(flow = %flow.flow_name, dropped, "discarded results for inactive or unnamed rules");
    }
    let result = post_process(raw, active);
    info!(
        flow = %flow.flow_name,
        violations = result.violation_count(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "scanned flow"
    );
    Ok(result)
}

fn scan_error(flow: &FlowInput, source: ScanEngineError) -> AppError {
    match source {
        ScanEngineError::Unavailable(msg) => AppError::EngineUnavailable(msg),
        source => AppError::Scan {
            flow_name: flow.flow_name.clone(),
            source,
        },
    }
}

fn collect_outcome(
    flow: &FlowInput,
    outcome: Result<ScanResult, AppError>,
    results: &mut Vec<BatchScanEntry>,
    failures: &mut Vec<BatchFailure>,
) -> Result<(), AppError> {
    match outcome {
        Ok(scan_result) => results.push(BatchScanEntry {
            flow_name: flow.flow_name.clone(),
            flow_id: flow.flow_id.clone(),
            scan_result,
        }),
        Err(err) if err.is_fatal_for_batch() => return Err(err),
        Err(err) => {
            let error = error_chain(&err);
            warn!(flow = %flow.flow_name, error = %error, "flow excluded from batch");
            failures.push(BatchFailure {
                flow_name: flow.flow_name.clone(),
                flow_id: flow.flow_id.clone(),
                error,
            });
        }
    }
    Ok(())
}

fn rule_count(active: &RuleOptions) -> u32 {
    u32::try_from(active.len()).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowscan_types::{RuleConfig, RuleResult, Severity, ViolationDetail};
    use serde_json::json;
    use std::sync::Mutex;

    /// Returns one canned result per flow name and records what it was sent.
    struct Canned {
        results: Vec<(&'static str, Result<ScanResult, &'static str>)>,
        seen_rules: Mutex<Vec<usize>>,
    }

    impl ScanEngine for Canned {
        fn scan(
            &self,
            flows: &[ParsedFlow],
            options: &RuleOptions,
        ) -> Result<Vec<ScanResult>, ScanEngineError> {
            if let Ok(mut seen) = self.seen_rules.lock() {
                seen.push(options.len());
            }
            let mut out = Vec::new();
            for flow in flows {
                match self.results.iter().find(|(name, _)| *name == flow.name) {
                    Some((_, Ok(result))) => out.push(result.clone()),
                    Some((_, Err("unavailable"))) => {
                        return Err(ScanEngineError::Unavailable("engine gone".to_string()));
                    }
                    Some((_, Err(msg))) => return Err(ScanEngineError::Failed(msg.to_string())),
                    None => {}
                }
            }
            Ok(out)
        }
    }

    fn options() -> RuleOptions {
        let mut rules = std::collections::BTreeMap::new();
        rules.insert(
            "A".to_string(),
            RuleConfig {
                severity: Severity::Error,
                expression: None,
                disabled: None,
            },
        );
        rules.insert(
            "B".to_string(),
            RuleConfig {
                severity: Severity::Info,
                expression: None,
                disabled: Some(true),
            },
        );
        RuleOptions { rules }
    }

    fn result_for(rule: &str, details: usize) -> ScanResult {
        ScanResult {
            rule_results: vec![RuleResult {
                id: None,
                rule_name: Some(rule.to_string()),
                severity: Some("warning".to_string()),
                details: (0..details)
                    .map(|i| ViolationDetail {
                        name: Some(format!("el_{i}")),
                        ..ViolationDetail::default()
                    })
                    .collect(),
            }],
        }
    }

    fn input(name: &str) -> FlowInput {
        FlowInput {
            flow_name: name.to_string(),
            flow_id: format!("id-{name}"),
            metadata: json!({}),
            version_uri: flow_version_uri("60.0", "301000000000001AAA"),
        }
    }

    #[test]
    fn single_scan_sends_only_active_rules() {
        let engine = Canned {
            results: vec![("F1", Ok(result_for("A", 2)))],
            seen_rules: Mutex::new(Vec::new()),
        };
        let seq = ScanSequence::new();
        let out = run_single_scan(&engine, &seq, &input("F1"), &options()).expect("scan");

        assert_eq!(out.number_of_rules, 1);
        assert_eq!(out.ticket.value(), 1);
        assert_eq!(out.scan_result.rule_results[0].severity.as_deref(), Some("error"));
        assert_eq!(engine.seen_rules.lock().map(|s| s.clone()).unwrap_or_default(), vec![1]);
    }

    #[test]
    fn single_scan_failure_names_the_flow() {
        let engine = Canned {
            results: vec![("F1", Err("boom"))],
            seen_rules: Mutex::new(Vec::new()),
        };
        let err = run_single_scan(&engine, &ScanSequence::new(), &input("F1"), &options())
            .expect_err("scan fails");
        assert!(matches!(err, AppError::Scan { ref flow_name, .. } if flow_name == "F1"));
    }

    #[test]
    fn single_scan_maps_unavailable_engine_like_batch() {
        let engine = Canned {
            results: vec![("F1", Err("unavailable"))],
            seen_rules: Mutex::new(Vec::new()),
        };
        let err = run_single_scan(&engine, &ScanSequence::new(), &input("F1"), &options())
            .expect_err("engine gone");
        assert!(matches!(err, AppError::EngineUnavailable(ref msg) if msg == "engine gone"));
        assert!(!matches!(err, AppError::Scan { .. }));
    }

    #[test]
    fn missing_result_is_malformed() {
        let engine = Canned {
            results: Vec::new(),
            seen_rules: Mutex::new(Vec::new()),
        };
        let err = run_single_scan(&engine, &ScanSequence::new(), &input("F1"), &options())
            .expect_err("no result");
        assert!(matches!(
            err,
            AppError::Scan {
                source: ScanEngineError::Malformed(_),
                ..
            }
        ));
    }

    #[test]
    fn batch_keeps_input_order_and_reports_failures() {
        let engine = Canned {
            results: vec![
                ("F1", Ok(result_for("A", 2))),
                ("F2", Err("bad metadata")),
                ("F3", Ok(result_for("A", 0))),
            ],
            seen_rules: Mutex::new(Vec::new()),
        };
        let flows = vec![input("F1"), input("F2"), input("F3")];
        let out = futures::executor::block_on(run_batch_scan(
            &engine,
            &ScanSequence::new(),
            &flows,
            &options(),
        ))
        .expect("batch");

        let names: Vec<_> = out.results.iter().map(|e| e.flow_name.as_str()).collect();
        assert_eq!(names, vec!["F1", "F3"]);
        assert_eq!(out.failures.len(), 1);
        assert_eq!(out.failures[0].flow_id, "id-F2");
        assert!(out.failures[0].error.contains("bad metadata"));
    }

    #[test]
    fn unavailable_engine_aborts_batch() {
        let engine = Canned {
            results: vec![("F1", Ok(result_for("A", 1))), ("F2", Err("unavailable"))],
            seen_rules: Mutex::new(Vec::new()),
        };
        let flows = vec![input("F1"), input("F2")];
        let err = futures::executor::block_on(run_batch_scan(
            &engine,
            &ScanSequence::new(),
            &flows,
            &options(),
        ))
        .expect_err("fatal");
        assert!(matches!(err, AppError::EngineUnavailable(_)));
    }

    #[test]
    fn artifact_carries_batch_metadata() {
        let engine = Canned {
            results: vec![("F1", Ok(result_for("A", 1)))],
            seen_rules: Mutex::new(Vec::new()),
        };
        let seq = ScanSequence::new();
        let _ = seq.next_ticket();
        let out = futures::executor::block_on(run_batch_scan(
            &engine,
            &seq,
            &[input("F1")],
            &options(),
        ))
        .expect("batch");
        let artifact = out.to_artifact(OffsetDateTime::UNIX_EPOCH);
        assert_eq!(artifact.schema, SCHEMA_SCAN_RESULTS_V1);
        assert_eq!(artifact.sequence, 2);
        assert_eq!(artifact.number_of_rules, 1);
        assert_eq!(artifact.violation_count(), 1);
    }
}
