//! Fuzz target for projection and export of arbitrary scan results.
//!
//! Goal: any JSON that deserializes as scan results must project, filter,
//! sort and export without panicking.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_exporters
//! ```

#![no_main]

use arbitrary::Arbitrary;
use flowscan_domain::query::{SortState, ViolationFilter};
use flowscan_types::{DEFAULT_COLUMNS, ScanResult};
use libfuzzer_sys::fuzz_target;
use time::OffsetDateTime;

#[derive(Arbitrary, Debug)]
struct Input {
    results_json: String,
    flow_term: String,
    other_term: String,
    sort_clicks: Vec<String>,
}

fuzz_target!(|input: Input| {
    let Ok(results) = serde_json::from_str::<Vec<(String, ScanResult)>>(&input.results_json) else {
        return;
    };
    let rows = flowscan_domain::flatten(results.iter().map(|(n, r)| (n.as_str(), r)));

    let filter = ViolationFilter {
        flow_name_term: Some(input.flow_term),
        other_fields_term: Some(input.other_term),
    };
    let sort = input
        .sort_clicks
        .iter()
        .fold(SortState::default(), |state, field| state.toggle(field));
    let rows = flowscan_domain::query::query(&rows, &filter, &sort);

    let _ = flowscan_render::to_csv(&rows, &DEFAULT_COLUMNS);
    let _ = flowscan_render::to_printable_html(
        &rows,
        &flowscan_render::ReportMeta {
            title: "fuzz".to_string(),
            generated_at: OffsetDateTime::UNIX_EPOCH,
            total_rules: 0,
        },
    );
});
