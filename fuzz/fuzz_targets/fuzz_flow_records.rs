//! Fuzz target for org and local flow record parsing.
//!
//! Goal: record normalization, flow file parsing and query building should
//! **never panic** on any input.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_flow_records
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = flowscan_org::fuzz::parse_flow_file(text);
        let _ = flowscan_org::fuzz::normalize_flow_page(text);
        let _ = flowscan_org::fuzz::flow_list_query(text);
    }
});
