//! Pure scanner-core logic (no IO).
//!
//! Input: rule catalogs, stored overrides, raw scan results and row sets
//! constructed elsewhere.
//! Output: resolved rule options, post-processed results, violation rows,
//! filtered and sorted views.

#![forbid(unsafe_code)]

pub mod flows;
pub mod projection;
pub mod query;
pub mod resolve;
pub mod scan;
pub mod summary;

#[cfg(test)]
mod proptest;
#[cfg(test)]
mod test_support;

pub use flows::{FlowListQuery, query_flows};
pub use projection::{flatten, flatten_one};
pub use query::{SortDirection, SortState, ViolationFilter};
pub use resolve::{ResolveWarning, ResolvedRules, merge};
pub use scan::{active_rules, post_process};
pub use summary::SeverityCounts;
