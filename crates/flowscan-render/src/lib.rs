//! Exporters for violation rows (CSV, printable HTML).
//!
//! Both are pure string builders; writing files is the caller's job.

#![forbid(unsafe_code)]

mod csv;
mod html;

pub use csv::{escape_csv_field, to_csv};
pub use html::{ReportMeta, escape_html, to_printable_html};
