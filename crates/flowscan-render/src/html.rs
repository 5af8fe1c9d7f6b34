use flowscan_domain::SeverityCounts;
use flowscan_types::{DEFAULT_COLUMNS, ViolationRow};
use std::fmt::Write as _;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Header data for the printable report.
#[derive(Clone, Debug)]
pub struct ReportMeta {
    pub title: String,
    pub generated_at: OffsetDateTime,
    /// Number of active rules the scan ran with.
    pub total_rules: u32,
}

/// Render a self-contained, print-friendly HTML document.
///
/// All row values and the title are escaped. An empty row set renders an
/// empty table body.
pub fn to_printable_html(rows: &[ViolationRow], meta: &ReportMeta) -> String {
    let counts = SeverityCounts::from_rows(rows);
    let generated = meta
        .generated_at
        .format(&Rfc3339)
        .unwrap_or_else(|_| meta.generated_at.unix_timestamp().to_string());
    let title = escape_html(&meta.title);

    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    out.push_str("<meta charset=\"UTF-8\">\n");
    let _ = writeln!(out, "<title>{title}</title>");
    out.push_str(STYLE);
    out.push_str("</head>\n<body>\n");
    let _ = writeln!(out, "<h1>{title}</h1>");
    out.push_str("<dl class=\"summary\">\n");
    let _ = writeln!(out, "<dt>Generated</dt><dd>{}</dd>", escape_html(&generated));
    let _ = writeln!(out, "<dt>Rules</dt><dd>{}</dd>", meta.total_rules);
    let _ = writeln!(out, "<dt>Violations</dt><dd>{}</dd>", rows.len());
    let _ = writeln!(
        out,
        "<dt>By severity</dt><dd>error {} / warning {} / info {}</dd>",
        counts.error, counts.warning, counts.info
    );
    out.push_str("</dl>\n");

    out.push_str("<table>\n<thead>\n<tr>");
    for column in DEFAULT_COLUMNS {
        let _ = write!(out, "<th>{}</th>", escape_html(column.label()));
    }
    out.push_str("</tr>\n</thead>\n<tbody>\n");
    for row in rows {
        let _ = write!(out, "<tr class=\"severity-{}\">", severity_class(&row.severity));
        for column in DEFAULT_COLUMNS {
            let _ = write!(out, "<td>{}</td>", escape_html(row.field(column)));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</tbody>\n</table>\n</body>\n</html>\n");
    out
}

fn severity_class(severity: &str) -> &'static str {
    match severity.to_ascii_lowercase().as_str() {
        "error" => "error",
        "warning" | "warn" => "warning",
        "info" | "note" => "info",
        _ => "unknown",
    }
}

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

const STYLE: &str = r#"<style>
body { font-family: -apple-system, "Segoe UI", Roboto, sans-serif; font-size: 12px; color: #1f2937; margin: 1.5rem; }
h1 { font-size: 1.4rem; margin-bottom: 0.5rem; }
dl.summary { display: grid; grid-template-columns: max-content auto; gap: 0.2rem 1rem; margin-bottom: 1rem; }
dl.summary dt { font-weight: 600; }
table { border-collapse: collapse; width: 100%; }
th, td { border: 1px solid #d1d5db; padding: 0.25rem 0.4rem; text-align: left; vertical-align: top; }
th { background: #f3f4f6; }
tr.severity-error td:nth-child(3) { color: #dc2626; font-weight: 600; }
tr.severity-warning td:nth-child(3) { color: #ca8a04; }
@media print { body { margin: 0; } thead { display: table-header-group; } tr { page-break-inside: avoid; } }
</style>
"#;
