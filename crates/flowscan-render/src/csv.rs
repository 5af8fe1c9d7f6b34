use flowscan_types::{ExportColumn, ViolationRow};

/// Render rows as CSV.
///
/// The header row carries the column labels unquoted. Every data field is
/// quoted with embedded quotes doubled. Rows are separated by `\n` with no
/// trailing newline, so empty input yields just the header.
pub fn to_csv(rows: &[ViolationRow], columns: &[ExportColumn]) -> String {
    let header = columns
        .iter()
        .map(|c| c.label())
        .collect::<Vec<_>>()
        .join(",");

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(header);
    for row in rows {
        let fields: Vec<String> = columns
            .iter()
            .map(|c| escape_csv_field(row.field(*c)))
            .collect();
        lines.push(fields.join(","));
    }
    lines.join("\n")
}

/// Quote a field, doubling embedded quotes.
pub fn escape_csv_field(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}
