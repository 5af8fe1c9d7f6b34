//! Filtering and type-aware sorting of tabular records.
//!
//! Sorting is stable and never fails: values that do not fit a column's kind
//! are coerced (unparseable numbers count as 0, unparseable dates as the epoch,
//! missing text as the empty string).

use flowscan_types::{ExportColumn, ViolationRow};
use std::cmp::Ordering;
use std::fmt;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Some(SortDirection::Asc),
            "desc" | "descending" => Some(SortDirection::Desc),
            _ => None,
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a column's values are compared.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnKind {
    Boolean,
    Number,
    Date,
    Text,
}

/// A field value as read off a record, before coercion to the column kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FieldValue<'a> {
    Missing,
    Bool(bool),
    Number(f64),
    Timestamp(OffsetDateTime),
    Text(&'a str),
}

/// A record that can be sorted by named field.
pub trait Sortable {
    fn column_kind(field: &str) -> ColumnKind;
    fn field_value(&self, field: &str) -> FieldValue<'_>;
}

/// Current sort column and direction of a table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SortState {
    pub field: Option<String>,
    pub direction: SortDirection,
}

impl SortState {
    pub fn by(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: Some(field.into()),
            direction,
        }
    }

    /// Header-click semantics: the same field flips direction, a new field
    /// starts ascending.
    pub fn toggle(&self, field: &str) -> SortState {
        match self.field.as_deref() {
            Some(current) if fold_field_name(current) == fold_field_name(field) => SortState {
                field: self.field.clone(),
                direction: self.direction.reversed(),
            },
            _ => SortState::by(field, SortDirection::Asc),
        }
    }
}

/// Lowercase with `_`, `-` and spaces removed, so `flow_name` matches `flowName`.
pub(crate) fn fold_field_name(field: &str) -> String {
    field
        .chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Compare two raw values under `kind`.
pub fn compare_values(kind: ColumnKind, a: FieldValue<'_>, b: FieldValue<'_>) -> Ordering {
    match kind {
        ColumnKind::Boolean => as_bool(a).cmp(&as_bool(b)),
        ColumnKind::Number => as_number(a)
            .partial_cmp(&as_number(b))
            .unwrap_or(Ordering::Equal),
        ColumnKind::Date => as_epoch_nanos(a).cmp(&as_epoch_nanos(b)),
        ColumnKind::Text => compare_text(as_text(a), as_text(b)),
    }
}

fn as_bool(value: FieldValue<'_>) -> bool {
    match value {
        FieldValue::Missing => false,
        FieldValue::Bool(b) => b,
        FieldValue::Number(n) => n != 0.0 && !n.is_nan(),
        FieldValue::Timestamp(_) => true,
        FieldValue::Text(s) => !s.is_empty(),
    }
}

fn as_number(value: FieldValue<'_>) -> f64 {
    let n = match value {
        FieldValue::Missing => 0.0,
        FieldValue::Bool(b) => f64::from(u8::from(b)),
        FieldValue::Number(n) => n,
        FieldValue::Timestamp(t) => t.unix_timestamp() as f64,
        FieldValue::Text(s) => s.trim().parse::<f64>().unwrap_or(0.0),
    };
    if n.is_nan() { 0.0 } else { n }
}

fn as_epoch_nanos(value: FieldValue<'_>) -> i128 {
    match value {
        FieldValue::Timestamp(t) => t.unix_timestamp_nanos(),
        FieldValue::Text(s) => OffsetDateTime::parse(s.trim(), &Rfc3339)
            .map(|t| t.unix_timestamp_nanos())
            .unwrap_or(0),
        FieldValue::Missing | FieldValue::Bool(_) | FieldValue::Number(_) => 0,
    }
}

fn as_text(value: FieldValue<'_>) -> std::borrow::Cow<'_, str> {
    use std::borrow::Cow;
    match value {
        FieldValue::Missing => Cow::Borrowed(""),
        FieldValue::Text(s) => Cow::Borrowed(s),
        FieldValue::Bool(b) => Cow::Owned(b.to_string()),
        FieldValue::Number(n) => Cow::Owned(n.to_string()),
        FieldValue::Timestamp(t) => Cow::Owned(t.format(&Rfc3339).unwrap_or_default()),
    }
}

/// Base-letter comparison: case and diacritics are ignored, so `Émile` sorts
/// between `Alpha` and `Zeta` and equals `emile`.
fn compare_text(a: impl AsRef<str>, b: impl AsRef<str>) -> Ordering {
    collation_key(a.as_ref()).cmp(collation_key(b.as_ref()))
}

fn collation_key(s: &str) -> impl Iterator<Item = char> + '_ {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
}

/// Stable sort of a copy of `rows` by `field`.
///
/// Unknown fields read as missing everywhere, which leaves the order unchanged.
pub fn sort<T: Sortable + Clone>(rows: &[T], field: &str, direction: SortDirection) -> Vec<T> {
    let kind = T::column_kind(field);
    let mut sorted = rows.to_vec();
    sorted.sort_by(|a, b| {
        let ord = compare_values(kind, a.field_value(field), b.field_value(field));
        match direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
    sorted
}

/// Sort according to `state`; a state without a field keeps input order.
pub fn sort_by_state<T: Sortable + Clone>(rows: &[T], state: &SortState) -> Vec<T> {
    match state.field.as_deref() {
        Some(field) => sort(rows, field, state.direction),
        None => rows.to_vec(),
    }
}

impl Sortable for ViolationRow {
    fn column_kind(field: &str) -> ColumnKind {
        match field.parse::<ExportColumn>() {
            Ok(ExportColumn::LocationX | ExportColumn::LocationY) => ColumnKind::Number,
            _ => ColumnKind::Text,
        }
    }

    fn field_value(&self, field: &str) -> FieldValue<'_> {
        if fold_field_name(field) == "id" {
            return FieldValue::Text(&self.id);
        }
        match field.parse::<ExportColumn>() {
            Ok(column) => FieldValue::Text(self.field(column)),
            Err(_) => FieldValue::Missing,
        }
    }
}

/// Columns searched by the "other fields" term.
pub const OTHER_FIELD_COLUMNS: [ExportColumn; 8] = [
    ExportColumn::RuleName,
    ExportColumn::Severity,
    ExportColumn::Name,
    ExportColumn::Type,
    ExportColumn::MetaType,
    ExportColumn::DataType,
    ExportColumn::ConnectsTo,
    ExportColumn::Expression,
];

/// Substring filter over violation rows. Empty terms do not filter.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViolationFilter {
    /// Matched case-insensitively against the flow name.
    pub flow_name_term: Option<String>,
    /// Matched case-insensitively against any of [`OTHER_FIELD_COLUMNS`].
    pub other_fields_term: Option<String>,
}

impl ViolationFilter {
    pub fn is_empty(&self) -> bool {
        normalized_term(self.flow_name_term.as_deref()).is_none()
            && normalized_term(self.other_fields_term.as_deref()).is_none()
    }

    pub fn matches(&self, row: &ViolationRow) -> bool {
        let flow_ok = normalized_term(self.flow_name_term.as_deref())
            .is_none_or(|term| row.flow_name.to_lowercase().contains(&term));
        let other_ok = normalized_term(self.other_fields_term.as_deref()).is_none_or(|term| {
            OTHER_FIELD_COLUMNS
                .iter()
                .any(|c| row.field(*c).to_lowercase().contains(&term))
        });
        flow_ok && other_ok
    }
}

fn normalized_term(term: Option<&str>) -> Option<String> {
    term.filter(|t| !t.is_empty()).map(str::to_lowercase)
}

/// Rows matching both terms, in input order.
pub fn filter(rows: &[ViolationRow], filter: &ViolationFilter) -> Vec<ViolationRow> {
    rows.iter().filter(|r| filter.matches(r)).cloned().collect()
}

/// Filter, then sort.
pub fn query(rows: &[ViolationRow], filter_by: &ViolationFilter, state: &SortState) -> Vec<ViolationRow> {
    sort_by_state(&filter(rows, filter_by), state)
}
