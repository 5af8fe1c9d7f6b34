//! Client-side filtering and sorting of flow listings.

use crate::query::{ColumnKind, FieldValue, SortDirection, SortState, Sortable, fold_field_name, sort_by_state};
use flowscan_types::FlowRecord;

/// Field flow listings are sorted by unless told otherwise.
pub const DEFAULT_FLOW_SORT_FIELD: &str = "lastModifiedDate";

/// Filters applied to an already fetched flow listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlowListQuery {
    pub active_only: bool,
    /// Matched against label and developer name.
    pub name_term: Option<String>,
    /// Matched against process type.
    pub type_term: Option<String>,
    pub sort: SortState,
}

impl Default for FlowListQuery {
    fn default() -> Self {
        Self {
            active_only: false,
            name_term: None,
            type_term: None,
            sort: SortState::by(DEFAULT_FLOW_SORT_FIELD, SortDirection::Desc),
        }
    }
}

impl FlowListQuery {
    pub fn matches(&self, record: &FlowRecord) -> bool {
        if self.active_only && !record.is_active {
            return false;
        }
        if let Some(term) = search_term(self.name_term.as_deref()) {
            let hit = record.master_label.to_lowercase().contains(&term)
                || record.developer_name.to_lowercase().contains(&term);
            if !hit {
                return false;
            }
        }
        if let Some(term) = search_term(self.type_term.as_deref()) {
            if !record.process_type.to_lowercase().contains(&term) {
                return false;
            }
        }
        true
    }
}

fn search_term(term: Option<&str>) -> Option<String> {
    term.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

/// Filter then sort a listing.
pub fn query_flows(records: &[FlowRecord], query: &FlowListQuery) -> Vec<FlowRecord> {
    let kept: Vec<FlowRecord> = records.iter().filter(|r| query.matches(r)).cloned().collect();
    sort_by_state(&kept, &query.sort)
}

impl Sortable for FlowRecord {
    fn column_kind(field: &str) -> ColumnKind {
        match fold_field_name(field).as_str() {
            "isactive" => ColumnKind::Boolean,
            "lastmodifieddate" => ColumnKind::Date,
            _ => ColumnKind::Text,
        }
    }

    fn field_value(&self, field: &str) -> FieldValue<'_> {
        match fold_field_name(field).as_str() {
            "id" => FieldValue::Text(&self.id),
            // The link column sorts by the name it displays.
            "developername" | "developernameurl" => FieldValue::Text(&self.developer_name),
            "masterlabel" => FieldValue::Text(&self.master_label),
            "processtype" => FieldValue::Text(&self.process_type),
            "isactive" => FieldValue::Bool(self.is_active),
            "lastmodifieddate" => self
                .last_modified_date
                .map(FieldValue::Timestamp)
                .unwrap_or(FieldValue::Missing),
            "versionid" => self
                .version_id
                .as_deref()
                .map(FieldValue::Text)
                .unwrap_or(FieldValue::Missing),
            _ => FieldValue::Missing,
        }
    }
}
