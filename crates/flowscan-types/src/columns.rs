use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A displayable/exportable column of a violation row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum ExportColumn {
    FlowName,
    RuleName,
    Severity,
    Name,
    Type,
    MetaType,
    DataType,
    LocationX,
    LocationY,
    ConnectsTo,
    Expression,
}

/// Canonical column order used when no explicit order is configured.
pub const DEFAULT_COLUMNS: [ExportColumn; 11] = [
    ExportColumn::FlowName,
    ExportColumn::RuleName,
    ExportColumn::Severity,
    ExportColumn::Name,
    ExportColumn::Type,
    ExportColumn::MetaType,
    ExportColumn::DataType,
    ExportColumn::LocationX,
    ExportColumn::LocationY,
    ExportColumn::ConnectsTo,
    ExportColumn::Expression,
];

impl ExportColumn {
    /// Field key as it appears on a serialized `ViolationRow`.
    pub fn key(self) -> &'static str {
        match self {
            ExportColumn::FlowName => "flowName",
            ExportColumn::RuleName => "ruleName",
            ExportColumn::Severity => "severity",
            ExportColumn::Name => "name",
            ExportColumn::Type => "type",
            ExportColumn::MetaType => "metaType",
            ExportColumn::DataType => "dataType",
            ExportColumn::LocationX => "locationX",
            ExportColumn::LocationY => "locationY",
            ExportColumn::ConnectsTo => "connectsTo",
            ExportColumn::Expression => "expression",
        }
    }

    /// Human-readable header label.
    pub fn label(self) -> &'static str {
        match self {
            ExportColumn::FlowName => "Flow Name",
            ExportColumn::RuleName => "Rule Name",
            ExportColumn::Severity => "Severity",
            ExportColumn::Name => "Detail Name",
            ExportColumn::Type => "Type",
            ExportColumn::MetaType => "Meta Type",
            ExportColumn::DataType => "Data Type",
            ExportColumn::LocationX => "Location X",
            ExportColumn::LocationY => "Location Y",
            ExportColumn::ConnectsTo => "Connects To",
            ExportColumn::Expression => "Expression",
        }
    }
}

impl fmt::Display for ExportColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownColumn(pub String);

impl fmt::Display for UnknownColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown column: {}", self.0)
    }
}

impl std::error::Error for UnknownColumn {}

impl FromStr for ExportColumn {
    type Err = UnknownColumn;

    /// Accepts `flowName`, `flow_name`, `flow-name` and `Flow Name` spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        DEFAULT_COLUMNS
            .iter()
            .copied()
            .find(|c| c.key().to_ascii_lowercase() == folded)
            .or(match folded.as_str() {
                "detailname" => Some(ExportColumn::Name),
                _ => None,
            })
            .ok_or_else(|| UnknownColumn(s.to_string()))
    }
}
