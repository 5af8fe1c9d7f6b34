use flowscan_types::{Severity, ViolationRow};

/// Per-severity tally of violation rows.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SeverityCounts {
    pub info: u32,
    pub warning: u32,
    pub error: u32,
    /// Rows whose severity string is empty or not a known level.
    pub other: u32,
}

impl SeverityCounts {
    pub fn from_rows(rows: &[ViolationRow]) -> Self {
        let mut counts = SeverityCounts::default();
        for row in rows {
            match Severity::parse(&row.severity) {
                Some(Severity::Info) => counts.info += 1,
                Some(Severity::Warning) => counts.warning += 1,
                Some(Severity::Error) => counts.error += 1,
                None => counts.other += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> u32 {
        self.info + self.warning + self.error + self.other
    }
}
