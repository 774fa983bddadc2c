//! Load summary types.

use serde::Serialize;

/// Outcome of a successful CSV load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    /// Always true; failures are reported as errors instead.
    pub success: bool,
    /// Number of rows written to the table
    pub records: usize,
    /// Normalized column names, in table order
    pub columns: Vec<String>,
}

impl LoadSummary {
    pub fn new(records: usize, columns: Vec<String>) -> Self {
        Self {
            success: true,
            records,
            columns,
        }
    }
}
