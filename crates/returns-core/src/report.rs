//! Aggregate statistics over the record set.
//!
//! Every breakdown is optional: a column missing from the current table just
//! yields an empty breakdown.

use std::{collections::HashMap, fs, path::Path};

use log::info;
use serde::Serialize;

use crate::{
    error::{Result, ReturnsError},
    extract::Field,
    models::{RecordSet, Value},
};

/// Rows carried over into the report as "recent returns".
pub const RECENT_LIMIT: usize = 10;

/// Cost statistics over non-null numeric cost cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostAnalysis {
    pub total: f64,
    pub average: f64,
    pub max: f64,
    pub min: f64,
}

/// One bucket of a value breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

/// Summary statistics for a record set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub total_returns: usize,
    pub by_product: Vec<ValueCount>,
    pub by_category: Vec<ValueCount>,
    pub by_store: Vec<ValueCount>,
    pub by_reason: Vec<ValueCount>,
    pub cost_analysis: Option<CostAnalysis>,
    pub recent_returns: RecordSet,
    pub findings: Vec<String>,
}

/// Short form of a written report, as returned through dispatch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportOutcome {
    pub success: bool,
    pub file: String,
    pub summary: ReportHeadline,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportHeadline {
    pub total: usize,
    pub top_product: Option<String>,
    pub top_reason: Option<String>,
}

impl ReportSummary {
    /// Computes the summary. Fails on an empty record set.
    pub fn analyze(records: &RecordSet) -> Result<Self> {
        if records.is_empty() {
            return Err(ReturnsError::invalid_input("records").with_reason("No data to report on"));
        }

        let mut summary = Self {
            total_returns: records.len(),
            by_product: value_counts(records, Field::Product),
            by_category: value_counts(records, Field::Category),
            by_store: value_counts(records, Field::StoreName),
            by_reason: value_counts(records, Field::ReturnReason),
            cost_analysis: cost_analysis(records),
            recent_returns: records.head(RECENT_LIMIT),
            findings: Vec::new(),
        };
        summary.findings = summary.generate_findings();
        Ok(summary)
    }

    pub fn top_product(&self) -> Option<&ValueCount> {
        self.by_product.first()
    }

    pub fn top_reason(&self) -> Option<&ValueCount> {
        self.by_reason.first()
    }

    pub fn headline(&self) -> ReportHeadline {
        ReportHeadline {
            total: self.total_returns,
            top_product: self.top_product().map(|c| c.value.clone()),
            top_reason: self.top_reason().map(|c| c.value.clone()),
        }
    }

    /// Writes the summary as pretty-printed JSON.
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| ReturnsError::FileSystem {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Report written to {}", path.display());
        Ok(())
    }

    fn generate_findings(&self) -> Vec<String> {
        let mut findings = Vec::new();

        if let Some(top) = self.top_product() {
            let share = top.count as f64 / self.total_returns as f64 * 100.0;
            findings.push(format!(
                "Most returned product: {} ({} returns, {share:.1}%)",
                top.value, top.count
            ));
        }
        if let Some(top) = self.by_store.first() {
            findings.push(format!(
                "Store with most returns: {} ({} returns)",
                top.value, top.count
            ));
        }
        if let Some(top) = self.top_reason() {
            findings.push(format!(
                "Main return reason: {} ({} returns)",
                top.value, top.count
            ));
        }
        if let Some(cost) = &self.cost_analysis {
            findings.push(format!("Total cost: ${:.2}", cost.total));
            findings.push(format!("Average cost: ${:.2}", cost.average));
        }

        findings
    }
}

/// Counts of each non-null value, most frequent first, ties by value.
///
/// Reads the same column extraction writes `field` to.
fn value_counts(records: &RecordSet, field: Field) -> Vec<ValueCount> {
    let Some(values) = field
        .columns()
        .iter()
        .find_map(|column| records.column_values(column))
    else {
        return Vec::new();
    };

    let mut counts: HashMap<String, usize> = HashMap::new();
    for value in values.filter(|v| !v.is_null()) {
        *counts.entry(value.to_string()).or_default() += 1;
    }

    let mut counts: Vec<ValueCount> = counts
        .into_iter()
        .map(|(value, count)| ValueCount { value, count })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    counts
}

fn cost_analysis(records: &RecordSet) -> Option<CostAnalysis> {
    let costs: Vec<f64> = records
        .column_values("cost")?
        .filter_map(Value::as_f64)
        .collect();
    if costs.is_empty() {
        return None;
    }

    let total: f64 = costs.iter().sum();
    Some(CostAnalysis {
        total,
        average: total / costs.len() as f64,
        max: costs.iter().copied().fold(f64::MIN, f64::max),
        min: costs.iter().copied().fold(f64::MAX, f64::min),
    })
}
