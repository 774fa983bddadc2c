//! Outcome formatting for loads, reports and dispatch responses.

use std::fmt;

use crate::{
    desk::Response,
    models::LoadSummary,
    report::ReportOutcome,
};

impl fmt::Display for LoadSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Loaded {} record(s)", self.records)?;
        writeln!(f)?;
        writeln!(f, "Columns: {}", self.columns.join(", "))
    }
}

impl fmt::Display for ReportOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Report generated: {}", self.file)?;
        writeln!(f)?;
        writeln!(f, "- **Total returns**: {}", self.summary.total)?;
        if let Some(product) = &self.summary.top_product {
            writeln!(f, "- **Most returned**: {product}")?;
        }
        if let Some(reason) = &self.summary.top_reason {
            writeln!(f, "- **Main reason**: {reason}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Table(records) => write!(f, "{records}"),
            Response::Loaded(summary) => write!(f, "{summary}"),
            Response::Report(outcome) => write!(f, "{outcome}"),
            Response::Error { message, .. } => writeln!(f, "Error: {message}"),
            Response::Unknown => writeln!(f, "Error: unknown action"),
        }
    }
}
