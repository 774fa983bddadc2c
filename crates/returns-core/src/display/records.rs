//! Record and record set formatting.

use std::fmt;

use crate::{
    extract::Extraction,
    models::{Record, RecordSet, Value},
};

/// Pipes would break the table layout.
fn cell(value: &Value) -> String {
    value.to_string().replace('|', "\\|").replace('\n', " ")
}

impl fmt::Display for RecordSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return writeln!(f, "No records found.");
        }

        writeln!(f, "| {} |", self.columns().join(" | "))?;
        writeln!(
            f,
            "|{}",
            self.columns().iter().map(|_| "---|").collect::<String>()
        )?;
        for row in self.rows() {
            let cells: Vec<String> = row.iter().map(cell).collect();
            writeln!(f, "| {} |", cells.join(" | "))?;
        }
        Ok(())
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in self.iter() {
            if value.is_null() {
                writeln!(f, "- **{name}**: _none_")?;
            } else {
                writeln!(f, "- **{name}**: {value}")?;
            }
        }
        Ok(())
    }
}

/// Wrapper for showing an extraction dry run.
pub struct Extracted<'a>(pub &'a Extraction);

impl fmt::Display for Extracted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let extraction = self.0;
        if extraction.record.is_empty() {
            return writeln!(f, "No known fields exist in the current table.");
        }
        writeln!(f, "# Extracted fields")?;
        writeln!(f)?;
        write!(f, "{}", extraction.record)?;
        if extraction.is_empty() {
            writeln!(f)?;
            writeln!(f, "Nothing matched; this text would not be inserted.")?;
        }
        Ok(())
    }
}
