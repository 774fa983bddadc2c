//! CSV ingestion pipeline.
//!
//! A load reads and types the whole file first, then replaces the `returns`
//! table with one shaped after the new header. Nothing from a previous load
//! survives a successful reload.

use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
    sync::Arc,
};

use log::info;

use crate::{
    db::{records::RecordStore, schema::{Dataset, TableManager}},
    error::{Result, ReturnsError},
    models::LoadSummary,
};

/// Reads CSV sources and replaces the table contents.
pub struct Ingestor {
    tables: Arc<TableManager>,
    store: Arc<RecordStore>,
}

impl Ingestor {
    pub fn new(tables: Arc<TableManager>, store: Arc<RecordStore>) -> Self {
        Self { tables, store }
    }

    /// Loads the CSV at `source_path`, replacing the table and its rows.
    ///
    /// # Errors
    ///
    /// - `ReturnsError::InvalidInput` for a blank path
    /// - `ReturnsError::SourceNotFound` when the file cannot be opened
    /// - `ReturnsError::Parse` / `MalformedSource` for unusable content
    /// - `ReturnsError::Database` when the table cannot be rebuilt
    pub fn load(&self, source_path: &str) -> Result<LoadSummary> {
        if source_path.trim().is_empty() {
            return Err(ReturnsError::invalid_input("source_path").with_reason("Invalid file path"));
        }

        let path = Path::new(source_path.trim());
        let file = File::open(path).map_err(|source| ReturnsError::SourceNotFound {
            path: path.to_path_buf(),
            source,
        })?;
        let dataset = read_dataset(BufReader::new(file))?;

        self.tables.drop_table()?;
        self.tables.ensure_table(&dataset)?;
        let columns = dataset.column_names();
        let records = self.store.insert_rows(&columns, dataset.rows())?;

        let connections = self.tables.connections();
        connections.invalidate_current();
        connections.advance_epoch();

        info!(
            "Loaded {records} record(s) from {} with columns {columns:?}",
            path.display()
        );
        Ok(LoadSummary::new(records, columns))
    }
}

/// Parses CSV text (header row first) into a typed dataset.
///
/// Rows shorter than the header are padded with blanks; a row with more
/// fields than the header is rejected.
pub fn read_dataset<R: Read>(reader: R) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|source| ReturnsError::Parse {
            message: "Failed to read header row".to_string(),
            source,
        })?
        .iter()
        .map(String::from)
        .collect();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(ReturnsError::MalformedSource {
            message: "CSV source has no header row".to_string(),
        });
    }

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|source| ReturnsError::Parse {
            message: format!("Failed to read data row {}", index + 1),
            source,
        })?;
        if record.len() > headers.len() {
            return Err(ReturnsError::MalformedSource {
                message: format!(
                    "Data row {} has {} fields but the header has {}",
                    index + 1,
                    record.len(),
                    headers.len()
                ),
            });
        }
        rows.push(record.iter().map(String::from).collect());
    }

    Ok(Dataset::from_text(&headers, &rows))
}
