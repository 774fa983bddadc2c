//! The returns desk: one façade over ingestion, extraction and storage.
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │   Ingestor   │───▶│ TableManager │───▶│  Connection  │
//! └──────────────┘    └──────────────┘    │   Manager    │
//! ┌──────────────┐           ▲            └──────────────┘
//! │  Extractor   │── columns ┘                   ▲
//! └──────┬───────┘                               │
//!        └───── record ────▶ RecordStore ────────┘
//! ```
//!
//! Presentation layers talk to the desk through
//! [`ReturnsDesk::handle_request`], or through the typed methods below.

use std::sync::Arc;

use log::info;

use crate::{
    db::{records::RecordStore, schema::TableManager, ConnectionManager},
    error::{Result, ReturnsError},
    extract::{Extraction, Extractor, FieldExtractor},
    ingest::Ingestor,
    models::{LoadSummary, Record, RecordSet},
    report::{ReportOutcome, ReportSummary},
};

pub mod builder;
pub mod dispatch;


pub use builder::ReturnsDeskBuilder;
pub use dispatch::{Action, Response};

/// Default output file for the `report` action.
pub const DEFAULT_REPORT_PATH: &str = "report.json";

/// Main entry point for loading, inserting and querying return records.
pub struct ReturnsDesk {
    connections: Arc<ConnectionManager>,
    tables: Arc<TableManager>,
    store: Arc<RecordStore>,
    ingestor: Ingestor,
    extractor: Extractor,
}

impl ReturnsDesk {
    pub(crate) fn new(connections: Arc<ConnectionManager>, fields: FieldExtractor) -> Self {
        let tables = Arc::new(TableManager::new(Arc::clone(&connections)));
        let store = Arc::new(RecordStore::new(Arc::clone(&tables)));
        Self {
            ingestor: Ingestor::new(Arc::clone(&tables), Arc::clone(&store)),
            extractor: Extractor::new(Arc::clone(&tables), fields),
            connections,
            tables,
            store,
        }
    }

    pub fn connections(&self) -> &Arc<ConnectionManager> {
        &self.connections
    }

    pub fn tables(&self) -> &Arc<TableManager> {
        &self.tables
    }

    /// Replaces the table with the contents of a CSV file.
    pub fn load_csv(&self, source_path: &str) -> Result<LoadSummary> {
        self.ingestor.load(source_path)
    }

    /// Extracts fields from `text` without writing anything.
    pub fn extract_preview(&self, text: &str) -> Result<Extraction> {
        self.extractor.analyze(text)
    }

    /// Extracts fields from `text`, inserts them and returns all records.
    ///
    /// # Errors
    ///
    /// Returns `ReturnsError::EmptyRecord` when no rule matched anything in
    /// the text; fallback values alone are never written.
    pub fn insert_text(&self, text: &str) -> Result<RecordSet> {
        if text.trim().is_empty() {
            return Err(ReturnsError::invalid_input("text").with_reason("Please enter a new return"));
        }
        let extraction = self.extractor.analyze(text)?;
        if extraction.is_empty() {
            return Err(ReturnsError::EmptyRecord);
        }
        info!("New return record: {:?}", extraction.matched);
        self.store.insert(&extraction.record)
    }

    /// Inserts an already structured record and returns all records.
    pub fn insert_record(&self, record: &Record) -> Result<RecordSet> {
        self.store.insert(record)
    }

    /// All records, newest first.
    pub fn query(&self) -> Result<RecordSet> {
        self.store.get_all()
    }

    /// Summarizes all records and writes the report to `output_path`.
    pub fn report(&self, output_path: Option<&str>) -> Result<ReportOutcome> {
        let path = output_path
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_REPORT_PATH);
        let summary = ReportSummary::analyze(&self.query()?)?;
        summary.write_json(path)?;
        Ok(ReportOutcome {
            success: true,
            file: path.to_string(),
            summary: summary.headline(),
        })
    }

    /// Closes every cached connection.
    pub fn close(&self) {
        self.connections.close_all();
    }
}
