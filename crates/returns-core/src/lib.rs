//! Core library for the returns desk.
//!
//! This crate loads return/warranty records from arbitrary CSV files into a
//! SQLite table whose layout is inferred from the data, turns free-text
//! return descriptions into structured records with a rule-based extractor,
//! and summarizes what has been stored.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use returns_core::{ReturnsDeskBuilder, Response};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let desk = ReturnsDeskBuilder::new()
//!     .with_database_path(Some("returns.db"))
//!     .build()?;
//!
//! desk.load_csv("sample.csv")?;
//! let records = desk.insert_text("order: 2100 product: Tablet reason: Missing Accessories")?;
//! println!("{records}");
//!
//! // Or through the single dispatch entry point
//! if let Response::Table(all) = desk.handle_request("query", None) {
//!     println!("{} record(s)", all.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod db;
pub mod desk;
pub mod display;
pub mod error;
pub mod extract;
pub mod ingest;
pub mod models;
pub mod report;

// Re-export commonly used types
pub use db::{
    records::RecordStore,
    schema::{ColumnType, Dataset, TableManager},
    ConnectionManager,
};
pub use desk::{Action, Response, ReturnsDesk, ReturnsDeskBuilder};
pub use display::Extracted;
pub use error::{ErrorCategory, Result, ReturnsError};
pub use extract::{Extraction, ExtractionMode, FieldExtractor};
pub use models::{LoadSummary, Record, RecordSet, Value};
pub use report::{ReportOutcome, ReportSummary};
