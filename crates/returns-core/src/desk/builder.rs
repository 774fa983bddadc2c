//! Builder for creating and configuring ReturnsDesk instances.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use jiff::civil::Date;

use super::ReturnsDesk;
use crate::{
    db::{ConnectionManager, DEFAULT_DATABASE_PATH},
    error::{Result, ReturnsError},
    extract::{ExtractionMode, FieldExtractor},
};

/// Builder for creating and configuring ReturnsDesk instances.
#[derive(Debug, Clone, Default)]
pub struct ReturnsDeskBuilder {
    database_path: Option<PathBuf>,
    mode: ExtractionMode,
    today: Option<Date>,
}

impl ReturnsDeskBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a custom database file path.
    ///
    /// If not specified, uses `ReturnsData.db` in the working directory.
    pub fn with_database_path<P: AsRef<Path>>(mut self, path: Option<P>) -> Self {
        if let Some(path) = path {
            self.database_path = Some(path.as_ref().to_path_buf());
        }
        self
    }

    /// Selects the extraction rule families.
    pub fn with_extraction_mode(mut self, mode: ExtractionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Pins the date used when a description carries none.
    pub fn with_today(mut self, today: Date) -> Self {
        self.today = Some(today);
        self
    }

    /// Builds the configured desk.
    ///
    /// # Errors
    ///
    /// Returns `ReturnsError::FileSystem` if the parent directory cannot be
    /// created and `ReturnsError::StoreUnavailable` if the store cannot be
    /// opened.
    pub fn build(self) -> Result<ReturnsDesk> {
        let db_path = self
            .database_path
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH));

        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ReturnsError::FileSystem {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let connections = Arc::new(ConnectionManager::new(&db_path));
        connections.with_connection(|_| Ok(()))?;

        let mut fields = FieldExtractor::new(self.mode);
        if let Some(today) = self.today {
            fields = fields.with_today(today);
        }
        Ok(ReturnsDesk::new(connections, fields))
    }
}
