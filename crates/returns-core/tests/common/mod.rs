//! Shared helpers for integration tests.

use std::{fs, path::PathBuf};

use jiff::civil::date;
use returns_core::{ReturnsDesk, ReturnsDeskBuilder};
use tempfile::TempDir;

/// Scratch directory with its own store.
pub struct TestDesk {
    pub dir: TempDir,
    pub desk: ReturnsDesk,
}

impl TestDesk {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temporary directory");
        let desk = ReturnsDeskBuilder::new()
            .with_database_path(Some(dir.path().join("returns.db")))
            .with_today(date(2025, 6, 1))
            .build()
            .expect("Failed to build desk");
        Self { dir, desk }
    }

    /// Writes `contents` to `name` inside the scratch directory.
    pub fn write_csv(&self, name: &str, contents: &str) -> String {
        let path: PathBuf = self.dir.path().join(name);
        fs::write(&path, contents).expect("Failed to write CSV");
        path.to_string_lossy().into_owned()
    }

    /// Writes and loads a CSV in one step.
    pub fn load(&self, name: &str, contents: &str) -> String {
        let path = self.write_csv(name, contents);
        self.desk.load_csv(&path).expect("Failed to load CSV");
        path
    }
}

pub const RETURNS_CSV: &str = "\
Order ID,Product,Store Name,Return Reason,Cost,Date,Category,Approved Flag
1099,Laptop,Store A,Defective,999.99,2025-05-01,Electronics,Yes
1100,Phone,Store B,Wrong Item Shipped,499.5,2025-05-02,Electronics,No
1101,Laptop,Store A,Defective,1049.00,2025-05-03,Electronics,Yes
";
