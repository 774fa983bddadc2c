//! Schema inference and management of the `returns` table.
//!
//! The table layout is derived from whatever CSV was loaded last. Column names
//! are normalized, storage types are inferred from the cell contents, and a
//! system identity column is prepended. Reloading always replaces the table.

use std::{
    collections::HashSet,
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use log::{debug, info, warn};
use serde::Serialize;

use super::{quote_identifier, ConnectionManager};
use crate::{
    error::{DatabaseResultExt, Result},
    models::Value,
};

/// Name of the single backing table.
pub const TABLE_NAME: &str = "returns";

/// System identity column, never part of the business data.
pub const IDENTITY_COLUMN: &str = "id";

/// Columns excluded from reads along with the identity column.
pub const AUDIT_COLUMNS: &[&str] = &["created_at"];

/// Storage class of an inferred column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColumnType {
    Text,
    Integer,
    Real,
}

impl ColumnType {
    pub fn as_sql(&self) -> &'static str {
        match self {
            ColumnType::Text => "TEXT",
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
        }
    }

    /// Infers a storage class from sample cells.
    ///
    /// Blank cells are ignored. Integer beats real, real beats text, and a
    /// column with no samples at all is text.
    pub fn infer<'a, I>(cells: I) -> ColumnType
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut seen = false;
        let mut integer = true;
        for cell in cells {
            let cell = cell.trim();
            if cell.is_empty() {
                continue;
            }
            seen = true;
            if integer && cell.parse::<i64>().is_ok() {
                continue;
            }
            integer = false;
            if !is_decimal(cell) {
                return ColumnType::Text;
            }
        }
        match (seen, integer) {
            (false, _) => ColumnType::Text,
            (true, true) => ColumnType::Integer,
            (true, false) => ColumnType::Real,
        }
    }

    /// Converts a raw CSV cell into a typed value for this column.
    pub fn parse_cell(&self, cell: &str) -> Value {
        let trimmed = cell.trim();
        if trimmed.is_empty() {
            return Value::Null;
        }
        match self {
            ColumnType::Integer => trimmed
                .parse()
                .map(Value::Integer)
                .unwrap_or_else(|_| Value::Text(cell.to_string())),
            ColumnType::Real => trimmed
                .parse()
                .map(Value::Real)
                .unwrap_or_else(|_| Value::Text(cell.to_string())),
            ColumnType::Text => Value::Text(cell.to_string()),
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

// `f64::from_str` also accepts "inf" and "NaN"; those stay text.
fn is_decimal(cell: &str) -> bool {
    cell.chars().any(|c| c.is_ascii_digit()) && cell.parse::<f64>().is_ok()
}

/// Lower-cases a header and maps spaces and hyphens to underscores.
pub fn normalize_column_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            other => other,
        })
        .collect::<String>()
        .to_lowercase()
}

/// One column of a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSpec {
    pub name: String,
    pub column_type: ColumnType,
}

/// A typed, normalized table ready to be written to the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<ColumnSpec>,
    rows: Vec<Vec<Value>>,
}

impl Dataset {
    /// Builds a dataset from raw header and cell text.
    ///
    /// Headers are normalized; a blank header becomes `column_<n>` and a
    /// header named like the identity column becomes `source_id`. When two
    /// headers normalize to the same name the first one wins and the later
    /// column is dropped. Missing trailing cells are treated as blank.
    pub fn from_text(headers: &[String], raw_rows: &[Vec<String>]) -> Self {
        let mut seen = HashSet::new();
        let mut kept: Vec<(usize, String)> = Vec::new();
        for (index, header) in headers.iter().enumerate() {
            let mut name = normalize_column_name(header);
            if name.is_empty() {
                name = format!("column_{}", index + 1);
                warn!("Blank header at position {} renamed to '{name}'", index + 1);
            }
            if name == IDENTITY_COLUMN {
                name = format!("source_{IDENTITY_COLUMN}");
                warn!("Header '{header}' collides with the identity column, renamed to '{name}'");
            }
            if !seen.insert(name.clone()) {
                warn!("Dropping duplicate column '{header}' (normalizes to '{name}')");
                continue;
            }
            kept.push((index, name));
        }

        let columns: Vec<ColumnSpec> = kept
            .iter()
            .map(|(index, name)| ColumnSpec {
                name: name.clone(),
                column_type: ColumnType::infer(
                    raw_rows
                        .iter()
                        .map(|row| row.get(*index).map(String::as_str).unwrap_or("")),
                ),
            })
            .collect();

        let rows = raw_rows
            .iter()
            .map(|row| {
                kept.iter()
                    .zip(&columns)
                    .map(|((index, _), spec)| {
                        spec.column_type
                            .parse_cell(row.get(*index).map(String::as_str).unwrap_or(""))
                    })
                    .collect()
            })
            .collect();

        Self { columns, rows }
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The `CREATE TABLE IF NOT EXISTS` statement for this dataset.
    pub fn create_table_sql(&self) -> String {
        let mut definitions = vec![format!(
            "{} INTEGER PRIMARY KEY AUTOINCREMENT",
            quote_identifier(IDENTITY_COLUMN)
        )];
        definitions.extend(self.columns.iter().map(|column| {
            format!("{} {}", quote_identifier(&column.name), column.column_type)
        }));
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote_identifier(TABLE_NAME),
            definitions.join(", ")
        )
    }
}

/// Column as reported by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub declared_type: String,
}

/// Creates, drops and introspects the `returns` table.
pub struct TableManager {
    connections: Arc<ConnectionManager>,
    table_created: AtomicBool,
}

impl TableManager {
    pub fn new(connections: Arc<ConnectionManager>) -> Self {
        Self {
            connections,
            table_created: AtomicBool::new(false),
        }
    }

    pub fn connections(&self) -> &Arc<ConnectionManager> {
        &self.connections
    }

    /// Whether `ensure_table` has run since the last drop.
    pub fn table_created(&self) -> bool {
        self.table_created.load(Ordering::Acquire)
    }

    /// Creates the table for `dataset` unless this manager already did.
    ///
    /// An existing table is never altered; call [`drop_table`](Self::drop_table)
    /// first to replace it.
    pub fn ensure_table(&self, dataset: &Dataset) -> Result<()> {
        if self.table_created() {
            debug!("Table '{TABLE_NAME}' already ensured for this load");
            return Ok(());
        }

        let sql = dataset.create_table_sql();
        debug!("Ensuring table: {sql}");
        self.connections.with_connection(|conn| {
            conn.execute_batch(&sql)
                .db_context("Failed to create returns table")
        })?;

        self.table_created.store(true, Ordering::Release);
        info!(
            "Table '{TABLE_NAME}' ready with {} column(s)",
            dataset.columns().len()
        );
        Ok(())
    }

    /// Drops the table if present and resets the created flag.
    pub fn drop_table(&self) -> Result<()> {
        let sql = format!("DROP TABLE IF EXISTS {}", quote_identifier(TABLE_NAME));
        self.connections.with_connection(|conn| {
            conn.execute_batch(&sql)
                .db_context("Failed to drop returns table")
        })?;
        self.table_created.store(false, Ordering::Release);
        debug!("Dropped table '{TABLE_NAME}'");
        Ok(())
    }

    /// Every column of the live table, identity column included.
    ///
    /// Empty when the table does not exist.
    pub fn columns(&self) -> Result<Vec<ColumnInfo>> {
        let sql = format!("PRAGMA table_info({})", quote_identifier(TABLE_NAME));
        self.connections.with_connection(|conn| {
            let mut stmt = conn
                .prepare(&sql)
                .db_context("Failed to prepare table introspection")?;
            let columns = stmt
                .query_map([], |row| {
                    Ok(ColumnInfo {
                        name: row.get(1)?,
                        declared_type: row.get(2)?,
                    })
                })
                .db_context("Failed to introspect returns table")?
                .collect::<std::result::Result<Vec<_>, _>>()
                .db_context("Failed to read column info")?;
            Ok(columns)
        })
    }

    /// Column names available to extraction: everything but the identity.
    pub fn available_columns(&self) -> Result<Vec<String>> {
        Ok(self
            .columns()?
            .into_iter()
            .map(|column| column.name)
            .filter(|name| name != IDENTITY_COLUMN)
            .collect())
    }

    /// Business columns for reads: no identity, no audit columns.
    pub fn data_columns(&self) -> Result<Vec<String>> {
        Ok(self
            .available_columns()?
            .into_iter()
            .filter(|name| !AUDIT_COLUMNS.contains(&name.as_str()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn manager() -> (TempDir, TableManager) {
        let dir = TempDir::new().expect("temp dir");
        let connections = Arc::new(ConnectionManager::new(dir.path().join("schema.db")));
        (dir, TableManager::new(connections))
    }

    #[test]
    fn normalizes_headers() {
        assert_eq!(normalize_column_name("Order ID"), "order_id");
        assert_eq!(normalize_column_name("Store-Name"), "store_name");
        assert_eq!(normalize_column_name("  Return Reason "), "return_reason");
        assert_eq!(normalize_column_name("approved_flag"), "approved_flag");
    }

    #[test]
    fn infers_column_types() {
        assert_eq!(ColumnType::infer(["1", "22", ""]), ColumnType::Integer);
        assert_eq!(ColumnType::infer(["1", "2.5"]), ColumnType::Real);
        assert_eq!(ColumnType::infer(["1.0", "abc"]), ColumnType::Text);
        assert_eq!(ColumnType::infer(["", " "]), ColumnType::Text);
        assert_eq!(ColumnType::infer(["nan", "inf"]), ColumnType::Text);
        assert_eq!(ColumnType::infer(Vec::<&str>::new()), ColumnType::Text);
    }

    #[test]
    fn parses_cells_by_type() {
        assert_eq!(ColumnType::Integer.parse_cell("42"), Value::Integer(42));
        assert_eq!(ColumnType::Real.parse_cell("4"), Value::Real(4.0));
        assert_eq!(ColumnType::Text.parse_cell("x"), Value::Text("x".into()));
        assert_eq!(ColumnType::Real.parse_cell("  "), Value::Null);
    }

    #[test]
    fn dataset_drops_later_duplicates() {
        let headers = strings(&["Store Name", "store-name", "Cost"]);
        let rows = vec![strings(&["A", "B", "10"])];
        let dataset = Dataset::from_text(&headers, &rows);

        assert_eq!(dataset.column_names(), ["store_name", "cost"]);
        assert_eq!(
            dataset.rows()[0],
            vec![Value::Text("A".into()), Value::Integer(10)]
        );
    }

    #[test]
    fn dataset_renames_blank_and_identity_headers() {
        let headers = strings(&["ID", "", "product"]);
        let dataset = Dataset::from_text(&headers, &[]);
        assert_eq!(dataset.column_names(), ["source_id", "column_2", "product"]);
    }

    #[test]
    fn dataset_pads_short_rows() {
        let headers = strings(&["a", "b"]);
        let rows = vec![strings(&["1"])];
        let dataset = Dataset::from_text(&headers, &rows);
        assert_eq!(dataset.rows()[0], vec![Value::Integer(1), Value::Null]);
    }

    #[test]
    fn create_sql_prepends_identity() {
        let headers = strings(&["order_id", "cost", "product"]);
        let rows = vec![strings(&["1100", "9.99", "Laptop"])];
        let sql = Dataset::from_text(&headers, &rows).create_table_sql();
        assert_eq!(
            sql,
            "CREATE TABLE IF NOT EXISTS \"returns\" (\"id\" INTEGER PRIMARY KEY AUTOINCREMENT, \
             \"order_id\" INTEGER, \"cost\" REAL, \"product\" TEXT)"
        );
    }

    #[test]
    fn ensure_table_is_idempotent() {
        let (_dir, tables) = manager();
        let dataset = Dataset::from_text(&strings(&["order_id", "product"]), &[]);

        tables.ensure_table(&dataset).expect("first ensure");
        tables.ensure_table(&dataset).expect("second ensure");

        assert!(tables.table_created());
        let columns: Vec<String> = tables
            .columns()
            .expect("columns")
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(columns, ["id", "order_id", "product"]);
    }

    #[test]
    fn drop_resets_flag_and_allows_new_layout() {
        let (_dir, tables) = manager();
        let first = Dataset::from_text(&strings(&["order_id", "product"]), &[]);
        let second = Dataset::from_text(&strings(&["sku", "reason"]), &[]);

        tables.ensure_table(&first).expect("first");
        tables.drop_table().expect("drop");
        assert!(!tables.table_created());
        assert!(tables.columns().expect("columns").is_empty());

        tables.ensure_table(&second).expect("second");
        assert_eq!(tables.available_columns().expect("columns"), ["sku", "reason"]);
    }

    #[test]
    fn declared_types_follow_inference() {
        let (_dir, tables) = manager();
        let headers = strings(&["order_id", "cost", "product"]);
        let rows = vec![strings(&["1100", "12.5", "Laptop"])];
        tables
            .ensure_table(&Dataset::from_text(&headers, &rows))
            .expect("ensure");

        let declared: Vec<String> = tables
            .columns()
            .expect("columns")
            .into_iter()
            .map(|c| c.declared_type)
            .collect();
        assert_eq!(declared, ["INTEGER", "INTEGER", "REAL", "TEXT"]);
    }
}
