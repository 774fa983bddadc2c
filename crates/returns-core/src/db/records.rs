//! Inserts and reads against the `returns` table.

use std::sync::Arc;

use log::{debug, info};
use rusqlite::params_from_iter;

use super::{
    quote_identifier,
    schema::{TableManager, IDENTITY_COLUMN, TABLE_NAME},
};
use crate::{
    error::{DatabaseResultExt, Result, ReturnsError},
    models::{Record, RecordSet, Value},
};

/// Record store accessor.
///
/// Column lists are always read from the live table at call time, so results
/// follow whichever CSV was loaded last.
pub struct RecordStore {
    tables: Arc<TableManager>,
}

impl RecordStore {
    pub fn new(tables: Arc<TableManager>) -> Self {
        Self { tables }
    }

    /// Inserts one record and returns the full, newest-first record set.
    ///
    /// Only the keys present in `record` are written; other columns keep
    /// their default (NULL).
    ///
    /// # Errors
    ///
    /// Returns `ReturnsError::EmptyRecord` when `record` has no fields and
    /// `ReturnsError::Database` when the store rejects the statement.
    pub fn insert(&self, record: &Record) -> Result<RecordSet> {
        if record.is_empty() {
            return Err(ReturnsError::EmptyRecord);
        }

        let columns: Vec<String> = record.keys().map(quote_identifier).collect();
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_identifier(TABLE_NAME),
            columns.join(", "),
            placeholders.join(", ")
        );
        debug!("Inserting record: {sql}");

        let id = self.tables.connections().with_connection(|conn| {
            conn.execute(&sql, params_from_iter(record.values()))
                .db_context("Failed to insert return record")?;
            Ok(conn.last_insert_rowid())
        })?;
        info!("Inserted return record with id {id}");

        self.get_all()
    }

    /// Bulk-appends rows in a single transaction. Returns the row count.
    pub fn insert_rows(&self, columns: &[String], rows: &[Vec<Value>]) -> Result<usize> {
        if columns.is_empty() || rows.is_empty() {
            return Ok(0);
        }

        let quoted: Vec<String> = columns.iter().map(|c| quote_identifier(c)).collect();
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_identifier(TABLE_NAME),
            quoted.join(", "),
            placeholders.join(", ")
        );

        self.tables.connections().with_connection(|conn| {
            let tx = conn
                .transaction()
                .db_context("Failed to begin transaction")?;
            {
                let mut stmt = tx.prepare(&sql).db_context("Failed to prepare bulk insert")?;
                for row in rows {
                    stmt.execute(params_from_iter(row.iter()))
                        .db_context("Failed to append row")?;
                }
            }
            tx.commit().db_context("Failed to commit transaction")?;
            Ok(rows.len())
        })
    }

    /// All rows, newest first, without identity or audit columns.
    ///
    /// Yields an empty set when no table has been loaded yet.
    pub fn get_all(&self) -> Result<RecordSet> {
        let columns = self.tables.data_columns()?;
        if columns.is_empty() {
            return Ok(RecordSet::default());
        }

        let sql = format!(
            "SELECT {} FROM {} ORDER BY {} DESC",
            columns
                .iter()
                .map(|c| quote_identifier(c))
                .collect::<Vec<_>>()
                .join(", "),
            quote_identifier(TABLE_NAME),
            quote_identifier(IDENTITY_COLUMN)
        );

        let width = columns.len();
        let rows = self.tables.connections().with_connection(|conn| {
            let mut stmt = conn
                .prepare(&sql)
                .db_context("Failed to prepare record query")?;
            let rows = stmt
                .query_map([], |row| {
                    (0..width)
                        .map(|i| row.get_ref(i).map(Value::from_sql_ref))
                        .collect::<rusqlite::Result<Vec<Value>>>()
                })
                .db_context("Failed to query records")?
                .collect::<std::result::Result<Vec<_>, _>>()
                .db_context("Failed to read records")?;
            Ok(rows)
        })?;

        Ok(RecordSet::new(columns, rows))
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::db::{schema::Dataset, ConnectionManager};

    fn store_with(headers: &[&str]) -> (TempDir, RecordStore) {
        let dir = TempDir::new().expect("temp dir");
        let connections = Arc::new(ConnectionManager::new(dir.path().join("records.db")));
        let tables = Arc::new(TableManager::new(connections));
        let headers: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
        tables
            .ensure_table(&Dataset::from_text(&headers, &[]))
            .expect("ensure table");
        (dir, RecordStore::new(tables))
    }

    #[test]
    fn insert_round_trips_newest_first() {
        let (_dir, store) = store_with(&["order_id", "product", "cost"]);

        let mut first = Record::new();
        first.insert("order_id", "SKU-1");
        store.insert(&first).expect("first insert");

        let mut second = Record::new();
        second.insert("order_id", "2100");
        second.insert("product", "Tablet");
        let all = store.insert(&second).expect("second insert");

        assert_eq!(all.len(), 2);
        assert_eq!(all.columns(), ["order_id", "product", "cost"]);
        let newest = all.first().expect("row");
        assert_eq!(newest.get("order_id"), Some(&Value::Text("2100".into())));
        assert_eq!(newest.get("product"), Some(&Value::Text("Tablet".into())));
        assert_eq!(newest.get("cost"), Some(&Value::Null));
    }

    #[test]
    fn empty_record_is_rejected() {
        let (_dir, store) = store_with(&["order_id"]);
        let err = store.insert(&Record::new()).unwrap_err();
        assert!(matches!(err, ReturnsError::EmptyRecord));
        assert!(store.get_all().expect("get all").is_empty());
    }

    #[test]
    fn unknown_column_is_a_store_error() {
        let (_dir, store) = store_with(&["order_id"]);
        let mut record = Record::new();
        record.insert("no_such_column", "x");
        let err = store.insert(&record).unwrap_err();
        assert!(matches!(err, ReturnsError::Database { .. }));
    }

    #[test]
    fn bulk_insert_counts_rows() {
        let (_dir, store) = store_with(&["order_id", "product"]);
        let columns = vec!["order_id".to_string(), "product".to_string()];
        let rows = vec![
            vec![Value::Text("1".into()), Value::Text("Phone".into())],
            vec![Value::Text("2".into()), Value::Null],
        ];
        assert_eq!(store.insert_rows(&columns, &rows).expect("bulk"), 2);

        let all = store.get_all().expect("get all");
        assert_eq!(all.len(), 2);
        assert_eq!(all.record(1).and_then(|r| r.get("order_id").cloned()), Some(Value::Text("1".into())));
    }

    #[test]
    fn get_all_without_table_is_empty() {
        let dir = TempDir::new().expect("temp dir");
        let connections = Arc::new(ConnectionManager::new(dir.path().join("none.db")));
        let store = RecordStore::new(Arc::new(TableManager::new(connections)));
        let all = store.get_all().expect("get all");
        assert!(all.is_empty());
        assert!(all.columns().is_empty());
    }
}
