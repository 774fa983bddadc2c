mod common;

use common::{TestDesk, RETURNS_CSV};
use returns_core::{ColumnType, Dataset, ErrorCategory, ReturnsError, Value};

#[test]
fn test_load_normalizes_header_and_counts_rows() {
    let test = TestDesk::new();
    let path = test.write_csv("returns.csv", RETURNS_CSV);

    let summary = test.desk.load_csv(&path).expect("load");

    assert!(summary.success);
    assert_eq!(summary.records, 3);
    assert_eq!(
        summary.columns,
        vec![
            "order_id",
            "product",
            "store_name",
            "return_reason",
            "cost",
            "date",
            "category",
            "approved_flag",
        ]
    );
    assert_eq!(
        test.desk.tables().available_columns().expect("columns"),
        summary.columns
    );
}

#[test]
fn test_load_infers_column_types() {
    let test = TestDesk::new();
    test.load("returns.csv", RETURNS_CSV);

    let declared: Vec<(String, String)> = test
        .desk
        .tables()
        .columns()
        .expect("columns")
        .into_iter()
        .map(|info| (info.name, info.declared_type))
        .collect();

    assert!(declared.contains(&("order_id".into(), "INTEGER".into())));
    assert!(declared.contains(&("cost".into(), "REAL".into())));
    assert!(declared.contains(&("date".into(), "TEXT".into())));
    assert!(declared.contains(&("product".into(), "TEXT".into())));
}

#[test]
fn test_reload_replaces_previous_layout() {
    let test = TestDesk::new();
    test.load("returns.csv", RETURNS_CSV);

    test.load(
        "stores.csv",
        "Order ID,Store,Region\n7,North Hub,West\n8,South Hub,East\n",
    );

    let records = test.desk.query().expect("query");
    assert_eq!(records.columns(), ["order_id", "store", "region"]);
    assert_eq!(records.len(), 2);
    assert!(!records.has_column("product"));
}

#[test]
fn test_failed_load_keeps_existing_table() {
    let test = TestDesk::new();
    test.load("returns.csv", RETURNS_CSV);
    let broken = test.write_csv("broken.csv", "a,b\n1,2,3\n");

    let err = test.desk.load_csv(&broken).unwrap_err();

    assert_eq!(err.category(), ErrorCategory::Parse);
    assert_eq!(test.desk.query().expect("query").len(), 3);
}

#[test]
fn test_header_only_csv_creates_empty_table() {
    let test = TestDesk::new();
    let path = test.write_csv("empty.csv", "Order ID,Product\n");

    let summary = test.desk.load_csv(&path).expect("load");

    assert_eq!(summary.records, 0);
    assert!(test.desk.tables().table_created());
    assert_eq!(
        test.desk.tables().available_columns().expect("columns"),
        vec!["order_id", "product"]
    );
    assert!(test.desk.query().expect("query").is_empty());
}

#[test]
fn test_empty_file_is_malformed() {
    let test = TestDesk::new();
    let path = test.write_csv("nothing.csv", "");

    let err = test.desk.load_csv(&path).unwrap_err();

    assert!(matches!(err, ReturnsError::MalformedSource { .. }));
}

#[test]
fn test_missing_file_is_input_error() {
    let test = TestDesk::new();
    let missing = test.dir.path().join("absent.csv");

    let err = test
        .desk
        .load_csv(missing.to_str().unwrap())
        .unwrap_err();

    assert!(matches!(err, ReturnsError::SourceNotFound { .. }));
    assert_eq!(err.category(), ErrorCategory::Input);
}

#[test]
fn test_ensure_table_is_idempotent() {
    let test = TestDesk::new();
    test.load("returns.csv", RETURNS_CSV);
    let dataset = Dataset::from_text(&["Other".to_string()], &[]);

    test.desk.tables().ensure_table(&dataset).expect("first");
    test.desk.tables().ensure_table(&dataset).expect("second");

    // The loaded layout is untouched.
    let columns = test.desk.tables().available_columns().expect("columns");
    assert!(columns.contains(&"product".to_string()));
    assert!(!columns.contains(&"other".to_string()));
}

#[test]
fn test_mixed_numeric_column_falls_back_to_text() {
    let test = TestDesk::new();
    test.load("mixed.csv", "Order ID,Cost\nA-17,12\n18,n/a\n");

    let dataset = Dataset::from_text(
        &["Order ID".to_string(), "Cost".to_string()],
        &[
            vec!["A-17".to_string(), "12".to_string()],
            vec!["18".to_string(), "n/a".to_string()],
        ],
    );
    assert_eq!(dataset.columns()[0].column_type, ColumnType::Text);
    assert_eq!(dataset.columns()[1].column_type, ColumnType::Text);

    let records = test.desk.query().expect("query");
    let newest = records.first().expect("row");
    assert_eq!(newest.get("order_id"), Some(&Value::Text("18".into())));
}

#[test]
fn test_short_rows_load_with_null_cells() {
    let test = TestDesk::new();
    test.load(
        "short.csv",
        "order_id,product,cost\n1100,Laptop,5\n1101,Phone\n",
    );

    let records = test.desk.query().expect("query");
    let newest = records.first().expect("row");

    assert_eq!(records.len(), 2);
    assert_eq!(newest.get("product"), Some(&Value::Text("Phone".into())));
    assert_eq!(newest.get("cost"), Some(&Value::Null));
}
