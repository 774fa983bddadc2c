//! Rule-based field extraction from free text.
//!
//! The engine maps a free-text return description onto whichever columns the
//! live table has. Each field owns an ordered list of pattern rules (see
//! [`rules`]); the first rule that matches wins and fields never influence one
//! another. A field whose column is missing from the table is never produced.
//!
//! Unmatched fields are not errors. They resolve to:
//!
//! | field           | fallback           |
//! |-----------------|--------------------|
//! | `date`          | the processing day |
//! | `approved_flag` | `"No"`             |
//! | everything else | null               |

use std::sync::Arc;

use jiff::{civil::Date, Zoned};
use log::debug;

use crate::{
    db::schema::TableManager,
    error::Result,
    models::{Record, Value},
};

mod keywords;
pub mod rules;
mod text;


pub use rules::Approval;

/// Which rule families are active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExtractionMode {
    /// Labeled (`key: value`) rules only.
    #[default]
    Explicit,
    /// Labeled rules, then bare product and reason keywords as a fallback.
    Keyword,
}

/// The fields the engine knows how to extract, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    OrderId,
    Product,
    ReturnReason,
    Date,
    Cost,
    StoreName,
    Category,
    ApprovedFlag,
}

impl Field {
    pub const ALL: [Field; 8] = [
        Field::OrderId,
        Field::Product,
        Field::ReturnReason,
        Field::Date,
        Field::Cost,
        Field::StoreName,
        Field::Category,
        Field::ApprovedFlag,
    ];

    /// Column names this field may be written to, most preferred first.
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Field::OrderId => &["order_id"],
            Field::Product => &["product_name", "product"],
            Field::ReturnReason => &["return_reason", "reason"],
            Field::Date => &["date"],
            Field::Cost => &["cost"],
            Field::StoreName => &["store_name"],
            Field::Category => &["category"],
            Field::ApprovedFlag => &["approved_flag"],
        }
    }

    fn target<'c>(&self, available: &'c [String]) -> Option<&'c str> {
        self.columns()
            .iter()
            .find_map(|name| available.iter().find(|c| c == name))
            .map(String::as_str)
    }
}

/// Result of running the rules over one piece of text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    /// One entry per known field whose column exists, defaults included.
    pub record: Record,
    /// Columns whose value came from the text rather than a fallback.
    pub matched: Vec<String>,
}

impl Extraction {
    /// True when nothing in the text matched any rule.
    pub fn is_empty(&self) -> bool {
        self.matched.is_empty()
    }
}

/// The pure rule engine. Needs no store.
#[derive(Debug, Clone, Default)]
pub struct FieldExtractor {
    mode: ExtractionMode,
    today: Option<Date>,
}

impl FieldExtractor {
    pub fn new(mode: ExtractionMode) -> Self {
        Self { mode, today: None }
    }

    /// Pins the date used when the text carries none.
    pub fn with_today(mut self, today: Date) -> Self {
        self.today = Some(today);
        self
    }

    pub fn mode(&self) -> ExtractionMode {
        self.mode
    }

    /// Extracts every known field whose column is in `available_columns`.
    pub fn extract(&self, text: &str, available_columns: &[String]) -> Extraction {
        let mut extraction = Extraction::default();
        for field in Field::ALL {
            let Some(column) = field.target(available_columns) else {
                continue;
            };
            let (value, matched) = match self.match_field(field, text) {
                Some(value) => (value, true),
                None => (self.fallback(field), false),
            };
            if matched {
                extraction.matched.push(column.to_string());
            }
            extraction.record.insert(column, value);
        }
        debug!(
            "Extracted {} field(s), {} matched from text",
            extraction.record.len(),
            extraction.matched.len()
        );
        extraction
    }

    fn match_field(&self, field: Field, text: &str) -> Option<Value> {
        let keyword = self.mode == ExtractionMode::Keyword;
        match field {
            Field::OrderId => rules::order_id(text).map(Value::Text),
            Field::Product => rules::product(text)
                .or_else(|| keyword.then(|| keywords::product(text)).flatten())
                .map(Value::Text),
            Field::ReturnReason => rules::return_reason(text)
                .or_else(|| keyword.then(|| keywords::return_reason(text)).flatten())
                .map(Value::Text),
            Field::Date => rules::date(text).map(Value::Text),
            Field::Cost => rules::cost(text).map(Value::Real),
            Field::StoreName => rules::store_name(text).map(Value::Text),
            Field::Category => rules::category(text).map(Value::Text),
            Field::ApprovedFlag => rules::approval(text).map(|a| Value::from(a.as_str())),
        }
    }

    fn fallback(&self, field: Field) -> Value {
        match field {
            Field::Date => Value::Text(self.today().to_string()),
            Field::ApprovedFlag => Value::from(Approval::No.as_str()),
            _ => Value::Null,
        }
    }

    fn today(&self) -> Date {
        self.today.unwrap_or_else(|| Zoned::now().date())
    }
}

/// Extraction bound to the live table layout.
///
/// Holds the table manager only to ask which columns exist; it never alters
/// the schema.
pub struct Extractor {
    tables: Arc<TableManager>,
    fields: FieldExtractor,
}

impl Extractor {
    pub fn new(tables: Arc<TableManager>, fields: FieldExtractor) -> Self {
        Self { tables, fields }
    }

    /// Extracts against the columns the table has right now.
    ///
    /// # Errors
    ///
    /// Fails only if the table cannot be introspected.
    pub fn analyze(&self, text: &str) -> Result<Extraction> {
        let columns = self.tables.available_columns()?;
        Ok(self.fields.extract(text, &columns))
    }
}
