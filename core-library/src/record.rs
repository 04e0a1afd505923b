//! Field access shared by typed and raw book records.
//!
//! The comparator and the list engine only see records through
//! [`LibraryRecord`]. Typed [`Book`]s always carry every sortable field;
//! raw JSON objects ([`RawBook`]) may omit one entirely, which is how a
//! structurally absent field reaches the comparator.

use serde_json::Value;
use tracing::warn;

use crate::error::{LibraryError, Result};
use crate::models::{Book, ReadStatus};
use crate::sort::SortKey;

/// Raw value of a sortable field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    /// The record has no such property at all
    Absent,
    /// The property exists but is unset
    Null,
    Integer(i64),
    Text(&'a str),
}

/// A book-shaped record the list engine can filter and sort
pub trait LibraryRecord {
    /// Identity used to replace or remove single records
    fn record_id(&self) -> Option<i64>;

    /// Raw value for a sort key
    fn field(&self, key: SortKey) -> FieldValue<'_>;

    /// Title used by the search filter; empty when missing
    fn title(&self) -> &str;

    /// `None` when the record carries no recognisable status
    fn read_status(&self) -> Option<ReadStatus>;

    fn read_start_date(&self) -> Option<&str>;
}

fn optional_int(value: Option<i32>) -> FieldValue<'static> {
    value
        .map(|v| FieldValue::Integer(i64::from(v)))
        .unwrap_or(FieldValue::Null)
}

fn optional_text(value: Option<&str>) -> FieldValue<'_> {
    value.map(FieldValue::Text).unwrap_or(FieldValue::Null)
}

impl LibraryRecord for Book {
    fn record_id(&self) -> Option<i64> {
        Some(self.id.0)
    }

    fn field(&self, key: SortKey) -> FieldValue<'_> {
        match key {
            SortKey::Id => FieldValue::Integer(self.id.0),
            SortKey::Title => FieldValue::Text(&self.title),
            SortKey::Author => FieldValue::Text(&self.author),
            SortKey::Year => optional_int(self.year),
            SortKey::Rating => optional_int(self.rating),
            SortKey::ReadEndDate => optional_text(self.read_end_date.as_deref()),
        }
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn read_status(&self) -> Option<ReadStatus> {
        Some(self.read_status)
    }

    fn read_start_date(&self) -> Option<&str> {
        self.read_start_date.as_deref()
    }
}

/// Untyped book payload, as decoded straight from JSON
pub type RawBook = serde_json::Map<String, Value>;

impl LibraryRecord for RawBook {
    fn record_id(&self) -> Option<i64> {
        self.get("id").and_then(Value::as_i64)
    }

    fn field(&self, key: SortKey) -> FieldValue<'_> {
        match self.get(key.as_str()) {
            None => FieldValue::Absent,
            Some(Value::Null) => FieldValue::Null,
            Some(Value::Bool(b)) => FieldValue::Integer(i64::from(*b)),
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f.floor() as i64))
                .map(FieldValue::Integer)
                .unwrap_or(FieldValue::Null),
            Some(Value::String(s)) => FieldValue::Text(s.as_str()),
            // Arrays and objects have no meaningful order
            Some(_) => FieldValue::Null,
        }
    }

    fn title(&self) -> &str {
        self.get("title").and_then(Value::as_str).unwrap_or("")
    }

    fn read_status(&self) -> Option<ReadStatus> {
        self.get("read_status")
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
    }

    fn read_start_date(&self) -> Option<&str> {
        self.get("read_start_date").and_then(Value::as_str)
    }
}

/// Decode a JSON array of book objects, keeping missing fields absent
///
/// Every element must be an object.
pub fn parse_raw_books(json: &str) -> Result<Vec<RawBook>> {
    let values: Vec<Value> = serde_json::from_str(json)?;
    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| match value {
            Value::Object(map) => Ok(map),
            other => Err(LibraryError::InvalidRecord {
                index,
                message: format!("expected an object, found {}", json_kind(&other)),
            }),
        })
        .collect()
}

/// Decode a JSON array of typed books
///
/// Books failing [`Book::validate`] are kept and logged with a warning.
pub fn parse_books(json: &str) -> Result<Vec<Book>> {
    let books: Vec<Book> = serde_json::from_str(json)?;
    for (index, book) in books.iter().enumerate() {
        if let Err(message) = book.validate() {
            warn!(index, id = book.id.0, %message, "Book record failed validation");
        }
    }
    Ok(books)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
