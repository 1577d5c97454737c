//! Value and result type definitions for table browsing and editing.
//!
//! This module defines the data model exchanged between the access layer and
//! a host shell. The types are designed for serialization with [`serde`] so
//! they can be handed to a UI over JSON without further mapping.

use std::fmt;

use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};

/// A single cell value.
///
/// Mirrors the five storage classes of the embedded engine. The JSON form is
/// untagged: `null`, a number, a string, or an array of bytes for blobs.
///
/// # Examples
///
/// ```
/// use dbgrid_core::Value;
///
/// assert_eq!(Value::from(42), Value::Integer(42));
/// assert_eq!(Value::from("hello").as_str(), Some("hello"));
/// assert!(Value::from(None::<i64>).is_null());
/// assert_eq!(Value::Blob(vec![1, 2, 3]).to_string(), "[BLOB 3 bytes]");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(untagged)]
pub enum Value {
    /// SQL `NULL`.
    #[default]
    Null,
    /// 64-bit signed integer.
    Integer(i64),
    /// 64-bit IEEE float.
    Real(f64),
    /// UTF-8 text.
    Text(String),
    /// Raw bytes.
    Blob(Vec<u8>),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the integer payload, if any.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the text payload, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Converts a JSON value into a cell value.
    ///
    /// Booleans become `0`/`1`, numbers become integers when they fit in
    /// `i64` and reals otherwise, arrays of bytes become blobs. Objects and
    /// non-byte arrays are rejected.
    pub fn from_json(json: &serde_json::Value) -> Option<Self> {
        match json {
            serde_json::Value::Null => Some(Value::Null),
            serde_json::Value::Bool(b) => Some(Value::Integer(i64::from(*b))),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Value::Integer)
                .or_else(|| n.as_f64().map(Value::Real)),
            serde_json::Value::String(s) => Some(Value::Text(s.clone())),
            serde_json::Value::Array(items) => items
                .iter()
                .map(|item| item.as_u64().and_then(|b| u8::try_from(b).ok()))
                .collect::<Option<Vec<u8>>>()
                .map(Value::Blob),
            serde_json::Value::Object(_) => None,
        }
    }
}

impl fmt::Display for Value {
    /// Renders the value the way a data grid shows it.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Real(r) => write!(f, "{r}"),
            Value::Text(s) => f.write_str(s),
            Value::Blob(b) => write!(f, "[BLOB {} bytes]", b.len()),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ValueVisitor;

        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("null, a boolean, a number, a string, or an array of bytes")
            }

            fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
                Ok(Value::Null)
            }

            fn visit_none<E: de::Error>(self) -> Result<Value, E> {
                Ok(Value::Null)
            }

            fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Value, D::Error> {
                Value::deserialize(d)
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<Value, E> {
                Ok(Value::from(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
                Ok(Value::Integer(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
                Ok(i64::try_from(v).map_or(Value::Real(v as f64), Value::Integer))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
                Ok(Value::Real(v))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
                Ok(Value::Text(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Value, E> {
                Ok(Value::Text(v))
            }

            fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Value, E> {
                Ok(Value::Blob(v.to_vec()))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
                let mut bytes = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(byte) = seq.next_element::<u8>()? {
                    bytes.push(byte);
                }
                Ok(Value::Blob(bytes))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

/// One result row: column names mapped to values, in projection order.
///
/// Inserting a column name that is already present replaces its value in
/// place, so the last projection of a duplicated name wins.
///
/// # Examples
///
/// ```
/// use dbgrid_core::{Row, Value};
///
/// let mut row = Row::new();
/// row.insert("id", Value::Integer(1));
/// row.insert("name", Value::from("Alice"));
/// row.insert("id", Value::Integer(2));
///
/// assert_eq!(row.len(), 2);
/// assert_eq!(row.get("id"), Some(&Value::Integer(2)));
/// assert_eq!(row.columns().collect::<Vec<_>>(), ["id", "name"]);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    entries: Vec<(String, Value)>,
}

impl Row {
    /// Creates an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `column` to `value`, replacing an existing entry of the same name.
    pub fn insert(&mut self, column: impl Into<String>, value: Value) {
        let column = column.into();
        match self.entries.iter_mut().find(|(name, _)| *name == column) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((column, value)),
        }
    }

    /// Looks up a value by column name.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Column names in projection order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// `(column, value)` pairs in projection order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (column, value) in iter {
            row.insert(column, value);
        }
        row
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (column, value) in &self.entries {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

/// Column metadata for one table, as reported by schema introspection.
///
/// Serialized with the engine's introspection field names so a host shell
/// can render headers without a mapping layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Zero-based position of the column in the table definition.
    #[serde(rename = "cid")]
    pub ordinal_position: i64,
    /// Column name.
    pub name: String,
    /// Declared type, empty when the column has none.
    #[serde(rename = "type")]
    pub declared_type: String,
    /// Whether the column carries a `NOT NULL` constraint.
    #[serde(rename = "notnull")]
    pub not_null: bool,
    /// Default expression text, or `NULL` when the column has no default.
    #[serde(rename = "dflt_value")]
    pub default_value: Value,
    /// Whether the column is part of the primary key.
    #[serde(rename = "pk")]
    pub is_primary_key: bool,
}

impl ColumnInfo {
    /// A bare descriptor carrying only a name.
    ///
    /// Used for ad-hoc query results, where columns are known only by the
    /// keys of the returned rows.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            ordinal_position: 0,
            name: name.into(),
            declared_type: String::new(),
            not_null: false,
            default_value: Value::Null,
            is_primary_key: false,
        }
    }
}

/// Rows returned by a read, with their column descriptors.
///
/// `total` is only set for paginated table reads and carries the row count
/// of the whole table, not of the returned page.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct QueryResult {
    pub columns: Vec<ColumnInfo>,
    pub rows: Vec<Row>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

/// Outcome of a write statement.
///
/// Engine failures on the write path are captured here instead of being
/// propagated, so a caller can render them inline. Serializes as
/// `{"success": true, "changes": n}` or `{"success": false, "error": "..."}`.
///
/// # Examples
///
/// ```
/// use dbgrid_core::ExecuteResult;
///
/// let ok = ExecuteResult::Applied { changes: 1 };
/// assert!(ok.is_success());
/// assert_eq!(ok.changes(), Some(1));
///
/// let failed = ExecuteResult::Failed { error: "NOT NULL constraint failed: t.x".into() };
/// assert!(!failed.is_success());
/// assert!(failed.error().unwrap().contains("NOT NULL"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecuteResult {
    /// The statement ran; `changes` rows were inserted, updated, or deleted.
    Applied { changes: u64 },
    /// The engine rejected the statement.
    Failed { error: String },
}

impl ExecuteResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecuteResult::Applied { .. })
    }

    pub fn changes(&self) -> Option<u64> {
        match self {
            ExecuteResult::Applied { changes } => Some(*changes),
            ExecuteResult::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ExecuteResult::Applied { .. } => None,
            ExecuteResult::Failed { error } => Some(error),
        }
    }
}

impl Serialize for ExecuteResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ExecuteResult", 2)?;
        state.serialize_field("success", &self.is_success())?;
        match self {
            ExecuteResult::Applied { changes } => state.serialize_field("changes", changes)?,
            ExecuteResult::Failed { error } => state.serialize_field("error", error)?,
        }
        state.end()
    }
}

/// Result of an ad-hoc statement: rows for reads, a write outcome otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlOutcome {
    Query(QueryResult),
    Execute(ExecuteResult),
}

/// Read/write classification of an ad-hoc statement.
///
/// Decided by the leading keyword only: `SELECT`, `PRAGMA` and `EXPLAIN`
/// (case-insensitive, after trimming whitespace) are reads, anything else is
/// a write.
///
/// # Examples
///
/// ```
/// use dbgrid_core::StatementKind;
///
/// assert_eq!(StatementKind::classify("  select * from t"), StatementKind::Read);
/// assert_eq!(StatementKind::classify("PRAGMA table_info(t)"), StatementKind::Read);
/// assert_eq!(StatementKind::classify("DELETE FROM t"), StatementKind::Write);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Read,
    Write,
}

const READ_KEYWORDS: &[&str] = &["select", "pragma", "explain"];

impl StatementKind {
    pub fn classify(sql: &str) -> Self {
        let trimmed = sql.trim_start();
        let is_read = READ_KEYWORDS.iter().any(|keyword| {
            trimmed
                .get(..keyword.len())
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case(keyword))
        });
        if is_read {
            StatementKind::Read
        } else {
            StatementKind::Write
        }
    }
}
