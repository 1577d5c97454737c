//! Conversions between [`Value`] and the engine's value types.

use dbgrid_core::{Row, Value};
use rusqlite::ToSql;
use rusqlite::types::{ToSqlOutput, ValueRef};

/// Binds a [`Value`] as a statement parameter without copying it.
pub(crate) struct Param<'a>(pub(crate) &'a Value);

impl ToSql for Param<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let value = match self.0 {
            Value::Null => ValueRef::Null,
            Value::Integer(i) => ValueRef::Integer(*i),
            Value::Real(f) => ValueRef::Real(*f),
            Value::Text(s) => ValueRef::Text(s.as_bytes()),
            Value::Blob(b) => ValueRef::Blob(b),
        };
        Ok(ToSqlOutput::Borrowed(value))
    }
}

/// Copies an engine value out of a result row.
pub(crate) fn from_value_ref(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Real(f),
        ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Blob(bytes.to_vec()),
    }
}

/// Materializes the current result row as a name → value mapping.
pub(crate) fn read_row(row: &rusqlite::Row<'_>, names: &[String]) -> rusqlite::Result<Row> {
    let mut out = Row::new();
    for (idx, name) in names.iter().enumerate() {
        out.insert(name.as_str(), from_value_ref(row.get_ref(idx)?));
    }
    Ok(out)
}
