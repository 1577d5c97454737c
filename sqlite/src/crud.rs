//! Table-level operations built on the query executor.
//!
//! Every table or column name passes through [`Ident`] before it reaches
//! SQL text; values and row identifiers are always bound as parameters.
//! Mutations persist the whole database image after a successful change.

use dbgrid_core::{ColumnInfo, ExecuteResult, Ident, QueryResult, Value};
use tracing::debug;

use crate::convert::from_value_ref;
use crate::error::Result;
use crate::handle::DatabaseHandle;
use crate::query::query_rows;

const LIST_TABLES_SQL: &str = "SELECT name FROM sqlite_master \
     WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
     ORDER BY name";

/// Clamps a page size or offset into the engine's integer range.
fn to_sql_int(n: usize) -> Value {
    Value::Integer(i64::try_from(n).unwrap_or(i64::MAX))
}

impl DatabaseHandle {
    /// Lists user tables in name order, excluding the engine's own
    /// `sqlite_*` tables.
    pub fn get_tables(&self) -> Result<Vec<String>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(LIST_TABLES_SQL)?;
        let tables = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tables)
    }

    /// Describes the columns of `table` in declaration order.
    ///
    /// An unknown table yields an empty list.
    pub fn get_table_info(&self, table: &str) -> Result<Vec<ColumnInfo>> {
        let conn = self.connection()?;
        let table = Ident::table(table)?;

        let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
        let columns = stmt
            .query_map([], |row| {
                Ok(ColumnInfo {
                    ordinal_position: row.get(0)?,
                    name: row.get(1)?,
                    declared_type: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    not_null: row.get::<_, i64>(3)? != 0,
                    default_value: from_value_ref(row.get_ref(4)?),
                    is_primary_key: row.get::<_, i64>(5)? != 0,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(columns)
    }

    /// Reads one page of `table`.
    ///
    /// Rows are ordered by `rowid` and each carries a `rowid` key ahead of
    /// the table's own columns. `total` holds the table's full row count.
    ///
    /// # Errors
    ///
    /// Besides identifier and closed-handle errors, an unknown table fails
    /// with [`AccessError::Engine`](crate::AccessError::Engine).
    pub fn get_table_data(&self, table: &str, page: usize, page_size: usize) -> Result<QueryResult> {
        let conn = self.connection()?;
        let ident = Ident::table(table)?;

        let columns = self.get_table_info(table)?;
        let total: i64 = conn.query_row(&format!("SELECT count(*) FROM {ident}"), [], |row| {
            row.get(0)
        })?;

        let offset = page.saturating_mul(page_size);
        let rows = query_rows(
            conn,
            &format!("SELECT rowid AS \"rowid\", * FROM {ident} ORDER BY rowid LIMIT ?1 OFFSET ?2"),
            &[to_sql_int(page_size), to_sql_int(offset)],
        )?;
        debug!(table, page, page_size, total, rows = rows.len(), "read table page");

        Ok(QueryResult {
            columns,
            rows,
            total: Some(u64::try_from(total).unwrap_or_default()),
        })
    }

    /// Reads the first page of `table` using the handle's default page size.
    pub fn get_first_page(&self, table: &str) -> Result<QueryResult> {
        self.get_table_data(table, 0, self.default_page_size())
    }

    /// Sets one cell, addressed by row identifier and column name.
    ///
    /// `Value::Null` stores SQL `NULL`.
    pub fn update_cell(
        &self,
        table: &str,
        row_id: i64,
        column: &str,
        value: Value,
    ) -> Result<ExecuteResult> {
        self.open_database()?;
        let table = Ident::table(table)?;
        let column = Ident::column(column)?;

        let sql = format!("UPDATE {table} SET {column} = ?1 WHERE rowid = ?2");
        let result = self.execute(&sql, &[value, Value::Integer(row_id)])?;
        self.persist_applied(result)
    }

    /// Deletes one row. A missing row is not an error; it reports zero
    /// changes.
    pub fn delete_row(&self, table: &str, row_id: i64) -> Result<ExecuteResult> {
        self.open_database()?;
        let table = Ident::table(table)?;

        let sql = format!("DELETE FROM {table} WHERE rowid = ?1");
        let result = self.execute(&sql, &[Value::Integer(row_id)])?;
        self.persist_applied(result)
    }

    /// Inserts one row from `(column, value)` pairs.
    ///
    /// Constraint violations (a missing `NOT NULL` column, say) come back as
    /// [`ExecuteResult::Failed`] with the engine's message. An empty mapping
    /// inserts a row of column defaults.
    pub fn insert_row<K: AsRef<str>>(
        &self,
        table: &str,
        data: &[(K, Value)],
    ) -> Result<ExecuteResult> {
        self.open_database()?;
        let table = Ident::table(table)?;
        let columns = data
            .iter()
            .map(|(name, _)| Ident::column(name.as_ref()))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let sql = if columns.is_empty() {
            format!("INSERT INTO {table} DEFAULT VALUES")
        } else {
            let names: Vec<String> = columns.iter().map(ToString::to_string).collect();
            let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
            format!(
                "INSERT INTO {table} ({}) VALUES ({})",
                names.join(", "),
                placeholders.join(", ")
            )
        };

        let values: Vec<Value> = data.iter().map(|(_, value)| value.clone()).collect();
        let result = self.execute(&sql, &values)?;
        self.persist_applied(result)
    }
}
