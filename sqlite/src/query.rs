//! Statement execution: reads propagate, writes report.
//!
//! [`DatabaseHandle::query_all`] is the read primitive. Any engine failure
//! (bad syntax, unknown table) propagates as [`AccessError::Engine`] so the
//! caller can tell "no rows" from "broken query".
//!
//! [`DatabaseHandle::execute`] is the write primitive. Engine failures are
//! captured into [`ExecuteResult::Failed`] and returned normally, so a UI can
//! show them inline.
//!
//! [`DatabaseHandle::execute_sql`] routes an ad-hoc statement to one or the
//! other by its leading keyword, and persists successful writes.
//!
//! [`AccessError::Engine`]: crate::AccessError::Engine

use dbgrid_core::{ColumnInfo, ExecuteResult, QueryResult, Row, SqlOutcome, StatementKind, Value};
use rusqlite::{Connection, Statement, ffi, params_from_iter};
use tracing::{debug, warn};

use crate::convert::{Param, read_row};
use crate::error::Result;
use crate::handle::DatabaseHandle;

/// Prepares `sql`, rejecting text that holds no statement at all.
///
/// Whitespace or comments alone prepare to a null statement, which the
/// engine would only report as API misuse once stepped.
fn prepare_statement<'c>(conn: &'c Connection, sql: &str) -> rusqlite::Result<Statement<'c>> {
    let stmt = conn.prepare(sql)?;
    if stmt.expanded_sql().is_none() {
        return Err(rusqlite::Error::SqliteFailure(
            ffi::Error::new(ffi::SQLITE_MISUSE),
            Some("empty statement".to_string()),
        ));
    }
    Ok(stmt)
}

/// Prepares `sql`, binds `params` positionally, and collects every row.
pub(crate) fn query_rows(conn: &Connection, sql: &str, params: &[Value]) -> rusqlite::Result<Vec<Row>> {
    let mut stmt = prepare_statement(conn, sql)?;
    let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

    let mut rows = stmt.query(params_from_iter(params.iter().map(Param)))?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        out.push(read_row(row, &names)?);
    }
    Ok(out)
}

/// Runs `sql` to completion and returns the engine's change count.
///
/// Rows produced by the statement (e.g. `RETURNING`) are stepped through and
/// discarded.
pub(crate) fn run_statement(conn: &Connection, sql: &str, params: &[Value]) -> rusqlite::Result<u64> {
    let mut stmt = prepare_statement(conn, sql)?;
    let mut rows = stmt.query(params_from_iter(params.iter().map(Param)))?;
    while rows.next()?.is_some() {}
    Ok(conn.changes())
}

/// Column descriptors for an ad-hoc read, taken from the first row's keys.
fn columns_from_rows(rows: &[Row]) -> Vec<ColumnInfo> {
    rows.first()
        .map(|row| row.columns().map(ColumnInfo::named).collect())
        .unwrap_or_default()
}

impl DatabaseHandle {
    /// Runs a read statement and returns all of its rows.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::NotOpen`](crate::AccessError::NotOpen) on a
    /// closed handle and [`AccessError::Engine`](crate::AccessError::Engine)
    /// if the statement fails to prepare or step.
    pub fn query_all(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        let conn = self.connection()?;
        let rows = query_rows(conn, sql, params)?;
        debug!(sql, rows = rows.len(), "query");
        Ok(rows)
    }

    /// Runs a write statement.
    ///
    /// Engine failures become [`ExecuteResult::Failed`] carrying the engine's
    /// message verbatim. Nothing is persisted here; see
    /// [`execute_sql`](Self::execute_sql) and the CRUD operations.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::NotOpen`](crate::AccessError::NotOpen) on a
    /// closed handle.
    pub fn execute(&self, sql: &str, params: &[Value]) -> Result<ExecuteResult> {
        let conn = self.connection()?;
        match run_statement(conn, sql, params) {
            Ok(changes) => {
                debug!(sql, changes, "execute");
                Ok(ExecuteResult::Applied { changes })
            }
            Err(err) => {
                warn!(sql, error = %err, "write statement failed");
                Ok(ExecuteResult::Failed {
                    error: err.to_string(),
                })
            }
        }
    }

    /// Runs an ad-hoc statement, classified by its leading keyword.
    ///
    /// Reads (`SELECT`, `PRAGMA`, `EXPLAIN`) return a [`QueryResult`] whose
    /// columns are named after the first row's keys (none if there are no
    /// rows). Everything else runs through [`execute`](Self::execute) and is
    /// persisted if it succeeds.
    ///
    /// # Errors
    ///
    /// Read failures propagate as
    /// [`AccessError::Engine`](crate::AccessError::Engine); a failed save
    /// after a successful write propagates as
    /// [`AccessError::Persist`](crate::AccessError::Persist).
    pub fn execute_sql(&self, sql: &str) -> Result<SqlOutcome> {
        match StatementKind::classify(sql) {
            StatementKind::Read => {
                let rows = self.query_all(sql, &[])?;
                Ok(SqlOutcome::Query(QueryResult {
                    columns: columns_from_rows(&rows),
                    rows,
                    total: None,
                }))
            }
            StatementKind::Write => {
                let result = self.execute(sql, &[])?;
                Ok(SqlOutcome::Execute(self.persist_applied(result)?))
            }
        }
    }
}
