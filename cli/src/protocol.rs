//! Line-delimited JSON protocol for editor hosts.
//!
//! A host writes one [`EditorCommand`] per line and reads back one or more
//! [`EditorEvent`]s per command, each on its own line. Messages are tagged
//! by a camelCase `type` field:
//!
//! ```text
//! > {"type":"getTableData","table":"items","page":0,"pageSize":2}
//! < {"type":"tableData","table":"items","columns":[...],"rows":[...],"total":3,"page":0,"pageSize":2}
//! ```
//!
//! Nothing a host sends ends the session: a malformed line or a failed
//! operation is answered with an `error` event.

use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};

use dbgrid_sqlite::{
    AccessError, ColumnInfo, DatabaseHandle, ExecuteResult, Row, SqlOutcome, Value,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// A request from the host.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EditorCommand {
    /// The host is ready to receive the table list.
    Ready,
    GetTableData {
        table: String,
        #[serde(default)]
        page: usize,
        #[serde(default, rename = "pageSize")]
        page_size: Option<usize>,
    },
    #[serde(rename = "executeSQL")]
    ExecuteSql { sql: String },
    UpdateCell {
        table: String,
        rowid: i64,
        column: String,
        #[serde(default)]
        value: Value,
    },
    DeleteRow { table: String, rowid: i64 },
    InsertRow {
        table: String,
        #[serde(default)]
        data: BTreeMap<String, Value>,
    },
}

/// A message to the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EditorEvent {
    Init {
        tables: Vec<String>,
        #[serde(rename = "dbPath")]
        db_path: String,
    },
    TableData {
        table: String,
        columns: Vec<ColumnInfo>,
        rows: Vec<Row>,
        total: u64,
        page: usize,
        #[serde(rename = "pageSize")]
        page_size: usize,
    },
    SqlResult(SqlResult),
    UpdateSuccess { changes: u64 },
    DeleteSuccess { changes: u64 },
    InsertSuccess { changes: u64 },
    Error { message: String },
}

/// Body of a `sqlResult` event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SqlResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<ColumnInfo>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<Vec<Row>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<SqlOutcome> for SqlResult {
    fn from(outcome: SqlOutcome) -> Self {
        match outcome {
            SqlOutcome::Query(result) => SqlResult {
                success: true,
                columns: Some(result.columns),
                rows: Some(result.rows),
                changes: None,
                error: None,
            },
            SqlOutcome::Execute(result) => SqlResult {
                success: result.is_success(),
                columns: None,
                rows: None,
                changes: result.changes(),
                error: result.error().map(String::from),
            },
        }
    }
}

impl EditorEvent {
    pub fn error(message: impl Into<String>) -> Self {
        EditorEvent::Error {
            message: message.into(),
        }
    }
}

/// Serves editor commands against one open database.
pub struct Session {
    db: DatabaseHandle,
}

impl Session {
    pub fn new(db: DatabaseHandle) -> Self {
        Self { db }
    }

    /// Parses and handles one line of input.
    pub fn handle_line(&self, line: &str) -> Vec<EditorEvent> {
        match serde_json::from_str::<EditorCommand>(line) {
            Ok(command) => self.handle(command),
            Err(err) => vec![EditorEvent::error(format!("Invalid command: {err}"))],
        }
    }

    /// Handles one command. Failures are reported as `error` events.
    pub fn handle(&self, command: EditorCommand) -> Vec<EditorEvent> {
        debug!(?command, "editor command");
        self.dispatch(command)
            .unwrap_or_else(|err| vec![EditorEvent::error(err.to_string())])
    }

    fn dispatch(&self, command: EditorCommand) -> Result<Vec<EditorEvent>, AccessError> {
        match command {
            EditorCommand::Ready => Ok(vec![self.init_event()?]),
            EditorCommand::GetTableData {
                table,
                page,
                page_size,
            } => {
                let page_size = page_size.unwrap_or_else(|| self.db.default_page_size());
                let result = self.db.get_table_data(&table, page, page_size)?;
                Ok(vec![EditorEvent::TableData {
                    table,
                    columns: result.columns,
                    rows: result.rows,
                    total: result.total.unwrap_or_default(),
                    page,
                    page_size,
                }])
            }
            EditorCommand::ExecuteSql { sql } => {
                let outcome = self.db.execute_sql(&sql)?;
                let wrote = matches!(outcome, SqlOutcome::Execute(ExecuteResult::Applied { .. }));
                let mut events = vec![EditorEvent::SqlResult(outcome.into())];
                if wrote {
                    events.push(self.init_event()?);
                }
                Ok(events)
            }
            EditorCommand::UpdateCell {
                table,
                rowid,
                column,
                value,
            } => {
                let result = self.db.update_cell(&table, rowid, &column, value)?;
                Ok(vec![mutation_event(result, |changes| {
                    EditorEvent::UpdateSuccess { changes }
                })])
            }
            EditorCommand::DeleteRow { table, rowid } => {
                let result = self.db.delete_row(&table, rowid)?;
                Ok(vec![mutation_event(result, |changes| {
                    EditorEvent::DeleteSuccess { changes }
                })])
            }
            EditorCommand::InsertRow { table, data } => {
                let data: Vec<(String, Value)> = data.into_iter().collect();
                let result = self.db.insert_row(&table, &data)?;
                Ok(vec![mutation_event(result, |changes| {
                    EditorEvent::InsertSuccess { changes }
                })])
            }
        }
    }

    fn init_event(&self) -> Result<EditorEvent, AccessError> {
        Ok(EditorEvent::Init {
            tables: self.db.get_tables()?,
            db_path: self
                .db
                .path()
                .map(|path| path.display().to_string())
                .unwrap_or_default(),
        })
    }

    /// Reads commands from `input` until end of stream, writing each event
    /// as one JSON line to `output`. Blank lines are skipped.
    pub fn serve<R: BufRead, W: Write>(&self, input: R, mut output: W) -> io::Result<()> {
        info!("editor session started");
        for line in input.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            for event in self.handle_line(&line) {
                let json = serde_json::to_string(&event).map_err(io::Error::other)?;
                writeln!(output, "{json}")?;
            }
            output.flush()?;
        }
        info!("editor session ended");
        Ok(())
    }
}

fn mutation_event(result: ExecuteResult, success: impl FnOnce(u64) -> EditorEvent) -> EditorEvent {
    match result {
        ExecuteResult::Applied { changes } => success(changes),
        ExecuteResult::Failed { error } => EditorEvent::error(error),
    }
}
