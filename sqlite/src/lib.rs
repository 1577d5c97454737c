//! SQLite access layer for dbgrid.
//!
//! A [`DatabaseHandle`] loads a database file into an in-memory engine
//! instance, serves reads and writes against it, and writes the whole image
//! back to the origin file after every successful mutation.
//!
//! # Architecture
//!
//! - **`handle`**: open/close lifecycle and persistence
//! - **`query`**: the read and write primitives, and ad-hoc SQL routing
//! - **`crud`**: table listing, schema, paginated reads and row edits
//! - **`convert`**: [`Value`] ↔ engine value conversion
//!
//! # Error contract
//!
//! Reads propagate engine failures as [`AccessError::Engine`]. Writes
//! report them as [`ExecuteResult::Failed`] and never return `Err` for an
//! engine-side problem. Calling anything on a closed handle fails with
//! [`AccessError::NotOpen`], and a rejected identifier fails with
//! [`AccessError::InvalidIdentifier`] before any SQL runs.
//!
//! # Quick start
//!
//! ```no_run
//! use dbgrid_sqlite::{DatabaseHandle, Value};
//!
//! let db = DatabaseHandle::open_path("inventory.db").unwrap();
//!
//! let page = db.get_table_data("items", 0, 50).unwrap();
//! println!("{} of {:?} rows", page.rows.len(), page.total);
//!
//! let result = db
//!     .insert_row("items", &[("name", Value::from("Widget")), ("price", Value::Real(9.5))])
//!     .unwrap();
//! assert!(result.is_success());
//! ```

mod convert;
mod crud;
mod error;
mod handle;
mod query;

pub use dbgrid_core::{
    ColumnInfo, ExecuteResult, Ident, IdentifierError, QueryResult, Row, SqlOutcome, Value,
};
pub use error::{AccessError, Result};
pub use handle::DatabaseHandle;
