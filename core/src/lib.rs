//! Core value types and identifier validation for dbgrid.
//!
//! This crate defines the engine-free data model shared by the access layer
//! and its hosts:
//!
//! - [`Value`]: one cell, a closed variant over the five storage classes.
//! - [`Row`]: an ordered column-name → value mapping.
//! - [`ColumnInfo`]: schema metadata for one column.
//! - [`QueryResult`] / [`ExecuteResult`] / [`SqlOutcome`]: read and write
//!   outcomes.
//! - [`Ident`]: a table or column name that passed validation and may be
//!   spliced into SQL text.
//!
//! # Example
//!
//! ```
//! use dbgrid_core::*;
//!
//! let table = Ident::table("items").unwrap();
//! let column = Ident::column("name").unwrap();
//! let sql = format!("UPDATE {table} SET {column} = ? WHERE rowid = ?");
//! assert_eq!(sql, r#"UPDATE "items" SET "name" = ? WHERE rowid = ?"#);
//!
//! assert!(Ident::table("items; DROP TABLE items").is_err());
//! assert_eq!(StatementKind::classify("select 1"), StatementKind::Read);
//! ```

mod types;
mod validate;

pub use types::*;
pub use validate::{
    FORBIDDEN_IDENTIFIER_CHARS, Ident, IdentKind, IdentifierError, is_bare_identifier,
};
