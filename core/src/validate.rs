//! Identifier validation for dynamically built SQL.
//!
//! Table and column names cannot be bound as statement parameters, so they
//! have to be spliced into SQL text as double-quoted identifiers. [`Ident`]
//! is the only way to obtain such a spliceable identifier: it can only be
//! constructed through [`Ident::table`] or [`Ident::column`], and its
//! `Display` impl renders the quoted form.
//!
//! A bare identifier (`[A-Za-z_][A-Za-z0-9_]*`) is accepted outright. Any
//! other name is accepted as long as it contains none of `"`, `'` or `;`,
//! the characters that could break out of a quoted identifier.
//!
//! # Examples
//!
//! ```
//! use dbgrid_core::{Ident, IdentifierError};
//!
//! let table = Ident::table("order items").unwrap();
//! assert_eq!(format!("SELECT * FROM {table}"), r#"SELECT * FROM "order items""#);
//!
//! let err = Ident::column(r#"name"; DROP TABLE users; --"#).unwrap_err();
//! assert!(matches!(err, IdentifierError::Column(_)));
//! ```

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Characters that are never allowed inside an identifier.
pub const FORBIDDEN_IDENTIFIER_CHARS: &[char] = &['"', '\'', ';'];

static BARE_IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static regex must compile")
});

/// An identifier that was rejected before reaching SQL text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    #[error("Invalid table name: {0}")]
    Table(String),
    #[error("Invalid column name: {0}")]
    Column(String),
}

/// What an identifier names; selects the error variant on rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentKind {
    Table,
    Column,
}

/// A validated table or column name, rendered double-quoted by `Display`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ident<'a> {
    name: &'a str,
    kind: IdentKind,
}

impl<'a> Ident<'a> {
    /// Validates a table name.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError::Table`] if the name contains a forbidden
    /// character.
    pub fn table(name: &'a str) -> Result<Self, IdentifierError> {
        Self::validate(name, IdentKind::Table)
    }

    /// Validates a column name.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError::Column`] if the name contains a forbidden
    /// character.
    pub fn column(name: &'a str) -> Result<Self, IdentifierError> {
        Self::validate(name, IdentKind::Column)
    }

    /// The single check every identifier passes through.
    pub fn validate(name: &'a str, kind: IdentKind) -> Result<Self, IdentifierError> {
        if is_bare_identifier(name) || !name.contains(FORBIDDEN_IDENTIFIER_CHARS) {
            return Ok(Self { name, kind });
        }
        Err(match kind {
            IdentKind::Table => IdentifierError::Table(name.to_string()),
            IdentKind::Column => IdentifierError::Column(name.to_string()),
        })
    }

    /// The raw, unquoted name.
    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn kind(&self) -> IdentKind {
        self.kind
    }
}

impl fmt::Display for Ident<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.name)
    }
}

/// Returns `true` if `name` needs no quoting at all.
pub fn is_bare_identifier(name: &str) -> bool {
    BARE_IDENTIFIER.is_match(name)
}
