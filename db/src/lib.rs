//! Database file I/O for dbgrid.
//!
//! This crate moves SQLite images between disk and an in-memory engine:
//!
//! - [`load_database`] validates a path (existence, extension, header) and
//!   copies the file into a fresh engine instance created by [`init_engine`].
//! - [`write_image`] serializes the engine's database and overwrites a file
//!   with it.
//! - [`EditorConfig`] holds the YAML-configurable settings, including the
//!   [`EngineOptions`] applied at initialization.
//!
//! # Quick start
//!
//! ```no_run
//! use dbgrid_db::{EditorConfig, load_database, write_image};
//!
//! let config = EditorConfig::default();
//! let path = std::path::Path::new("app.db");
//!
//! let conn = load_database(path, &config.engine).unwrap();
//! conn.execute("DELETE FROM sessions", []).unwrap();
//! write_image(&conn, path).unwrap();
//! ```

mod config;
mod error;
mod loader;
mod persist;

pub use config::{DEFAULT_PAGE_SIZE, EditorConfig, EngineOptions};
pub use error::{DatabaseError, Result};
pub use loader::{
    SQLITE_MAGIC, SUPPORTED_EXTENSIONS, check_path, init_engine, is_database_header,
    load_database,
};
pub use persist::write_image;
