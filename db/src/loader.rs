//! Database file loading.
//!
//! Turns a path on disk into an open, in-memory engine instance holding a
//! copy of the file's image. The origin file is only ever read here; all
//! subsequent edits happen in memory until [`write_image`](crate::write_image)
//! puts them back.
//!
//! # Checks, in order
//!
//! 1. The path exists ([`DatabaseError::NotFound`]).
//! 2. The extension is one of [`SUPPORTED_EXTENSIONS`], compared
//!    case-insensitively ([`DatabaseError::UnsupportedFormat`]). Nothing is
//!    read from the file before this check passes.
//! 3. A non-empty file starts with the SQLite header magic
//!    ([`DatabaseError::InvalidFormat`]).
//! 4. The engine accepts the image ([`DatabaseError::InvalidFormat`]).
//!
//! The file is read into memory in one pass and handed to the engine as a
//! byte image, so the engine never opens the origin path and no `-journal`,
//! `-wal` or `-shm` sidecar is created next to it. Images in WAL mode are
//! switched to rollback mode in the copy, since an in-memory database cannot
//! keep a write-ahead log.
//!
//! ```no_run
//! use dbgrid_db::{EngineOptions, load_database};
//!
//! let conn = load_database("inventory.sqlite3".as_ref(), &EngineOptions::default()).unwrap();
//! let tables: i64 = conn
//!     .query_row("SELECT count(*) FROM sqlite_master", [], |row| row.get(0))
//!     .unwrap();
//! println!("{tables} schema objects");
//! ```

use std::path::Path;

use rusqlite::{Connection, MAIN_DB};
use tracing::debug;

use crate::config::EngineOptions;
use crate::error::{DatabaseError, Result};

/// Accepted file extensions, without the leading dot.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["db", "sqlite", "sqlite3"];

/// SQLite file header magic bytes (first 16 bytes).
pub const SQLITE_MAGIC: &[u8; 16] = b"SQLite format 3\0";

/// Header offsets of the file format write and read versions.
const FORMAT_VERSION_OFFSETS: [usize; 2] = [18, 19];
const FORMAT_VERSION_LEGACY: u8 = 1;
const FORMAT_VERSION_WAL: u8 = 2;

/// Creates a fresh, independent engine instance.
///
/// Each call yields its own in-memory database; no state is shared between
/// instances, so any number of handles can coexist in one process. Every
/// option is applied explicitly, since the engine's compiled-in defaults
/// may differ from [`EngineOptions::default`].
///
/// # Errors
///
/// Returns [`DatabaseError::EngineError`] if the engine cannot be started or
/// the options cannot be applied.
pub fn init_engine(options: &EngineOptions) -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    conn.pragma_update(None, "foreign_keys", options.foreign_keys)?;
    Ok(conn)
}

/// Checks that `path` exists and carries a supported extension.
///
/// # Errors
///
/// Returns [`DatabaseError::NotFound`] or
/// [`DatabaseError::UnsupportedFormat`].
pub fn check_path(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(DatabaseError::NotFound(path.to_path_buf()));
    }

    let ext = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if !SUPPORTED_EXTENSIONS.contains(&ext.as_str()) {
        let shown = if ext.is_empty() { String::new() } else { format!(".{ext}") };
        return Err(DatabaseError::UnsupportedFormat(shown));
    }
    Ok(())
}

/// Returns `true` if `header` can start a database image.
///
/// An empty file is an empty database; anything else must begin with
/// [`SQLITE_MAGIC`].
pub fn is_database_header(header: &[u8]) -> bool {
    header.is_empty() || header.starts_with(SQLITE_MAGIC)
}

/// Loads the database at `path` into a new engine instance.
///
/// # Errors
///
/// See the module documentation for the order of checks. I/O failures while
/// reading the file surface as [`DatabaseError::IoError`].
pub fn load_database(path: &Path, options: &EngineOptions) -> Result<Connection> {
    check_path(path)?;

    let mut image = std::fs::read(path)?;
    let header = &image[..image.len().min(SQLITE_MAGIC.len())];
    if !is_database_header(header) {
        return Err(DatabaseError::InvalidFormat(
            "file is not a database".to_string(),
        ));
    }

    let mut conn = init_engine(options)?;
    if image.is_empty() {
        debug!(path = %path.display(), "loaded empty database file");
        return Ok(conn);
    }

    if clear_wal_mode(&mut image) {
        debug!(path = %path.display(), "database image is in WAL mode; loading as rollback");
    }
    let size = image.len();
    conn.deserialize_read_exact(MAIN_DB, image.as_slice(), size, false)
        .map_err(invalid_format)?;

    // The schema is parsed lazily; force it so a damaged image fails here.
    conn.query_row("SELECT count(*) FROM sqlite_master", [], |row| {
        row.get::<_, i64>(0)
    })
    .map_err(invalid_format)?;

    debug!(path = %path.display(), bytes = size, "loaded database image");
    Ok(conn)
}

/// Rewrites the format version bytes of a WAL-mode image to the rollback
/// journal value. Returns `true` if the image was in WAL mode.
fn clear_wal_mode(image: &mut [u8]) -> bool {
    let mut changed = false;
    for offset in FORMAT_VERSION_OFFSETS {
        match image.get_mut(offset) {
            Some(byte) if *byte == FORMAT_VERSION_WAL => {
                *byte = FORMAT_VERSION_LEGACY;
                changed = true;
            }
            _ => {}
        }
    }
    changed
}

fn invalid_format(err: rusqlite::Error) -> DatabaseError {
    DatabaseError::InvalidFormat(err.to_string())
}
