//! Whole-image persistence.
//!
//! [`write_image`] serializes the complete in-memory database and overwrites
//! the target file with it. There is no journal or incremental write: every
//! save costs one full rewrite, and a crash in the middle of the write can
//! leave a truncated file behind.

use std::path::Path;

use rusqlite::{Connection, MAIN_DB};
use tracing::debug;

use crate::error::Result;

/// Writes the full image of the `main` database in `conn` to `path`.
///
/// Returns the number of bytes written. An engine holding no pages at all is
/// written as an empty file, which loads back as an empty database.
///
/// # Errors
///
/// Returns [`EngineError`](crate::DatabaseError::EngineError) if the image
/// cannot be serialized, or [`IoError`](crate::DatabaseError::IoError) if
/// the file cannot be written.
pub fn write_image(conn: &Connection, path: &Path) -> Result<u64> {
    let page_count: i64 = conn.query_row("PRAGMA page_count", [], |row| row.get(0))?;
    if page_count == 0 {
        std::fs::write(path, b"")?;
        debug!(path = %path.display(), bytes = 0, "saved empty database image");
        return Ok(0);
    }

    let image = conn.serialize(MAIN_DB)?;
    std::fs::write(path, &*image)?;
    let bytes = image.len() as u64;
    debug!(path = %path.display(), bytes, "saved database image");
    Ok(bytes)
}
