//! The database handle: lifecycle and persistence.
//!
//! A [`DatabaseHandle`] owns at most one engine instance, loaded from one
//! file. It is either closed or open; every operation other than
//! [`save`](DatabaseHandle::save) and [`close`](DatabaseHandle::close)
//! fails with [`AccessError::NotOpen`] while closed.
//!
//! Nothing guards against two handles bound to the same path: each save
//! rewrites the whole file, so concurrent handles clobber each other.

use std::path::{Path, PathBuf};

use dbgrid_core::ExecuteResult;
use dbgrid_db::{DEFAULT_PAGE_SIZE, EditorConfig, EngineOptions, load_database, write_image};
use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::error::{AccessError, Result};

/// An open engine instance and the file it came from.
pub(crate) struct OpenDatabase {
    pub(crate) conn: Connection,
    pub(crate) path: PathBuf,
}

/// Exclusive owner of one open database.
///
/// # Examples
///
/// ```no_run
/// use dbgrid_sqlite::DatabaseHandle;
///
/// let mut db = DatabaseHandle::new();
/// db.open("inventory.db").unwrap();
/// assert!(db.is_open());
///
/// for table in db.get_tables().unwrap() {
///     println!("{table}");
/// }
///
/// db.close();
/// assert!(!db.is_open());
/// ```
pub struct DatabaseHandle {
    state: Option<OpenDatabase>,
    engine: EngineOptions,
    default_page_size: usize,
}

impl Default for DatabaseHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl DatabaseHandle {
    /// Creates a closed handle with default engine options.
    pub fn new() -> Self {
        Self {
            state: None,
            engine: EngineOptions::default(),
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Creates a closed handle using the engine options and page size from
    /// `config`.
    pub fn with_config(config: &EditorConfig) -> Self {
        Self {
            state: None,
            engine: config.engine,
            default_page_size: config.default_page_size,
        }
    }

    /// Opens `path`, replacing any database this handle already holds.
    ///
    /// The new file is fully loaded before the previous engine is released,
    /// so a failed open leaves the handle exactly as it was.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Load`] wrapping
    /// [`NotFound`](dbgrid_db::DatabaseError::NotFound),
    /// [`UnsupportedFormat`](dbgrid_db::DatabaseError::UnsupportedFormat) or
    /// [`InvalidFormat`](dbgrid_db::DatabaseError::InvalidFormat).
    pub fn open(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let conn = load_database(path, &self.engine)?;

        self.close();
        self.state = Some(OpenDatabase {
            conn,
            path: path.to_path_buf(),
        });
        info!(path = %path.display(), "opened database");
        Ok(())
    }

    /// Creates a handle and opens `path` with default options.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let mut handle = Self::new();
        handle.open(path)?;
        Ok(handle)
    }

    pub fn is_open(&self) -> bool {
        self.state.is_some()
    }

    /// Releases the engine instance. Calling it on a closed handle is a no-op.
    pub fn close(&mut self) {
        let Some(db) = self.state.take() else {
            return;
        };
        if let Err((_, err)) = db.conn.close() {
            warn!(path = %db.path.display(), error = %err, "engine reported an error on close");
        }
        info!(path = %db.path.display(), "closed database");
    }

    /// The file the open database was loaded from.
    pub fn path(&self) -> Option<&Path> {
        self.state.as_ref().map(|db| db.path.as_path())
    }

    /// Page size used by [`get_first_page`](Self::get_first_page).
    pub fn default_page_size(&self) -> usize {
        self.default_page_size
    }

    /// Overwrites the origin file with the current in-memory image.
    ///
    /// Does nothing on a closed handle.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Persist`] if the image cannot be serialized or
    /// written.
    pub fn save(&self) -> Result<()> {
        let Some(db) = &self.state else {
            return Ok(());
        };
        write_image(&db.conn, &db.path).map_err(AccessError::Persist)?;
        Ok(())
    }

    pub(crate) fn open_database(&self) -> Result<&OpenDatabase> {
        self.state.as_ref().ok_or(AccessError::NotOpen)
    }

    /// Borrows the underlying connection.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::NotOpen`] on a closed handle.
    pub fn connection(&self) -> Result<&Connection> {
        self.open_database().map(|db| &db.conn)
    }

    /// Saves after a write that went through, passing the result on.
    pub(crate) fn persist_applied(&self, result: ExecuteResult) -> Result<ExecuteResult> {
        if result.is_success() {
            self.save()?;
            debug!(changes = ?result.changes(), "persisted mutation");
        }
        Ok(result)
    }
}
