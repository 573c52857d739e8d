//! SQLite persistence
//!
//! Stores sessions and shared items so shares survive server restarts.

use rusqlite::{ffi, params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use super::{
    timestamp_from_string, timestamp_to_string, Session, SharedItem, Storage, StorageError,
    StorageResult,
};
use crate::ids::{SessionId, ShareId};

/// Database handle for session and share persistence
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Open or create a database at the default location
    /// (~/.local/share/share-paste/app.db)
    pub fn open_default() -> StorageResult<Self> {
        let path = default_db_path();
        Self::open(&path)
    }

    /// Open or create a database at the specified path
    pub fn open(path: &Path) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(StorageError::CreateDir)?;
        }

        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> StorageResult<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.create_tables()?;
        Ok(db)
    }

    /// Close the underlying connection, surfacing any error SQLite reports
    pub fn close(self) -> StorageResult<()> {
        let conn = self
            .conn
            .into_inner()
            .map_err(|_| StorageError::LockError)?;
        conn.close().map_err(|(_, e)| StorageError::Sqlite(e))
    }

    fn conn(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::LockError)
    }

    /// Create database tables if they don't exist
    fn create_tables(&self) -> StorageResult<()> {
        self.conn()?.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS shared_items (
                id TEXT PRIMARY KEY,
                session_id TEXT NOT NULL,
                slug TEXT UNIQUE NOT NULL,
                content TEXT NOT NULL,
                password TEXT,
                created_at TEXT NOT NULL,
                FOREIGN KEY (session_id) REFERENCES sessions(id)
            );

            CREATE INDEX IF NOT EXISTS idx_shared_items_session ON shared_items(session_id);
            CREATE INDEX IF NOT EXISTS idx_shared_items_slug ON shared_items(slug);
            "#,
        )?;
        Ok(())
    }
}

impl Storage for SqliteStorage {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    fn insert_session(&self, session: &Session) -> StorageResult<()> {
        self.conn()?.execute(
            "INSERT INTO sessions (id, created_at) VALUES (?1, ?2)",
            params![
                session.id.to_string(),
                timestamp_to_string(&session.created_at)
            ],
        )?;
        Ok(())
    }

    fn session_exists(&self, id: SessionId) -> StorageResult<bool> {
        let found: Option<String> = self
            .conn()?
            .query_row(
                "SELECT id FROM sessions WHERE id = ?1",
                params![id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn count_sessions(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn()?
            .query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn insert_share(&self, item: &SharedItem) -> StorageResult<()> {
        let result = self.conn()?.execute(
            r#"
            INSERT INTO shared_items (id, session_id, slug, content, password, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                item.id.to_string(),
                item.session_id.to_string(),
                item.slug,
                item.content,
                item.password,
                timestamp_to_string(&item.created_at),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                Err(StorageError::DuplicateSlug(item.slug.clone()))
            }
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.extended_code == ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
            {
                Err(StorageError::UnknownSession)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn get_share_by_slug(&self, slug: &str) -> StorageResult<Option<SharedItem>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, session_id, slug, content, password, created_at
            FROM shared_items
            WHERE slug = ?1
            "#,
        )?;

        let row_data: Option<ShareRowData> = stmt
            .query_row(params![slug], ShareRowData::from_row)
            .optional()?;

        row_data.map(ShareRowData::into_shared_item).transpose()
    }

    fn list_shares(
        &self,
        session_id: SessionId,
        limit: u32,
        offset: u64,
    ) -> StorageResult<Vec<SharedItem>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, session_id, slug, content, password, created_at
            FROM shared_items
            WHERE session_id = ?1
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?2 OFFSET ?3
            "#,
        )?;

        let mut rows = stmt.query(params![session_id.to_string(), limit, offset as i64])?;

        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            let row_data = ShareRowData::from_row(row)?;
            items.push(row_data.into_shared_item()?);
        }

        Ok(items)
    }

    fn count_shares(&self, session_id: SessionId) -> StorageResult<u64> {
        let total: i64 = self.conn()?.query_row(
            "SELECT COUNT(*) FROM shared_items WHERE session_id = ?1",
            params![session_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(total as u64)
    }

    fn delete_share(&self, id: ShareId) -> StorageResult<bool> {
        let removed = self.conn()?.execute(
            "DELETE FROM shared_items WHERE id = ?1",
            params![id.to_string()],
        )?;
        Ok(removed > 0)
    }
}

/// Get the default database path
pub fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("share-paste")
        .join("app.db")
}

/// Raw column values for one `shared_items` row.
///
/// Keeps the rusqlite row closure free of `StorageError` conversions.
struct ShareRowData {
    id: String,
    session_id: String,
    slug: String,
    content: String,
    password: Option<String>,
    created_at: String,
}

impl ShareRowData {
    fn from_row(row: &rusqlite::Row) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get(0)?,
            session_id: row.get(1)?,
            slug: row.get(2)?,
            content: row.get(3)?,
            password: row.get(4)?,
            created_at: row.get(5)?,
        })
    }

    fn into_shared_item(self) -> StorageResult<SharedItem> {
        Ok(SharedItem {
            id: self.id.parse()?,
            session_id: self.session_id.parse()?,
            slug: self.slug,
            content: self.content,
            password: self.password,
            created_at: timestamp_from_string(&self.created_at)?,
        })
    }
}
