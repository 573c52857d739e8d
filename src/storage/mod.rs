//! Persistence for sessions and shared items
//!
//! All business logic talks to a [`Storage`] trait object. Two backends
//! implement it:
//!
//! - [`SqliteStorage`]: durable, one SQLite file with `sessions` and
//!   `shared_items` tables.
//! - [`MemoryStorage`]: ephemeral, a flat newest-first list that disappears
//!   with the process.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStorage;
pub use sqlite::{default_db_path, SqliteStorage};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::ids::{SessionId, ShareId};

/// Storage error types
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Failed to create database directory: {0}")]
    CreateDir(std::io::Error),

    #[error("Invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Slug already in use: {0}")]
    DuplicateSlug(String),

    #[error("Share references an unknown session")]
    UnknownSession,

    #[error("Failed to acquire lock")]
    LockError,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A browser session that owns shares
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub id: SessionId,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// A fresh session created now
    pub fn new() -> Self {
        Self {
            id: SessionId::new(),
            created_at: Utc::now(),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// A stored piece of text addressed by its slug
///
/// Serializes to the record returned by the public fetch endpoint. The
/// password is included in plain text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SharedItem {
    pub id: ShareId,
    pub session_id: SessionId,
    pub slug: String,
    pub content: String,
    pub password: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl SharedItem {
    pub fn has_password(&self) -> bool {
        self.password.is_some()
    }

    /// Whether `attempt` opens this share. Exact, plaintext comparison.
    pub fn password_matches(&self, attempt: &str) -> bool {
        match self.password {
            Some(ref password) => password == attempt,
            None => true,
        }
    }
}

/// Capability shared by every persistence backend.
///
/// Implementations must enforce two constraints themselves: slugs are
/// globally unique ([`StorageError::DuplicateSlug`]) and a share's session
/// must exist ([`StorageError::UnknownSession`]).
pub trait Storage: Send + Sync {
    /// Short backend name for logs
    fn backend_name(&self) -> &'static str;

    /// Persist a new session
    fn insert_session(&self, session: &Session) -> StorageResult<()>;

    /// Whether a session with this id has been stored
    fn session_exists(&self, id: SessionId) -> StorageResult<bool>;

    /// Number of stored sessions
    fn count_sessions(&self) -> StorageResult<u64>;

    /// Persist a new shared item
    fn insert_share(&self, item: &SharedItem) -> StorageResult<()>;

    /// Look up a shared item by its public slug
    fn get_share_by_slug(&self, slug: &str) -> StorageResult<Option<SharedItem>>;

    /// A session's shares, newest first
    fn list_shares(
        &self,
        session_id: SessionId,
        limit: u32,
        offset: u64,
    ) -> StorageResult<Vec<SharedItem>>;

    /// Number of shares owned by a session
    fn count_shares(&self, session_id: SessionId) -> StorageResult<u64>;

    /// Delete a shared item by internal id, returning whether a row was removed
    fn delete_share(&self, id: ShareId) -> StorageResult<bool>;
}

/// Format a timestamp for storage.
///
/// Fixed microsecond precision keeps lexicographic and chronological order
/// identical.
pub(crate) fn timestamp_to_string(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp
pub(crate) fn timestamp_from_string(s: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::InvalidTimestamp(e.to_string()))
}
