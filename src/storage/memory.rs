//! Ephemeral in-process storage
//!
//! Keeps every share in a single newest-first list, the same shape a browser
//! keeps in local storage. Nothing survives a restart.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{Session, SharedItem, Storage, StorageError, StorageResult};
use crate::ids::{SessionId, ShareId};

#[derive(Default)]
struct MemoryState {
    sessions: HashMap<SessionId, Session>,
    /// Newest first
    items: Vec<SharedItem>,
}

/// Storage backend holding everything in memory
#[derive(Default)]
pub struct MemoryStorage {
    state: RwLock<MemoryState>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StorageResult<RwLockReadGuard<'_, MemoryState>> {
        self.state.read().map_err(|_| StorageError::LockError)
    }

    fn write(&self) -> StorageResult<RwLockWriteGuard<'_, MemoryState>> {
        self.state.write().map_err(|_| StorageError::LockError)
    }
}

impl Storage for MemoryStorage {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn insert_session(&self, session: &Session) -> StorageResult<()> {
        self.write()?.sessions.insert(session.id, session.clone());
        Ok(())
    }

    fn session_exists(&self, id: SessionId) -> StorageResult<bool> {
        Ok(self.read()?.sessions.contains_key(&id))
    }

    fn count_sessions(&self) -> StorageResult<u64> {
        Ok(self.read()?.sessions.len() as u64)
    }

    fn insert_share(&self, item: &SharedItem) -> StorageResult<()> {
        let mut state = self.write()?;

        if !state.sessions.contains_key(&item.session_id) {
            return Err(StorageError::UnknownSession);
        }
        if state.items.iter().any(|i| i.slug == item.slug) {
            return Err(StorageError::DuplicateSlug(item.slug.clone()));
        }

        state.items.insert(0, item.clone());
        Ok(())
    }

    fn get_share_by_slug(&self, slug: &str) -> StorageResult<Option<SharedItem>> {
        Ok(self.read()?.items.iter().find(|i| i.slug == slug).cloned())
    }

    fn list_shares(
        &self,
        session_id: SessionId,
        limit: u32,
        offset: u64,
    ) -> StorageResult<Vec<SharedItem>> {
        let state = self.read()?;
        let mut owned: Vec<&SharedItem> = state
            .items
            .iter()
            .filter(|i| i.session_id == session_id)
            .collect();
        // Stable, so insertion order still breaks timestamp ties.
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(owned
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    fn count_shares(&self, session_id: SessionId) -> StorageResult<u64> {
        Ok(self
            .read()?
            .items
            .iter()
            .filter(|i| i.session_id == session_id)
            .count() as u64)
    }

    fn delete_share(&self, id: ShareId) -> StorageResult<bool> {
        let mut state = self.write()?;
        let before = state.items.len();
        state.items.retain(|i| i.id != id);
        Ok(state.items.len() < before)
    }
}
