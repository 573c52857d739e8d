//! Share lifecycle: create, fetch, list and delete
//!
//! Business rules live here once and run against any [`Storage`] backend.
//! Fetch and delete are addressed by slug only; neither checks which session
//! owns the share.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::ids::{is_valid_slug, new_slug, SessionId, ShareId};
use crate::storage::{SharedItem, Storage, StorageError};

/// Maximum content length in UTF-16 code units, as browsers count `value.length`
pub const MAX_CONTENT_LENGTH: usize = 1_000_000;

/// Page size used when the client gives none
pub const DEFAULT_PAGE_LIMIT: u32 = 20;

/// Largest page size a client may ask for
pub const MAX_PAGE_LIMIT: u32 = 50;

/// Errors that can occur in the share service
#[derive(Debug, Error)]
pub enum ShareServiceError {
    #[error("Content is required")]
    EmptyContent,

    #[error("Content exceeds maximum size of {}KB", .max / 1000)]
    ContentTooLarge { length: usize, max: usize },

    #[error("Share not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type for share service operations
pub type ShareServiceResult<T> = Result<T, ShareServiceError>;

/// A validated submission, ready to be stored
#[derive(Debug, Clone, PartialEq)]
pub struct NewShare {
    content: String,
    password: Option<String>,
}

impl NewShare {
    /// Validate a submission.
    ///
    /// Content must contain something other than whitespace and stay within
    /// [`MAX_CONTENT_LENGTH`] UTF-16 code units, the same measure the browser
    /// form checks. It is stored untrimmed. An empty
    /// password counts as no password.
    pub fn new(content: String, password: Option<String>) -> ShareServiceResult<Self> {
        if content.trim().is_empty() {
            return Err(ShareServiceError::EmptyContent);
        }

        let length = content.encode_utf16().count();
        if length > MAX_CONTENT_LENGTH {
            return Err(ShareServiceError::ContentTooLarge {
                length,
                max: MAX_CONTENT_LENGTH,
            });
        }

        Ok(Self {
            content,
            password: password.filter(|p| !p.is_empty()),
        })
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn has_password(&self) -> bool {
        self.password.is_some()
    }
}

/// What the client gets back after creating a share
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedShare {
    pub id: ShareId,
    pub slug: String,
    pub share_url: String,
    pub has_password: bool,
}

/// Page metadata for a list response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

impl Pagination {
    fn new(page: u32, limit: u32, total: u64) -> Self {
        Self {
            page,
            limit,
            total,
            total_pages: total.div_ceil(limit as u64),
        }
    }

    /// Row offset of the first item on this page
    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.limit as u64
    }
}

/// List entry; the owning session id is left out
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShareSummary {
    pub id: ShareId,
    pub slug: String,
    pub content: String,
    pub password: Option<String>,
    pub created_at: chrono::DateTime<Utc>,
}

impl From<SharedItem> for ShareSummary {
    fn from(item: SharedItem) -> Self {
        Self {
            id: item.id,
            slug: item.slug,
            content: item.content,
            password: item.password,
            created_at: item.created_at,
        }
    }
}

/// One page of a session's shares
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SharePage {
    pub items: Vec<ShareSummary>,
    pub pagination: Pagination,
}

/// Clamp raw pagination input to `page >= 1` and `1 <= limit <= 50`
pub fn clamp_page_params(page: Option<i64>, limit: Option<i64>) -> (u32, u32) {
    let page = page.unwrap_or(1).clamp(1, u32::MAX as i64) as u32;
    let limit = limit
        .unwrap_or(DEFAULT_PAGE_LIMIT as i64)
        .clamp(1, MAX_PAGE_LIMIT as i64) as u32;
    (page, limit)
}

/// Build the public URL for a slug, relative unless a base URL is configured
pub fn share_url(public_url: Option<&str>, slug: &str) -> String {
    match public_url {
        Some(base) => format!("{}/share/{}", base.trim_end_matches('/'), slug),
        None => format!("/share/{}", slug),
    }
}

/// Service for managing shared items
pub struct ShareService {
    store: Arc<dyn Storage>,
    public_url: Option<String>,
}

impl ShareService {
    /// Create a share service over the given store
    pub fn new(store: Arc<dyn Storage>, public_url: Option<String>) -> Self {
        Self { store, public_url }
    }

    /// Store a validated submission on behalf of `session_id`
    pub fn create(
        &self,
        session_id: SessionId,
        share: NewShare,
    ) -> ShareServiceResult<CreatedShare> {
        let item = SharedItem {
            id: ShareId::new(),
            session_id,
            slug: new_slug(),
            content: share.content,
            password: share.password,
            created_at: Utc::now(),
        };

        self.store.insert_share(&item)?;

        info!(
            slug = %item.slug,
            session_id = %session_id,
            protected = item.has_password(),
            "Share created"
        );

        Ok(CreatedShare {
            id: item.id,
            share_url: share_url(self.public_url.as_deref(), &item.slug),
            has_password: item.has_password(),
            slug: item.slug,
        })
    }

    /// Fetch a share by slug; no session is required
    pub fn get(&self, slug: &str) -> ShareServiceResult<SharedItem> {
        if !is_valid_slug(slug) {
            debug!(slug = %slug, "Rejecting malformed slug");
            return Err(ShareServiceError::NotFound(slug.to_string()));
        }

        self.store
            .get_share_by_slug(slug)?
            .ok_or_else(|| ShareServiceError::NotFound(slug.to_string()))
    }

    /// List a session's shares, newest first
    pub fn list(
        &self,
        session_id: SessionId,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> ShareServiceResult<SharePage> {
        let (page, limit) = clamp_page_params(page, limit);
        let total = self.store.count_shares(session_id)?;
        let pagination = Pagination::new(page, limit, total);

        let items = self
            .store
            .list_shares(session_id, limit, pagination.offset())?
            .into_iter()
            .map(ShareSummary::from)
            .collect();

        Ok(SharePage { items, pagination })
    }

    /// Delete a share by slug
    pub fn delete(&self, slug: &str) -> ShareServiceResult<()> {
        let item = self.get(slug)?;

        if !self.store.delete_share(item.id)? {
            // Removed by a concurrent request between lookup and delete.
            return Err(ShareServiceError::NotFound(slug.to_string()));
        }

        info!(slug = %slug, "Share deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, Session, SqliteStorage};

    fn create_test_service() -> (ShareService, SessionId) {
        let store: Arc<dyn Storage> = Arc::new(SqliteStorage::open_in_memory().unwrap());
        let session = Session::new();
        store.insert_session(&session).unwrap();
        (ShareService::new(store, None), session.id)
    }

    fn new_share(content: &str) -> NewShare {
        NewShare::new(content.to_string(), None).unwrap()
    }

    #[test]
    fn test_create_then_get() {
        let (service, session_id) = create_test_service();

        let created = service.create(session_id, new_share("hello world")).unwrap();
        assert_eq!(created.share_url, format!("/share/{}", created.slug));
        assert!(!created.has_password);

        let item = service.get(&created.slug).unwrap();
        assert_eq!(item.content, "hello world");
        assert_eq!(item.session_id, session_id);
        assert_eq!(item.id, created.id);
    }

    #[test]
    fn test_content_is_stored_untrimmed() {
        let (service, session_id) = create_test_service();
        let created = service
            .create(session_id, new_share("  padded\n"))
            .unwrap();
        assert_eq!(service.get(&created.slug).unwrap().content, "  padded\n");
    }

    #[test]
    fn test_empty_content_rejected() {
        assert!(matches!(
            NewShare::new(String::new(), None),
            Err(ShareServiceError::EmptyContent)
        ));
        assert!(matches!(
            NewShare::new(" \n\t ".to_string(), None),
            Err(ShareServiceError::EmptyContent)
        ));
    }

    #[test]
    fn test_content_size_bound() {
        let at_limit = "a".repeat(MAX_CONTENT_LENGTH);
        assert!(NewShare::new(at_limit, None).is_ok());

        let over = "a".repeat(MAX_CONTENT_LENGTH + 1);
        match NewShare::new(over, None) {
            Err(ShareServiceError::ContentTooLarge { length, max }) => {
                assert_eq!(length, MAX_CONTENT_LENGTH + 1);
                assert_eq!(max, MAX_CONTENT_LENGTH);
            }
            other => panic!("expected ContentTooLarge, got {:?}", other),
        }
    }

    #[test]
    fn test_content_length_counts_utf16_units() {
        // BMP characters count once regardless of their UTF-8 width.
        let content = "é".repeat(MAX_CONTENT_LENGTH);
        assert!(NewShare::new(content, None).is_ok());

        // Characters outside the BMP take a surrogate pair each.
        let content = "\u{1F600}".repeat(MAX_CONTENT_LENGTH / 2);
        assert!(NewShare::new(content, None).is_ok());

        let content = "\u{1F600}".repeat(MAX_CONTENT_LENGTH / 2 + 1);
        assert!(matches!(
            NewShare::new(content, None),
            Err(ShareServiceError::ContentTooLarge {
                length,
                max: MAX_CONTENT_LENGTH,
            }) if length == MAX_CONTENT_LENGTH + 2
        ));
    }

    #[test]
    fn test_empty_password_means_none() {
        let share = NewShare::new("text".to_string(), Some(String::new())).unwrap();
        assert!(!share.has_password());

        let share = NewShare::new("text".to_string(), Some("pw".to_string())).unwrap();
        assert!(share.has_password());
    }

    #[test]
    fn test_password_stored_in_plaintext() {
        let (service, session_id) = create_test_service();
        let share = NewShare::new("secret stuff".to_string(), Some("hunter2".to_string())).unwrap();

        let created = service.create(session_id, share).unwrap();
        assert!(created.has_password);
        assert_eq!(
            service.get(&created.slug).unwrap().password,
            Some("hunter2".to_string())
        );
    }

    #[test]
    fn test_get_unknown_and_malformed_slug() {
        let (service, _) = create_test_service();
        assert!(matches!(
            service.get("zzzzzzzz"),
            Err(ShareServiceError::NotFound(_))
        ));
        assert!(matches!(
            service.get("../etc/passwd"),
            Err(ShareServiceError::NotFound(_))
        ));
    }

    #[test]
    fn test_list_pagination() {
        let (service, session_id) = create_test_service();
        for i in 0..25 {
            service
                .create(session_id, new_share(&format!("share {}", i)))
                .unwrap();
        }

        let page1 = service.list(session_id, Some(1), Some(10)).unwrap();
        let page2 = service.list(session_id, Some(2), Some(10)).unwrap();
        let page3 = service.list(session_id, Some(3), Some(10)).unwrap();

        assert_eq!(page1.items.len(), 10);
        assert_eq!(page2.items.len(), 10);
        assert_eq!(page3.items.len(), 5);
        assert_eq!(page1.pagination.total, 25);
        assert_eq!(page1.pagination.total_pages, 3);

        // Newest first
        assert_eq!(page1.items[0].content, "share 24");
        assert_eq!(page3.items[4].content, "share 0");
    }

    #[test]
    fn test_list_is_session_scoped() {
        let store: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let mine = Session::new();
        let theirs = Session::new();
        store.insert_session(&mine).unwrap();
        store.insert_session(&theirs).unwrap();
        let service = ShareService::new(store, None);

        service.create(mine.id, new_share("mine")).unwrap();
        service.create(theirs.id, new_share("theirs")).unwrap();

        let page = service.list(mine.id, None, None).unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].content, "mine");
        assert_eq!(page.pagination.limit, DEFAULT_PAGE_LIMIT);
    }

    #[test]
    fn test_list_empty_session() {
        let (service, session_id) = create_test_service();
        let page = service.list(session_id, None, None).unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.pagination.total, 0);
        assert_eq!(page.pagination.total_pages, 0);
    }

    #[test]
    fn test_clamp_page_params() {
        assert_eq!(clamp_page_params(None, None), (1, DEFAULT_PAGE_LIMIT));
        assert_eq!(clamp_page_params(Some(0), Some(500)), (1, MAX_PAGE_LIMIT));
        assert_eq!(clamp_page_params(Some(-3), Some(0)), (1, 1));
        assert_eq!(clamp_page_params(Some(4), Some(10)), (4, 10));
    }

    #[test]
    fn test_delete_then_get_is_not_found() {
        let (service, session_id) = create_test_service();
        let created = service.create(session_id, new_share("bye")).unwrap();

        service.delete(&created.slug).unwrap();
        assert!(matches!(
            service.get(&created.slug),
            Err(ShareServiceError::NotFound(_))
        ));
        assert!(matches!(
            service.delete(&created.slug),
            Err(ShareServiceError::NotFound(_))
        ));
    }

    #[test]
    fn test_delete_does_not_check_owner() {
        let store: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let owner = Session::new();
        store.insert_session(&owner).unwrap();
        let service = ShareService::new(store, None);

        let created = service.create(owner.id, new_share("anyone can delete")).unwrap();
        // No session is passed to delete at all.
        assert!(service.delete(&created.slug).is_ok());
    }

    #[test]
    fn test_share_url_with_public_base() {
        assert_eq!(share_url(None, "abc12345"), "/share/abc12345");
        assert_eq!(
            share_url(Some("https://paste.example.com/"), "abc12345"),
            "https://paste.example.com/share/abc12345"
        );
    }

    #[test]
    fn test_create_for_unknown_session_fails() {
        let store: Arc<dyn Storage> = Arc::new(SqliteStorage::open_in_memory().unwrap());
        let service = ShareService::new(store, None);
        let result = service.create(SessionId::new(), new_share("orphan"));
        assert!(matches!(
            result,
            Err(ShareServiceError::Storage(StorageError::UnknownSession))
        ));
    }

    #[test]
    fn test_share_service_error_display() {
        let err = ShareServiceError::ContentTooLarge {
            length: 1_000_001,
            max: MAX_CONTENT_LENGTH,
        };
        assert_eq!(err.to_string(), "Content exceeds maximum size of 1000KB");

        let err = ShareServiceError::EmptyContent;
        assert_eq!(err.to_string(), "Content is required");

        let err = ShareServiceError::NotFound("abc".to_string());
        assert!(err.to_string().contains("Share not found"));
    }
}
