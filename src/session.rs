//! Cookie-identified browser sessions
//!
//! Every create and list request passes through [`SessionManager::resolve`],
//! which turns the value of the `session_id` cookie into a stored session.
//! A missing, malformed or unknown cookie silently yields a fresh session; the
//! caller is told to (re)issue the cookie.

use std::sync::Arc;

use axum_extra::extract::cookie::{Cookie, SameSite};
use tracing::{debug, info};

use crate::ids::SessionId;
use crate::storage::{Session, Storage, StorageResult};

/// Name of the cookie carrying the session id
pub const SESSION_COOKIE_NAME: &str = "session_id";

/// Session cookie lifetime in seconds (30 days)
pub const SESSION_COOKIE_MAX_AGE_SECS: i64 = 30 * 24 * 60 * 60;

/// Outcome of resolving a request's session cookie
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedSession {
    pub id: SessionId,
    /// True when a session was minted and the cookie must be (re)set
    pub is_new: bool,
}

/// Maps session cookies to stored sessions
pub struct SessionManager {
    store: Arc<dyn Storage>,
    secure_cookies: bool,
}

impl SessionManager {
    pub fn new(store: Arc<dyn Storage>, secure_cookies: bool) -> Self {
        Self {
            store,
            secure_cookies,
        }
    }

    /// Resolve the session for a request carrying `cookie`.
    pub fn resolve(&self, cookie: Option<&str>) -> StorageResult<ResolvedSession> {
        if let Some(value) = cookie {
            match value.parse::<SessionId>() {
                Ok(id) if self.store.session_exists(id)? => {
                    return Ok(ResolvedSession { id, is_new: false });
                }
                Ok(id) => {
                    debug!(session_id = %id, "Session cookie refers to unknown session, replacing");
                }
                Err(_) => {
                    debug!("Malformed session cookie, replacing");
                }
            }
        }

        let session = Session::new();
        self.store.insert_session(&session)?;
        info!(session_id = %session.id, "Created session");

        Ok(ResolvedSession {
            id: session.id,
            is_new: true,
        })
    }

    /// Build the cookie that hands `id` to the browser
    pub fn cookie(&self, id: SessionId) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE_NAME, id.to_string()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure_cookies)
            .max_age(time::Duration::seconds(SESSION_COOKIE_MAX_AGE_SECS))
            .build()
    }
}
