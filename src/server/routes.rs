//! HTTP routes for the web server.

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::warn;

use super::assets::{content_type, StaticAssets};
use super::error::ApiError;
use super::templates::{ShareView, TemplateEngine};
use crate::session::{ResolvedSession, SessionManager, SESSION_COOKIE_NAME};
use crate::share_service::{CreatedShare, NewShare, SharePage, ShareService, ShareServiceError};
use crate::storage::{SharedItem, Storage};

/// Transport-level cap on request bodies. A maximal submission written
/// entirely as `\uXXXX` escapes (6 bytes per UTF-16 unit) still fits, so it
/// reaches validation in the share service.
pub const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

const CREATE_FAILED: &str = "Failed to create share";
const LIST_FAILED: &str = "Failed to fetch shares";
const GET_FAILED: &str = "Failed to fetch share";
const DELETE_FAILED: &str = "Failed to delete share";

/// Shared application state.
pub struct AppState {
    pub shares: ShareService,
    pub sessions: SessionManager,
    pub template_engine: TemplateEngine,
}

impl AppState {
    /// Wire services over an already opened store.
    pub fn new(store: Arc<dyn Storage>, public_url: Option<String>, secure_cookies: bool) -> Self {
        Self {
            shares: ShareService::new(store.clone(), public_url),
            sessions: SessionManager::new(store, secure_cookies),
            template_engine: TemplateEngine::default(),
        }
    }

    /// Resolve the request's session, handing back a jar that carries a new
    /// cookie when one was minted.
    fn resolve_session(
        &self,
        jar: CookieJar,
        failure: &'static str,
    ) -> Result<(ResolvedSession, CookieJar), ApiError> {
        let cookie = jar.get(SESSION_COOKIE_NAME).map(|c| c.value().to_string());
        let session = self
            .sessions
            .resolve(cookie.as_deref())
            .map_err(|e| ApiError::internal(failure, e))?;

        let jar = if session.is_new {
            jar.add(self.sessions.cookie(session.id))
        } else {
            jar
        };
        Ok((session, jar))
    }
}

/// Build the router with all routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/shares", post(create_share).get(list_shares))
        .route("/shares/:slug", get(get_share).delete(delete_share));

    Router::new()
        .route("/", get(index_handler))
        .route("/share/:slug", get(share_page).post(unlock_share_page))
        .route("/assets/*path", get(assets_handler))
        .route("/health", get(health_handler))
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Body of `POST /api/shares`.
#[derive(Debug, Deserialize)]
pub struct CreateShareRequest {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Query of `GET /api/shares`. Kept as strings so junk falls back to defaults.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
}

fn parse_number(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|s| s.trim().parse().ok())
}

/// Handler for creating a share.
async fn create_share(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    payload: Result<Json<CreateShareRequest>, JsonRejection>,
) -> Result<(StatusCode, CookieJar, Json<CreatedShare>), ApiError> {
    let Json(request) = payload?;

    // Validate before touching the session so a rejected request stores nothing.
    let share = NewShare::new(request.content.unwrap_or_default(), request.password)
        .map_err(|e| ApiError::from_service(e, CREATE_FAILED))?;

    let (session, jar) = state.resolve_session(jar, CREATE_FAILED)?;
    let created = state
        .shares
        .create(session.id, share)
        .map_err(|e| ApiError::from_service(e, CREATE_FAILED))?;

    Ok((StatusCode::CREATED, jar, Json(created)))
}

/// Handler for listing the session's shares.
async fn list_shares(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<ListParams>,
) -> Result<(CookieJar, Json<SharePage>), ApiError> {
    let (session, jar) = state.resolve_session(jar, LIST_FAILED)?;
    let page = state
        .shares
        .list(
            session.id,
            parse_number(params.page.as_deref()),
            parse_number(params.limit.as_deref()),
        )
        .map_err(|e| ApiError::from_service(e, LIST_FAILED))?;

    Ok((jar, Json(page)))
}

/// Handler for the public fetch by slug.
async fn get_share(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<SharedItem>, ApiError> {
    let item = state
        .shares
        .get(&slug)
        .map_err(|e| ApiError::from_service(e, GET_FAILED))?;
    Ok(Json(item))
}

/// Handler for deleting by slug. Any caller holding the slug may delete.
async fn delete_share(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .shares
        .delete(&slug)
        .map_err(|e| ApiError::from_service(e, DELETE_FAILED))?;
    Ok(Json(json!({ "success": true })))
}

/// Form posted by the unlock page.
#[derive(Debug, Deserialize)]
pub struct UnlockForm {
    #[serde(default)]
    pub password: String,
}

/// Handler for the home page.
async fn index_handler(State(state): State<Arc<AppState>>) -> Response {
    html_or_error(StatusCode::OK, state.template_engine.render_index())
}

/// Handler for viewing a share. Protected shares render only the unlock form.
async fn share_page(State(state): State<Arc<AppState>>, Path(slug): Path<String>) -> Response {
    match lookup_for_page(&state, &slug) {
        Ok(item) => {
            let view = ShareView::new(&item, false, false);
            html_or_error(StatusCode::OK, state.template_engine.render_share(&view))
        }
        Err(response) => response,
    }
}

/// Handler for the unlock form. The password is checked here, on the server.
async fn unlock_share_page(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Form(form): Form<UnlockForm>,
) -> Response {
    let item = match lookup_for_page(&state, &slug) {
        Ok(item) => item,
        Err(response) => return response,
    };

    if item.password_matches(&form.password) {
        let view = ShareView::new(&item, true, false);
        html_or_error(StatusCode::OK, state.template_engine.render_share(&view))
    } else {
        warn!(slug = %slug, "Incorrect share password");
        let view = ShareView::new(&item, false, true);
        html_or_error(
            StatusCode::UNAUTHORIZED,
            state.template_engine.render_share(&view),
        )
    }
}

/// Fetch a share for an HTML page, rendering the not-found or error page
/// when that fails.
fn lookup_for_page(state: &AppState, slug: &str) -> Result<SharedItem, Response> {
    match state.shares.get(slug) {
        Ok(item) => Ok(item),
        Err(ShareServiceError::NotFound(_)) => Err(html_or_error(
            StatusCode::NOT_FOUND,
            state.template_engine.render_not_found(),
        )),
        Err(e) => Err(ApiError::from_service(e, GET_FAILED).into_response()),
    }
}

fn html_or_error(status: StatusCode, rendered: Result<String, minijinja::Error>) -> Response {
    match rendered {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Template error: {}", e),
        )
            .into_response(),
    }
}

/// Handler for static assets.
async fn assets_handler(Path(path): Path<String>) -> Response {
    match StaticAssets::get(&path) {
        Some(file) => (
            [(header::CONTENT_TYPE, content_type(&path))],
            file.data.into_owned(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "Not found").into_response(),
    }
}

/// Liveness probe.
async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
