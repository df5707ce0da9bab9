// src/api.rs
// HTTP surface for the dashboard UI: paged news list, detail lookup and
// sign-in/out. Row-store calls require a signed-in session.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::controller::offset::OffsetPager;
use crate::controller::TABLE_PAGE_SIZE;
use crate::filter::{SortDir, SortKey};
use crate::news::{parse_timestamp_utc, time_ago, NewsRecord};
use crate::session::{AuthError, PasswordAuth, SessionHolder};
use crate::store::RowStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RowStore>,
    pub sessions: Arc<SessionHolder>,
    pub auth: Arc<dyn PasswordAuth>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
        .route("/api/news", get(list_news))
        .route("/api/news/{id}", get(news_detail))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

enum ApiError {
    Unauthorized,
    NotFound,
    Upstream(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "not signed in".to_string()),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "news item not found".to_string()),
            ApiError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[derive(Deserialize)]
struct ListParams {
    #[serde(default)]
    q: String,
    #[serde(default)]
    tickers: String,
    sort: Option<SortKey>,
    dir: Option<SortDir>,
    #[serde(default = "default_page")]
    page: u32,
    page_size: Option<u32>,
}

fn default_page() -> u32 {
    1
}

#[derive(Serialize)]
struct ListRow {
    #[serde(flatten)]
    record: NewsRecord,
    /// Relative age of the ingestion timestamp, as shown in the table.
    time_ago: Option<String>,
}

#[derive(Serialize)]
struct ListResponse {
    rows: Vec<ListRow>,
    total: Option<u64>,
    page: u32,
    last_page: u32,
    has_prev: bool,
    has_next: bool,
}

async fn list_news(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResponse>, ApiError> {
    if !state.sessions.is_signed_in() {
        return Err(ApiError::Unauthorized);
    }

    let page_size = params
        .page_size
        .unwrap_or(TABLE_PAGE_SIZE)
        .clamp(1, TABLE_PAGE_SIZE);
    let mut pager = OffsetPager::with_page_size(state.store.clone(), page_size);
    pager.set_query(&params.q);
    pager.set_tickers(&params.tickers);
    if let (Some(sort), Some(dir)) = (params.sort, params.dir) {
        pager.set_sort(sort, dir);
    } else if let Some(sort) = params.sort {
        pager.set_sort(sort, SortDir::Desc);
    }
    pager
        .go_to(params.page)
        .await
        .map_err(|e| ApiError::Upstream(e.to_string()))?;

    let now = Utc::now();
    let rows = pager
        .rows()
        .iter()
        .map(|r| ListRow {
            time_ago: relative_age(r, now),
            record: r.clone(),
        })
        .collect();
    Ok(Json(ListResponse {
        rows,
        total: pager.total(),
        page: pager.page(),
        last_page: pager.last_page(),
        has_prev: pager.can_prev(),
        has_next: pager.can_next(),
    }))
}

fn relative_age(record: &NewsRecord, now: DateTime<Utc>) -> Option<String> {
    record
        .created_at
        .as_deref()
        .and_then(parse_timestamp_utc)
        .map(|ts| time_ago(ts, now))
}

async fn news_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<NewsRecord>, ApiError> {
    if !state.sessions.is_signed_in() {
        return Err(ApiError::Unauthorized);
    }
    let record = state
        .store
        .fetch_by_id(&id)
        .await
        .map_err(|e| ApiError::Upstream(e.to_string()))?;
    record.map(Json).ok_or(ApiError::NotFound)
}

#[derive(Deserialize)]
struct LoginReq {
    email: String,
    password: String,
}

#[derive(Serialize)]
struct LoginResp {
    user_email: Option<String>,
    expires_at: Option<DateTime<Utc>>,
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginReq>,
) -> Result<Json<LoginResp>, ApiError> {
    match state.auth.sign_in(&req.email, &req.password).await {
        Ok(session) => {
            let resp = LoginResp {
                user_email: session.user_email.clone(),
                expires_at: session.expires_at,
            };
            state.sessions.set(Some(session));
            Ok(Json(resp))
        }
        Err(AuthError::InvalidCredentials) => Err(ApiError::Unauthorized),
        Err(e) => Err(ApiError::Upstream(e.to_string())),
    }
}

async fn logout(State(state): State<AppState>) -> StatusCode {
    state.sessions.set(None);
    StatusCode::NO_CONTENT
}
