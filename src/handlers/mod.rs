//! HTTP 핸들러 및 라우터

pub mod chat;
pub mod dictionary;
pub mod documents;
pub mod events;
pub mod extract;
pub mod health;
pub mod projects;
pub mod versions;

use std::time::Duration;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue, Method, StatusCode};
use axum::routing::{get, patch, post, put};
use axum::Router;
use serde::Deserialize;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::ServerConfig;
use crate::error::TransdocError;
use crate::state::AppState;

/// 검색 엔드포인트 공용 쿼리 파라미터
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub q: Option<String>,
    pub project_id: Option<String>,
    pub document_id: Option<String>,
    pub limit: Option<u32>,
}

impl SearchParams {
    pub fn query(&self) -> &str {
        self.q.as_deref().unwrap_or("")
    }
}

/// `/api` 라우트
///
/// ```text
/// /projects                                          list, create
/// /projects/search?q=                                name search
/// /projects/{id}                                     get, update, delete
/// /projects/{id}/documents                           list, create
/// /projects/{id}/dictionary                          get
/// /projects/{id}/dictionary/entries                  add
/// /projects/{id}/dictionary/entries/{entry_id}       update, remove
/// /projects/{id}/dictionary/positions/{index}        update, remove (positional)
///
/// /documents/search?q=&projectId=                    title search
/// /documents/{id}                                    get, update, delete
/// /documents/{id}/versions                           list, create
///
/// /versions/search?q=&documentId=&limit=             content search
/// /versions/{id}                                     get
/// /versions/{id}/translation                         update translation
///
/// /models                                            model catalog
/// /chat                                              streamed AI chat
/// /events                                            change feed (SSE)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/projects", get(projects::list_projects).post(projects::create_project))
        .route("/projects/search", get(projects::search_projects))
        .route(
            "/projects/{id}",
            get(projects::get_project)
                .patch(projects::update_project)
                .delete(projects::delete_project),
        )
        .route(
            "/projects/{id}/documents",
            get(documents::list_documents).post(documents::create_document),
        )
        .route("/projects/{id}/dictionary", get(dictionary::get_dictionary))
        .route("/projects/{id}/dictionary/entries", post(dictionary::add_entry))
        .route(
            "/projects/{id}/dictionary/entries/{entry_id}",
            put(dictionary::update_entry).delete(dictionary::remove_entry),
        )
        .route(
            "/projects/{id}/dictionary/positions/{index}",
            put(dictionary::update_entry_at).delete(dictionary::remove_entry_at),
        )
        .route("/documents/search", get(documents::search_documents))
        .route(
            "/documents/{id}",
            get(documents::get_document)
                .patch(documents::update_document)
                .delete(documents::delete_document),
        )
        .route(
            "/documents/{id}/versions",
            get(versions::list_versions).post(versions::create_version),
        )
        .route("/versions/search", get(versions::search_versions))
        .route("/versions/{id}", get(versions::get_version))
        .route("/versions/{id}/translation", patch(versions::update_translation))
        .route("/models", get(chat::list_models))
        .route("/chat", post(chat::chat))
        .route("/events", get(events::change_feed))
}

/// 미들웨어를 포함한 전체 라우터
///
/// 적용 순서 (바깥쪽부터): CORS → request id 부여 → 요청 추적 → request id 응답 전파
/// → 타임아웃 → panic 복구
pub fn build_router(state: AppState) -> Result<Router, TransdocError> {
    let cors = build_cors_layer(&state.config)?;
    let request_id_header = HeaderName::from_static("x-request-id");
    let timeout = Duration::from_secs(state.config.request_timeout_secs);

    Ok(Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api_routes())
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(state))
}

/// 잘못된 origin은 시작 시점에 설정 에러로 처리한다
pub fn build_cors_layer(config: &ServerConfig) -> Result<CorsLayer, TransdocError> {
    let origins = config
        .cors_origins
        .iter()
        .map(|o| {
            o.parse::<HeaderValue>()
                .map_err(|e| TransdocError::Config(format!("Invalid CORS origin '{o}': {e}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600)))
}
