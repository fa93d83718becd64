//! AI 채팅 / 모델 목록 핸들러

use std::convert::Infallible;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tokio_stream::StreamExt;

use crate::ai::catalog::{models_with_search, models_with_tools, AiModel, AI_MODELS, DEFAULT_MODEL};
use crate::ai::stream::{DATA_STREAM_HEADER, DATA_STREAM_VERSION};
use crate::ai::{self, ChatRequest, PreparedChat};
use super::extract::AppJson;
use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelCatalog {
    pub models: &'static [AiModel],
    pub default_model: &'static str,
    /// 도구 호출을 받는 모델 id
    pub tool_models: Vec<&'static str>,
    /// 자체 웹 검색 모델 id
    pub search_models: Vec<&'static str>,
}

/// GET /api/models
pub async fn list_models(_user: AuthUser) -> Json<ModelCatalog> {
    Json(ModelCatalog {
        models: AI_MODELS,
        default_model: DEFAULT_MODEL,
        tool_models: models_with_tools().map(|m| m.id).collect(),
        search_models: models_with_search().map(|m| m.id).collect(),
    })
}

/// POST /api/chat
///
/// 본문은 AI 데이터 스트림 형식의 text/plain 스트림이다.
pub async fn chat(
    user: AuthUser,
    State(state): State<AppState>,
    AppJson(request): AppJson<ChatRequest>,
) -> ApiResult<Response> {
    let prepared = PreparedChat::new(request)?;
    tracing::info!(owner_id = %user.user_id, model = prepared.model.id, "Chat requested");

    let parts = ai::start_chat(state.http.clone(), &state.config, prepared)?;
    let body = Body::from_stream(parts.map(Ok::<_, Infallible>));

    let mut response = body.into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
    headers.insert(DATA_STREAM_HEADER, HeaderValue::from_static(DATA_STREAM_VERSION));
    Ok(response)
}
