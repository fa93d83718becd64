//! 용어 사전 핸들러
//!
//! `/entries/{entry_id}` 가 기본 경로다. `/positions/{index}` 는 index 기반 클라이언트
//! 호환용으로 남겨둔 것으로, 조회와 호출 사이에 순서가 바뀌면 다른 항목을 가리킬 수 있다.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use super::extract::{AppJson, AppPath};
use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::events::{ChangeEvent, ChangeKind};
use crate::models::DictionaryEntryInput;
use crate::state::AppState;

fn changed(state: &AppState, owner_id: &str, project_id: &str, entry_id: &str) {
    state.events.publish(ChangeEvent::new(
        ChangeKind::DictionaryChanged,
        owner_id,
        project_id,
        entry_id,
    ));
}

/// GET /api/projects/{project_id}/dictionary
pub async fn get_dictionary(
    user: AuthUser,
    State(state): State<AppState>,
    AppPath(project_id): AppPath<String>,
) -> ApiResult<impl IntoResponse> {
    let dictionary = state.db.lock()?.get_dictionary(&user.user_id, &project_id)?;
    Ok(Json(dictionary))
}

/// POST /api/projects/{project_id}/dictionary/entries
pub async fn add_entry(
    user: AuthUser,
    State(state): State<AppState>,
    AppPath(project_id): AppPath<String>,
    AppJson(input): AppJson<DictionaryEntryInput>,
) -> ApiResult<impl IntoResponse> {
    let entry = state
        .db
        .lock()?
        .add_dictionary_entry(&user.user_id, &project_id, &input)?;

    tracing::info!(owner_id = %user.user_id, project_id = %project_id, entry_id = %entry.id, "Dictionary entry added");
    changed(&state, &user.user_id, &project_id, &entry.id);

    Ok((StatusCode::CREATED, Json(entry)))
}

/// PUT /api/projects/{project_id}/dictionary/entries/{entry_id}
pub async fn update_entry(
    user: AuthUser,
    State(state): State<AppState>,
    AppPath((project_id, entry_id)): AppPath<(String, String)>,
    AppJson(input): AppJson<DictionaryEntryInput>,
) -> ApiResult<impl IntoResponse> {
    let entry = state
        .db
        .lock()?
        .update_dictionary_entry(&user.user_id, &project_id, &entry_id, &input)?;

    tracing::info!(owner_id = %user.user_id, project_id = %project_id, entry_id = %entry.id, "Dictionary entry updated");
    changed(&state, &user.user_id, &project_id, &entry.id);

    Ok(Json(entry))
}

/// DELETE /api/projects/{project_id}/dictionary/entries/{entry_id}
pub async fn remove_entry(
    user: AuthUser,
    State(state): State<AppState>,
    AppPath((project_id, entry_id)): AppPath<(String, String)>,
) -> ApiResult<impl IntoResponse> {
    state
        .db
        .lock()?
        .remove_dictionary_entry(&user.user_id, &project_id, &entry_id)?;

    tracing::info!(owner_id = %user.user_id, project_id = %project_id, entry_id = %entry_id, "Dictionary entry removed");
    changed(&state, &user.user_id, &project_id, &entry_id);

    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/projects/{project_id}/dictionary/positions/{index}
pub async fn update_entry_at(
    user: AuthUser,
    State(state): State<AppState>,
    AppPath((project_id, index)): AppPath<(String, i64)>,
    AppJson(input): AppJson<DictionaryEntryInput>,
) -> ApiResult<impl IntoResponse> {
    let entry = state
        .db
        .lock()?
        .update_dictionary_entry_at(&user.user_id, &project_id, index, &input)?;

    tracing::info!(owner_id = %user.user_id, project_id = %project_id, index, entry_id = %entry.id, "Dictionary entry updated by position");
    changed(&state, &user.user_id, &project_id, &entry.id);

    Ok(Json(entry))
}

/// DELETE /api/projects/{project_id}/dictionary/positions/{index}
pub async fn remove_entry_at(
    user: AuthUser,
    State(state): State<AppState>,
    AppPath((project_id, index)): AppPath<(String, i64)>,
) -> ApiResult<impl IntoResponse> {
    let entry = state
        .db
        .lock()?
        .remove_dictionary_entry_at(&user.user_id, &project_id, index)?;

    tracing::info!(owner_id = %user.user_id, project_id = %project_id, index, entry_id = %entry.id, "Dictionary entry removed by position");
    changed(&state, &user.user_id, &project_id, &entry.id);

    Ok(StatusCode::NO_CONTENT)
}
