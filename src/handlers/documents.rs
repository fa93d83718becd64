//! 문서 핸들러

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use super::extract::{AppJson, AppPath, AppQuery};
use super::SearchParams;
use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::events::{ChangeEvent, ChangeKind};
use crate::models::{DocumentPatch, NewDocument};
use crate::state::AppState;

/// POST /api/projects/{project_id}/documents
///
/// 내용이 있으면 버전 1이 함께 만들어진다.
pub async fn create_document(
    user: AuthUser,
    State(state): State<AppState>,
    AppPath(project_id): AppPath<String>,
    AppJson(input): AppJson<NewDocument>,
) -> ApiResult<impl IntoResponse> {
    let document = state
        .db
        .lock()?
        .create_document(&user.user_id, &project_id, &input)?;

    tracing::info!(
        owner_id = %user.user_id,
        project_id = %project_id,
        document_id = %document.id,
        with_initial_version = document.current_version_id.is_some(),
        "Document created",
    );
    state.events.publish(
        ChangeEvent::new(ChangeKind::DocumentCreated, &user.user_id, &project_id, &document.id)
            .with_document(&document.id),
    );

    Ok((StatusCode::CREATED, Json(document)))
}

/// GET /api/projects/{project_id}/documents
pub async fn list_documents(
    user: AuthUser,
    State(state): State<AppState>,
    AppPath(project_id): AppPath<String>,
) -> ApiResult<impl IntoResponse> {
    let documents = state.db.lock()?.list_documents(&user.user_id, &project_id)?;
    Ok(Json(documents))
}

/// GET /api/documents/search?q=&projectId=
pub async fn search_documents(
    user: AuthUser,
    State(state): State<AppState>,
    AppQuery(params): AppQuery<SearchParams>,
) -> ApiResult<impl IntoResponse> {
    let documents = state.db.lock()?.search_documents(
        &user.user_id,
        params.query(),
        params.project_id.as_deref(),
    )?;
    Ok(Json(documents))
}

/// GET /api/documents/{id}
pub async fn get_document(
    user: AuthUser,
    State(state): State<AppState>,
    AppPath(document_id): AppPath<String>,
) -> ApiResult<impl IntoResponse> {
    let document = state.db.lock()?.get_document(&user.user_id, &document_id)?;
    Ok(Json(document))
}

/// PATCH /api/documents/{id}
pub async fn update_document(
    user: AuthUser,
    State(state): State<AppState>,
    AppPath(document_id): AppPath<String>,
    AppJson(patch): AppJson<DocumentPatch>,
) -> ApiResult<impl IntoResponse> {
    let document = state
        .db
        .lock()?
        .update_document(&user.user_id, &document_id, &patch)?;

    tracing::info!(owner_id = %user.user_id, document_id = %document.id, "Document updated");
    state.events.publish(
        ChangeEvent::new(ChangeKind::DocumentUpdated, &user.user_id, &document.project_id, &document.id)
            .with_document(&document.id),
    );

    Ok(Json(document))
}

/// DELETE /api/documents/{id}
pub async fn delete_document(
    user: AuthUser,
    State(state): State<AppState>,
    AppPath(document_id): AppPath<String>,
) -> ApiResult<impl IntoResponse> {
    let document = state.db.lock()?.delete_document(&user.user_id, &document_id)?;

    tracing::info!(
        owner_id = %user.user_id,
        project_id = %document.project_id,
        document_id = %document.id,
        "Document deleted",
    );
    state.events.publish(
        ChangeEvent::new(ChangeKind::DocumentDeleted, &user.user_id, &document.project_id, &document.id)
            .with_document(&document.id),
    );

    Ok(StatusCode::NO_CONTENT)
}
