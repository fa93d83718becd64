//! 버전 히스토리 핸들러

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use super::extract::{AppJson, AppPath, AppQuery};
use super::SearchParams;
use crate::auth::AuthUser;
use crate::db::DEFAULT_SEARCH_LIMIT;
use crate::error::ApiResult;
use crate::events::{ChangeEvent, ChangeKind};
use crate::models::{NewVersion, TranslationPatch};
use crate::state::AppState;

/// 검색 결과 상한
const MAX_SEARCH_LIMIT: u32 = 200;

/// POST /api/documents/{document_id}/versions
///
/// 번호 부여와 현재 버전 갱신은 한 트랜잭션에서 처리된다.
pub async fn create_version(
    user: AuthUser,
    State(state): State<AppState>,
    AppPath(document_id): AppPath<String>,
    AppJson(input): AppJson<NewVersion>,
) -> ApiResult<impl IntoResponse> {
    let (version, project_id) = {
        let db = state.db.lock()?;
        let version = db.create_version(&user.user_id, &document_id, &input)?;
        let project_id = db.get_document(&user.user_id, &document_id)?.document.project_id;
        (version, project_id)
    };

    tracing::info!(
        owner_id = %user.user_id,
        project_id = %project_id,
        document_id = %document_id,
        version_number = version.version_number,
        "Version created",
    );
    state.events.publish(
        ChangeEvent::new(ChangeKind::VersionCreated, &user.user_id, &project_id, &version.id)
            .with_document(&document_id),
    );

    Ok((StatusCode::CREATED, Json(version)))
}

/// GET /api/documents/{document_id}/versions
pub async fn list_versions(
    user: AuthUser,
    State(state): State<AppState>,
    AppPath(document_id): AppPath<String>,
) -> ApiResult<impl IntoResponse> {
    let versions = state.db.lock()?.list_versions(&user.user_id, &document_id)?;
    Ok(Json(versions))
}

/// GET /api/versions/search?q=&documentId=&limit=
pub async fn search_versions(
    user: AuthUser,
    State(state): State<AppState>,
    AppQuery(params): AppQuery<SearchParams>,
) -> ApiResult<impl IntoResponse> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
        .clamp(1, MAX_SEARCH_LIMIT);
    let hits = state.db.lock()?.search_versions(
        &user.user_id,
        params.query(),
        params.document_id.as_deref(),
        limit,
    )?;
    Ok(Json(hits))
}

/// GET /api/versions/{id}
pub async fn get_version(
    user: AuthUser,
    State(state): State<AppState>,
    AppPath(version_id): AppPath<String>,
) -> ApiResult<impl IntoResponse> {
    let version = state.db.lock()?.get_version(&user.user_id, &version_id)?;
    Ok(Json(version))
}

/// PATCH /api/versions/{id}/translation
///
/// translatedContent, aiModel 외 필드는 바뀌지 않는다.
pub async fn update_translation(
    user: AuthUser,
    State(state): State<AppState>,
    AppPath(version_id): AppPath<String>,
    AppJson(patch): AppJson<TranslationPatch>,
) -> ApiResult<impl IntoResponse> {
    let (version, project_id) = {
        let db = state.db.lock()?;
        let version = db.update_translation(&user.user_id, &version_id, &patch)?;
        let project_id = db.get_document(&user.user_id, &version.document_id)?.document.project_id;
        (version, project_id)
    };

    tracing::info!(
        owner_id = %user.user_id,
        document_id = %version.document_id,
        version_number = version.version_number,
        ai_model = version.ai_model.as_deref().unwrap_or("-"),
        "Translation updated",
    );
    state.events.publish(
        ChangeEvent::new(ChangeKind::TranslationUpdated, &user.user_id, &project_id, &version.id)
            .with_document(&version.document_id),
    );

    Ok(Json(version))
}
