//! 프로젝트 핸들러

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use super::extract::{AppJson, AppPath, AppQuery};
use super::SearchParams;
use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::events::{ChangeEvent, ChangeKind};
use crate::models::{NewProject, ProjectPatch};
use crate::state::AppState;

/// POST /api/projects
pub async fn create_project(
    user: AuthUser,
    State(state): State<AppState>,
    AppJson(input): AppJson<NewProject>,
) -> ApiResult<impl IntoResponse> {
    let project = state.db.lock()?.create_project(&user.user_id, &input)?;

    tracing::info!(owner_id = %user.user_id, project_id = %project.id, "Project created");
    state.events.publish(ChangeEvent::new(
        ChangeKind::ProjectCreated,
        &user.user_id,
        &project.id,
        &project.id,
    ));

    Ok((StatusCode::CREATED, Json(project)))
}

/// GET /api/projects
pub async fn list_projects(user: AuthUser, State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let projects = state.db.lock()?.list_projects(&user.user_id)?;
    Ok(Json(projects))
}

/// GET /api/projects/search?q=
pub async fn search_projects(
    user: AuthUser,
    State(state): State<AppState>,
    AppQuery(params): AppQuery<SearchParams>,
) -> ApiResult<impl IntoResponse> {
    let projects = state
        .db
        .lock()?
        .search_projects(&user.user_id, params.query())?;
    Ok(Json(projects))
}

/// GET /api/projects/{id}
pub async fn get_project(
    user: AuthUser,
    State(state): State<AppState>,
    AppPath(project_id): AppPath<String>,
) -> ApiResult<impl IntoResponse> {
    let project = state.db.lock()?.get_project(&user.user_id, &project_id)?;
    Ok(Json(project))
}

/// PATCH /api/projects/{id}
pub async fn update_project(
    user: AuthUser,
    State(state): State<AppState>,
    AppPath(project_id): AppPath<String>,
    AppJson(patch): AppJson<ProjectPatch>,
) -> ApiResult<impl IntoResponse> {
    let project = state
        .db
        .lock()?
        .update_project(&user.user_id, &project_id, &patch)?;

    tracing::info!(owner_id = %user.user_id, project_id = %project.id, "Project updated");
    state.events.publish(ChangeEvent::new(
        ChangeKind::ProjectUpdated,
        &user.user_id,
        &project.id,
        &project.id,
    ));

    Ok(Json(project))
}

/// DELETE /api/projects/{id}
///
/// 문서, 버전, 사전까지 함께 지운다.
pub async fn delete_project(
    user: AuthUser,
    State(state): State<AppState>,
    AppPath(project_id): AppPath<String>,
) -> ApiResult<impl IntoResponse> {
    let project = state.db.lock()?.delete_project(&user.user_id, &project_id)?;

    tracing::info!(owner_id = %user.user_id, project_id = %project.id, "Project deleted");
    state.events.publish(ChangeEvent::new(
        ChangeKind::ProjectDeleted,
        &user.user_id,
        &project.id,
        &project.id,
    ));

    Ok(StatusCode::NO_CONTENT)
}
