/// Project endpoints
///
/// - `GET    /api/projects` - Requester's projects, newest first
/// - `POST   /api/projects` - Create a project owned by the requester
/// - `GET    /api/projects/:project_pk`
/// - `PUT    /api/projects/:project_pk` - Partial update (PATCH behaves the same)
/// - `DELETE /api/projects/:project_pk` - Deletes tasks, documents and stored files

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use folio_shared::{
    auth::middleware::AuthContext,
    services::projects::{NewProject, ProjectChanges, ProjectView},
};
use uuid::Uuid;

use crate::{app::AppState, error::ApiResult};

pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<ProjectView>>> {
    let projects = state.services.projects.list(auth.user_id).await?;
    Ok(Json(projects))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(input): Json<NewProject>,
) -> ApiResult<(StatusCode, Json<ProjectView>)> {
    let project = state.services.projects.create(auth.user_id, input).await?;

    tracing::info!(project_id = %project.project.id, owner_id = %auth.user_id, "Project created");

    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn retrieve(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_pk): Path<Uuid>,
) -> ApiResult<Json<ProjectView>> {
    let project = state.services.projects.retrieve(auth.user_id, project_pk).await?;
    Ok(Json(project))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_pk): Path<Uuid>,
    Json(changes): Json<ProjectChanges>,
) -> ApiResult<Json<ProjectView>> {
    let project = state
        .services
        .projects
        .update(auth.user_id, project_pk, changes)
        .await?;
    Ok(Json(project))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_pk): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.services.projects.delete(auth.user_id, project_pk).await?;

    tracing::info!(project_id = %project_pk, "Project deleted");

    Ok(StatusCode::NO_CONTENT)
}
