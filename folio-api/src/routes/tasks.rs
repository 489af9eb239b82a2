/// Task endpoints, nested under a project
///
/// The parent project always comes from the path; a `project` field in the
/// body is ignored.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use folio_shared::{
    auth::middleware::AuthContext,
    services::tasks::{NewTask, TaskChanges, TaskView},
};
use uuid::Uuid;

use crate::{app::AppState, error::ApiResult};

pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_pk): Path<Uuid>,
) -> ApiResult<Json<Vec<TaskView>>> {
    let tasks = state.services.tasks.list(auth.user_id, project_pk).await?;
    Ok(Json(tasks))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_pk): Path<Uuid>,
    Json(input): Json<NewTask>,
) -> ApiResult<(StatusCode, Json<TaskView>)> {
    let task = state
        .services
        .tasks
        .create(auth.user_id, project_pk, input)
        .await?;

    tracing::info!(task_id = %task.task.id, project_id = %project_pk, "Task created");

    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn retrieve(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((project_pk, task_pk)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<TaskView>> {
    let task = state
        .services
        .tasks
        .retrieve(auth.user_id, project_pk, task_pk)
        .await?;
    Ok(Json(task))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((project_pk, task_pk)): Path<(Uuid, Uuid)>,
    Json(changes): Json<TaskChanges>,
) -> ApiResult<Json<TaskView>> {
    let task = state
        .services
        .tasks
        .update(auth.user_id, project_pk, task_pk, changes)
        .await?;
    Ok(Json(task))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((project_pk, task_pk)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    state
        .services
        .tasks
        .delete(auth.user_id, project_pk, task_pk)
        .await?;

    tracing::info!(task_id = %task_pk, "Task deleted");

    Ok(StatusCode::NO_CONTENT)
}
