/// Document endpoints, nested under a task
///
/// Uploads and replacements are `multipart/form-data` with a `file` part and
/// an optional `file_name` text part overriding the display name.
///
/// ```text
/// POST /api/projects/:project_pk/tasks/:task_pk/documents
/// Content-Type: multipart/form-data; boundary=...
///
/// file=<bytes>; filename="report.pdf"
/// file_name=Quarterly report
/// ```

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use folio_shared::{
    auth::middleware::AuthContext,
    documents::{Upload, MAX_FILE_NAME_CHARS},
    services::documents::DocumentView,
};
use uuid::Uuid;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};

/// Parts of an upload form
#[derive(Debug, Default)]
struct UploadForm {
    upload: Option<Upload>,
    display_name: Option<String>,
}

async fn read_form(mut multipart: Multipart) -> ApiResult<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        let name = field.name().map(str::to_owned);

        match name.as_deref() {
            Some("file") => {
                let original = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.body_text()))?;

                if bytes.is_empty() {
                    return Err(ApiError::invalid("file", "The submitted file is empty."));
                }
                form.upload = Some(Upload::new(original, bytes));
            }
            Some("file_name") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.body_text()))?;
                let text = text.trim();

                if text.chars().count() > MAX_FILE_NAME_CHARS {
                    return Err(ApiError::invalid(
                        "file_name",
                        "Ensure this field has no more than 255 characters.",
                    ));
                }
                if !text.is_empty() {
                    form.display_name = Some(text.to_string());
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

/// `Content-Disposition` value for a download
fn attachment(file_name: &str) -> String {
    let safe: String = file_name
        .chars()
        .map(|c| if c == '"' || c == '\\' || c.is_control() { '_' } else { c })
        .collect();
    format!("attachment; filename=\"{}\"", safe)
}

pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((project_pk, task_pk)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<Vec<DocumentView>>> {
    let documents = state
        .services
        .documents
        .list(auth.user_id, project_pk, task_pk)
        .await?;
    Ok(Json(documents))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((project_pk, task_pk)): Path<(Uuid, Uuid)>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<DocumentView>)> {
    let form = read_form(multipart).await?;
    let upload = form
        .upload
        .ok_or_else(|| ApiError::invalid("file", "No file was submitted."))?;

    let document = state
        .services
        .documents
        .create(auth.user_id, project_pk, task_pk, upload, form.display_name)
        .await?;

    tracing::info!(
        document_id = %document.document.id,
        task_id = %task_pk,
        storage_path = %document.document.storage_path,
        "Document uploaded"
    );

    Ok((StatusCode::CREATED, Json(document)))
}

pub async fn retrieve(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((project_pk, task_pk, document_pk)): Path<(Uuid, Uuid, Uuid)>,
) -> ApiResult<Json<DocumentView>> {
    let document = state
        .services
        .documents
        .retrieve(auth.user_id, project_pk, task_pk, document_pk)
        .await?;
    Ok(Json(document))
}

/// Renames a document and/or replaces its file
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((project_pk, task_pk, document_pk)): Path<(Uuid, Uuid, Uuid)>,
    multipart: Multipart,
) -> ApiResult<Json<DocumentView>> {
    let form = read_form(multipart).await?;

    let document = state
        .services
        .documents
        .update(
            auth.user_id,
            project_pk,
            task_pk,
            document_pk,
            form.upload,
            form.display_name,
        )
        .await?;
    Ok(Json(document))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((project_pk, task_pk, document_pk)): Path<(Uuid, Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    state
        .services
        .documents
        .delete(auth.user_id, project_pk, task_pk, document_pk)
        .await?;

    tracing::info!(document_id = %document_pk, "Document deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Streams the stored bytes as an attachment
pub async fn download(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((project_pk, task_pk, document_pk)): Path<(Uuid, Uuid, Uuid)>,
) -> ApiResult<impl IntoResponse> {
    let content = state
        .services
        .documents
        .download(auth.user_id, project_pk, task_pk, document_pk)
        .await?;

    let headers = [
        (header::CONTENT_TYPE, "application/octet-stream".to_string()),
        (header::CONTENT_DISPOSITION, attachment(&content.document.file_name)),
    ];

    Ok((headers, content.bytes))
}
