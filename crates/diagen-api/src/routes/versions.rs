use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use diagen_artifact::{validate, ArtifactSpec};
use diagen_persist::NewVersion;

use crate::{
    error::{ApiError, ApiResult},
    models::{CreateVersionRequest, DocumentResponse, VersionResponse},
    state::AppState,
};

/// Version history, newest first
#[utoipa::path(
    get,
    path = "/documents/{document_id}/versions",
    params(("document_id" = String, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Versions", body = [VersionResponse]),
        (status = 404, description = "Document not found")
    ),
    tag = "versions"
)]
pub async fn list_versions(
    State(state): State<Arc<AppState>>,
    Path(document_id): Path<String>,
) -> ApiResult<Json<Vec<VersionResponse>>> {
    let versions = state.versions.get_versions(&document_id).await?;
    Ok(Json(versions.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/documents/{document_id}/versions/current",
    params(("document_id" = String, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Current version", body = VersionResponse),
        (status = 404, description = "Document not found")
    ),
    tag = "versions"
)]
pub async fn current_version(
    State(state): State<Arc<AppState>>,
    Path(document_id): Path<String>,
) -> ApiResult<Json<VersionResponse>> {
    let version = state.versions.get_current_version(&document_id).await?;
    Ok(Json(version.into()))
}

/// Save a version explicitly. The markup must be a valid diagram.
#[utoipa::path(
    post,
    path = "/documents/{document_id}/versions",
    params(("document_id" = String, Path, description = "Document ID")),
    request_body = CreateVersionRequest,
    responses(
        (status = 201, description = "Version created", body = VersionResponse),
        (status = 400, description = "Invalid diagram markup"),
        (status = 404, description = "Document not found"),
        (status = 409, description = "Base version is stale")
    ),
    tag = "versions"
)]
pub async fn create_version(
    State(state): State<Arc<AppState>>,
    Path(document_id): Path<String>,
    Json(req): Json<CreateVersionRequest>,
) -> ApiResult<(StatusCode, Json<VersionResponse>)> {
    validate(&ArtifactSpec::drawio(), req.content.trim())
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let mut new = NewVersion::new(req.content.trim(), req.change_type)
        .summary(req.change_summary)
        .created_by(req.user_id);
    if let Some(base) = req.base_version_id {
        new = new.based_on(base);
    }

    let version = state.versions.create_version(&document_id, new).await?;
    tracing::info!(
        document_id = %document_id,
        version = %version.version_number,
        "Version saved"
    );
    Ok((StatusCode::CREATED, Json(version.into())))
}

/// Point the document back at an earlier version
#[utoipa::path(
    post,
    path = "/documents/{document_id}/versions/{version_id}/restore",
    params(
        ("document_id" = String, Path, description = "Document ID"),
        ("version_id" = String, Path, description = "Version to restore")
    ),
    responses(
        (status = 200, description = "Document now pointing at the version", body = DocumentResponse),
        (status = 404, description = "Document or version not found")
    ),
    tag = "versions"
)]
pub async fn restore_version(
    State(state): State<Arc<AppState>>,
    Path((document_id, version_id)): Path<(String, String)>,
) -> ApiResult<Json<DocumentResponse>> {
    let document = state
        .versions
        .restore_version(&document_id, &version_id)
        .await?;
    tracing::info!(document_id = %document_id, version_id = %version_id, "Version restored");
    Ok(Json(document.into()))
}
