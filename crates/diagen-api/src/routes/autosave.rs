use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use diagen_persist::DirtySource;

use crate::{
    error::ApiResult,
    models::{AutosaveStatusResponse, DraftRequest, FlushResponse},
    state::AppState,
};

/// Record a manual edit. It is saved once the editor goes quiet.
#[utoipa::path(
    put,
    path = "/documents/{document_id}/draft",
    params(("document_id" = String, Path, description = "Document ID")),
    request_body = DraftRequest,
    responses(
        (status = 202, description = "Autosave scheduled", body = AutosaveStatusResponse),
        (status = 404, description = "Document not found")
    ),
    tag = "autosave"
)]
pub async fn put_draft(
    State(state): State<Arc<AppState>>,
    Path(document_id): Path<String>,
    Json(req): Json<DraftRequest>,
) -> ApiResult<(StatusCode, Json<AutosaveStatusResponse>)> {
    state.documents.get_document(&document_id).await?;
    state
        .autosave
        .mark_dirty(&document_id, DirtySource::ManualEdit, req.content, req.user_id)
        .await;
    let status = state.autosave.status(&document_id).await;
    Ok((StatusCode::ACCEPTED, Json(status.into())))
}

#[utoipa::path(
    get,
    path = "/documents/{document_id}/autosave",
    params(("document_id" = String, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Autosave state", body = AutosaveStatusResponse),
        (status = 404, description = "Document not found")
    ),
    tag = "autosave"
)]
pub async fn autosave_status(
    State(state): State<Arc<AppState>>,
    Path(document_id): Path<String>,
) -> ApiResult<Json<AutosaveStatusResponse>> {
    state.documents.get_document(&document_id).await?;
    Ok(Json(state.autosave.status(&document_id).await.into()))
}

/// Save pending changes now instead of waiting for the debounce
#[utoipa::path(
    post,
    path = "/documents/{document_id}/autosave/flush",
    params(("document_id" = String, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Flush result", body = FlushResponse),
        (status = 404, description = "Document not found")
    ),
    tag = "autosave"
)]
pub async fn flush_autosave(
    State(state): State<Arc<AppState>>,
    Path(document_id): Path<String>,
) -> ApiResult<Json<FlushResponse>> {
    state.documents.get_document(&document_id).await?;
    let version = state.autosave.flush(&document_id).await?;
    let status = state.autosave.status(&document_id).await;
    Ok(Json(FlushResponse {
        version: version.map(Into::into),
        status: status.into(),
    }))
}
