use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::{ApiError, ApiResult},
    models::{CreateDocumentRequest, DocumentResponse, ListDocumentsQuery, UpdateDocumentRequest},
    state::AppState,
};

/// Create a document together with its version 1.0
#[utoipa::path(
    post,
    path = "/documents",
    request_body = CreateDocumentRequest,
    responses(
        (status = 201, description = "Document created", body = DocumentResponse),
        (status = 400, description = "Invalid request")
    ),
    tag = "documents"
)]
pub async fn create_document(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateDocumentRequest>,
) -> ApiResult<(StatusCode, Json<DocumentResponse>)> {
    if req.name.trim().is_empty() {
        return Err(ApiError::BadRequest("name must not be empty".to_string()));
    }
    let document = state.documents.create_document(req.into()).await?;
    tracing::info!(document_id = %document.id, "Document created");
    Ok((StatusCode::CREATED, Json(document.into())))
}

/// List documents of one owner, most recently updated first
#[utoipa::path(
    get,
    path = "/documents",
    params(ListDocumentsQuery),
    responses(
        (status = 200, description = "Documents", body = [DocumentResponse])
    ),
    tag = "documents"
)]
pub async fn list_documents(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListDocumentsQuery>,
) -> ApiResult<Json<Vec<DocumentResponse>>> {
    let documents = state.documents.list_documents(&query.owner).await?;
    Ok(Json(documents.into_iter().map(Into::into).collect()))
}

/// Get a document. Counts as a view.
#[utoipa::path(
    get,
    path = "/documents/{document_id}",
    params(("document_id" = String, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Document", body = DocumentResponse),
        (status = 404, description = "Document not found")
    ),
    tag = "documents"
)]
pub async fn get_document(
    State(state): State<Arc<AppState>>,
    Path(document_id): Path<String>,
) -> ApiResult<Json<DocumentResponse>> {
    let document = state.documents.record_view(&document_id).await?;
    Ok(Json(document.into()))
}

/// Edit name, status or tags
#[utoipa::path(
    patch,
    path = "/documents/{document_id}",
    params(("document_id" = String, Path, description = "Document ID")),
    request_body = UpdateDocumentRequest,
    responses(
        (status = 200, description = "Updated document", body = DocumentResponse),
        (status = 404, description = "Document not found")
    ),
    tag = "documents"
)]
pub async fn update_document(
    State(state): State<Arc<AppState>>,
    Path(document_id): Path<String>,
    Json(req): Json<UpdateDocumentRequest>,
) -> ApiResult<Json<DocumentResponse>> {
    if req.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(ApiError::BadRequest("name must not be empty".to_string()));
    }
    let document = state
        .documents
        .update_document(&document_id, req.into())
        .await?;
    Ok(Json(document.into()))
}

/// Delete a document and all of its versions
#[utoipa::path(
    delete,
    path = "/documents/{document_id}",
    params(("document_id" = String, Path, description = "Document ID")),
    responses(
        (status = 204, description = "Document deleted"),
        (status = 404, description = "Document not found")
    ),
    tag = "documents"
)]
pub async fn delete_document(
    State(state): State<Arc<AppState>>,
    Path(document_id): Path<String>,
) -> ApiResult<StatusCode> {
    state.documents.delete_document(&document_id).await?;
    state.autosave.forget(&document_id).await;
    tracing::info!(document_id = %document_id, "Document deleted");
    Ok(StatusCode::NO_CONTENT)
}
