use utoipa::OpenApi;

use crate::handlers::stream;
use crate::models::*;
use crate::routes::{autosave, documents, health, versions};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        stream::chat_stream,
        documents::create_document,
        documents::list_documents,
        documents::get_document,
        documents::update_document,
        documents::delete_document,
        versions::list_versions,
        versions::current_version,
        versions::create_version,
        versions::restore_version,
        autosave::put_draft,
        autosave::autosave_status,
        autosave::flush_autosave,
    ),
    components(schemas(
        HealthResponse,
        ChatStreamRequest,
        CreateDocumentRequest,
        UpdateDocumentRequest,
        CountersResponse,
        DocumentResponse,
        VersionResponse,
        CreateVersionRequest,
        DraftRequest,
        AutosaveStatusResponse,
        FlushResponse,
    )),
    tags(
        (name = "health", description = "Service health"),
        (name = "chat", description = "Streaming diagram generation"),
        (name = "documents", description = "Diagram documents"),
        (name = "versions", description = "Version history"),
        (name = "autosave", description = "Debounced saving of editor changes")
    ),
    info(
        title = "Diagen API",
        version = "0.1.0",
        description = "Chat-driven draw.io diagram generation with versioned documents"
    )
)]
pub struct ApiDoc;
