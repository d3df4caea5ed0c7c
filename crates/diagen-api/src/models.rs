//! Request and response bodies of the HTTP API. Field names are camelCase
//! on the wire.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use diagen_persist::{
    AutosaveStatus, ChangeType, Document, DocumentStatus, DocumentUpdate, NewDocument, Version,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub services: HashMap<String, String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatStreamRequest {
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub document_id: Option<String>,
    /// Markup of the diagram currently open in the editor
    #[serde(default)]
    pub artifact_context: Option<String>,
    pub user_id: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateDocumentRequest {
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "draft")]
    pub status: Option<DocumentStatus>,
}

impl From<CreateDocumentRequest> for NewDocument {
    fn from(req: CreateDocumentRequest) -> Self {
        let mut new = NewDocument::new(req.name, req.user_id)
            .with_content(req.content)
            .with_tags(req.tags);
        new.status = req.status;
        new
    }
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDocumentRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "active")]
    pub status: Option<DocumentStatus>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl From<UpdateDocumentRequest> for DocumentUpdate {
    fn from(req: UpdateDocumentRequest) -> Self {
        Self {
            name: req.name,
            status: req.status,
            tags: req.tags,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListDocumentsQuery {
    /// Owner whose documents are listed
    pub owner: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CountersResponse {
    pub views: u64,
    pub edits: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentResponse {
    pub id: String,
    pub name: String,
    #[schema(example = "draft")]
    pub status: String,
    pub current_version_id: String,
    pub tags: Vec<String>,
    pub counters: CountersResponse,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Document> for DocumentResponse {
    fn from(doc: Document) -> Self {
        Self {
            id: doc.id,
            name: doc.name,
            status: status_name(doc.status).to_string(),
            current_version_id: doc.current_version_id,
            tags: doc.tags,
            counters: CountersResponse {
                views: doc.counters.views,
                edits: doc.counters.edits,
            },
            owner_id: doc.owner_id,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        }
    }
}

fn status_name(status: DocumentStatus) -> &'static str {
    match status {
        DocumentStatus::Draft => "draft",
        DocumentStatus::Active => "active",
        DocumentStatus::Archived => "archived",
    }
}

fn change_name(change: ChangeType) -> &'static str {
    match change {
        ChangeType::Major => "major",
        ChangeType::Minor => "minor",
        ChangeType::Patch => "patch",
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VersionResponse {
    pub id: String,
    pub document_id: String,
    #[schema(example = "2.3")]
    pub version_number: String,
    pub parent_version_id: Option<String>,
    pub content: String,
    #[schema(example = "minor")]
    pub change_type: String,
    pub change_summary: String,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

impl From<Version> for VersionResponse {
    fn from(v: Version) -> Self {
        Self {
            id: v.id,
            document_id: v.document_id,
            version_number: v.version_number.to_string(),
            parent_version_id: v.parent_version_id,
            content: v.content,
            change_type: change_name(v.change_type).to_string(),
            change_summary: v.change_summary,
            created_at: v.created_at,
            created_by: v.created_by,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateVersionRequest {
    pub user_id: String,
    pub content: String,
    #[schema(value_type = String, example = "minor")]
    pub change_type: ChangeType,
    #[serde(default)]
    pub change_summary: String,
    /// Rejects the save with 409 if the document moved past this version
    #[serde(default)]
    pub base_version_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DraftRequest {
    pub user_id: String,
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AutosaveStatusResponse {
    pub dirty: bool,
    pub saving: bool,
    pub last_saved_at: Option<DateTime<Utc>>,
    pub last_saved_version: Option<String>,
    pub last_error: Option<String>,
}

impl From<AutosaveStatus> for AutosaveStatusResponse {
    fn from(status: AutosaveStatus) -> Self {
        Self {
            dirty: status.dirty,
            saving: status.saving,
            last_saved_at: status.last_saved_at,
            last_saved_version: status.last_saved_version,
            last_error: status.last_error,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FlushResponse {
    /// Version written by this flush, if any
    pub version: Option<VersionResponse>,
    pub status: AutosaveStatusResponse,
}
