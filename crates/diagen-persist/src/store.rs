use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Document, DocumentUpdate, NewDocument, NewVersion, Version};

/// Append-only version chain per document with a movable current pointer.
///
/// Implementations must keep `Document::current_version_id` resolving to a
/// version of the same document at every observable point.
#[async_trait]
pub trait VersionStore: Send + Sync {
    /// Write version 1.0 of an existing document and point the document at it.
    async fn create_initial(&self, document_id: &str, content: String) -> Result<Version>;

    /// Derive a new version from the current one and swap the pointer.
    async fn create_version(&self, document_id: &str, new: NewVersion) -> Result<Version>;

    async fn get_current_version(&self, document_id: &str) -> Result<Version>;

    /// All versions, newest first.
    async fn get_versions(&self, document_id: &str) -> Result<Vec<Version>>;

    async fn get_version(&self, document_id: &str, version_id: &str) -> Result<Version>;

    /// Move the current pointer back to an existing version without
    /// creating a new one.
    async fn restore_version(&self, document_id: &str, version_id: &str) -> Result<Document>;
}

/// Document CRUD. Deleting a document removes its versions too.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Creates the document together with its initial version.
    async fn create_document(&self, new: NewDocument) -> Result<Document>;

    async fn get_document(&self, document_id: &str) -> Result<Document>;

    async fn list_documents(&self, owner_id: &str) -> Result<Vec<Document>>;

    async fn update_document(&self, document_id: &str, update: DocumentUpdate) -> Result<Document>;

    async fn delete_document(&self, document_id: &str) -> Result<()>;

    async fn record_view(&self, document_id: &str) -> Result<Document>;
}
