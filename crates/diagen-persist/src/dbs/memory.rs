use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::{PersistError, Result};
use crate::models::{Document, DocumentUpdate, NewDocument, NewVersion, Version};
use crate::store::{DocumentStore, VersionStore};

#[derive(Default)]
struct Tables {
    documents: HashMap<String, Document>,
    versions: HashMap<String, Version>,
    /// Version ids per document in creation order.
    lineage: HashMap<String, Vec<String>>,
}

impl Tables {
    fn document(&self, id: &str) -> Result<&Document> {
        self.documents
            .get(id)
            .ok_or_else(|| PersistError::DocumentNotFound(id.to_string()))
    }

    fn document_mut(&mut self, id: &str) -> Result<&mut Document> {
        self.documents
            .get_mut(id)
            .ok_or_else(|| PersistError::DocumentNotFound(id.to_string()))
    }

    fn version_of(&self, document_id: &str, version_id: &str) -> Result<&Version> {
        self.versions
            .get(version_id)
            .filter(|v| v.document_id == document_id)
            .ok_or_else(|| PersistError::VersionNotFound(version_id.to_string()))
    }

    fn current(&self, document_id: &str) -> Result<&Version> {
        let doc = self.document(document_id)?;
        self.version_of(document_id, &doc.current_version_id)
    }

    fn insert_version(&mut self, version: Version) {
        self.lineage
            .entry(version.document_id.clone())
            .or_default()
            .push(version.id.clone());
        self.versions.insert(version.id.clone(), version);
    }

    fn write_initial(&mut self, document_id: &str, content: String) -> Result<Version> {
        let owner = self.document(document_id)?.owner_id.clone();
        let version = Version::initial(document_id, content, &owner);
        self.insert_version(version.clone());
        let doc = self.document_mut(document_id)?;
        doc.current_version_id = version.id.clone();
        doc.updated_at = Utc::now();
        Ok(version)
    }
}

/// Process-local store. One lock covers documents and versions so every
/// pointer swap is atomic with the append that precedes it.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VersionStore for InMemoryStore {
    async fn create_initial(&self, document_id: &str, content: String) -> Result<Version> {
        let mut tables = self.tables.write().await;
        tables.write_initial(document_id, content)
    }

    async fn create_version(&self, document_id: &str, new: NewVersion) -> Result<Version> {
        let mut tables = self.tables.write().await;
        let current = tables.current(document_id)?;
        new.check_base(document_id, &current.id)?;
        let version = current.derive(new);

        tables.insert_version(version.clone());
        let doc = tables.document_mut(document_id)?;
        doc.current_version_id = version.id.clone();
        doc.counters.edits += 1;
        doc.updated_at = Utc::now();

        tracing::debug!(
            document_id = %document_id,
            version = %version.version_number,
            "Created version"
        );
        Ok(version)
    }

    async fn get_current_version(&self, document_id: &str) -> Result<Version> {
        let tables = self.tables.read().await;
        tables.current(document_id).cloned()
    }

    async fn get_versions(&self, document_id: &str) -> Result<Vec<Version>> {
        let tables = self.tables.read().await;
        tables.document(document_id)?;
        let ids = tables.lineage.get(document_id).map(Vec::as_slice).unwrap_or_default();
        Ok(ids
            .iter()
            .rev()
            .filter_map(|id| tables.versions.get(id).cloned())
            .collect())
    }

    async fn get_version(&self, document_id: &str, version_id: &str) -> Result<Version> {
        let tables = self.tables.read().await;
        tables.document(document_id)?;
        tables.version_of(document_id, version_id).cloned()
    }

    async fn restore_version(&self, document_id: &str, version_id: &str) -> Result<Document> {
        let mut tables = self.tables.write().await;
        tables.version_of(document_id, version_id)?;
        let doc = tables.document_mut(document_id)?;
        doc.current_version_id = version_id.to_string();
        doc.updated_at = Utc::now();
        Ok(doc.clone())
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn create_document(&self, new: NewDocument) -> Result<Document> {
        let mut document = Document::draft(&new);
        let id = document.id.clone();

        let mut tables = self.tables.write().await;
        let version = Version::initial(&id, new.content, &new.owner_id);
        document.current_version_id = version.id.clone();
        tables.insert_version(version);
        tables.documents.insert(id, document.clone());
        Ok(document)
    }

    async fn get_document(&self, document_id: &str) -> Result<Document> {
        let tables = self.tables.read().await;
        tables.document(document_id).cloned()
    }

    async fn list_documents(&self, owner_id: &str) -> Result<Vec<Document>> {
        let tables = self.tables.read().await;
        let mut docs: Vec<Document> = tables
            .documents
            .values()
            .filter(|d| d.owner_id == owner_id)
            .cloned()
            .collect();
        docs.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(docs)
    }

    async fn update_document(&self, document_id: &str, update: DocumentUpdate) -> Result<Document> {
        let mut tables = self.tables.write().await;
        let doc = tables.document_mut(document_id)?;
        doc.apply(update);
        Ok(doc.clone())
    }

    async fn delete_document(&self, document_id: &str) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables
            .documents
            .remove(document_id)
            .ok_or_else(|| PersistError::DocumentNotFound(document_id.to_string()))?;
        let ids = tables.lineage.remove(document_id).unwrap_or_default();
        for id in &ids {
            tables.versions.remove(id);
        }
        tracing::debug!(document_id = %document_id, versions = ids.len(), "Deleted document");
        Ok(())
    }

    async fn record_view(&self, document_id: &str) -> Result<Document> {
        let mut tables = self.tables.write().await;
        let doc = tables.document_mut(document_id)?;
        doc.counters.views += 1;
        Ok(doc.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChangeType, VersionNumber};

    #[tokio::test]
    async fn test_create_initial_replaces_pointer() {
        let store = InMemoryStore::new();
        let doc = store.create_document(NewDocument::new("d", "u1")).await.unwrap();
        let again = store.create_initial(&doc.id, "<x/>".into()).await.unwrap();

        assert_eq!(again.version_number, VersionNumber::INITIAL);
        assert!(again.parent_version_id.is_none());
        let current = store.get_current_version(&doc.id).await.unwrap();
        assert_eq!(current.id, again.id);
    }

    #[tokio::test]
    async fn test_create_initial_requires_document() {
        let store = InMemoryStore::new();
        let err = store.create_initial("missing", String::new()).await.unwrap_err();
        assert!(matches!(err, PersistError::DocumentNotFound(_)));
    }

    #[tokio::test]
    async fn test_version_from_other_document_is_not_found() {
        let store = InMemoryStore::new();
        let a = store.create_document(NewDocument::new("a", "u1")).await.unwrap();
        let b = store.create_document(NewDocument::new("b", "u1")).await.unwrap();

        let err = store.get_version(&a.id, &b.current_version_id).await.unwrap_err();
        assert!(matches!(err, PersistError::VersionNotFound(_)));
        let err = store.restore_version(&a.id, &b.current_version_id).await.unwrap_err();
        assert!(matches!(err, PersistError::VersionNotFound(_)));
    }

    #[tokio::test]
    async fn test_edit_counter_tracks_versions() {
        let store = InMemoryStore::new();
        let doc = store.create_document(NewDocument::new("d", "u1")).await.unwrap();
        for _ in 0..3 {
            store
                .create_version(&doc.id, NewVersion::new("<x/>", ChangeType::Patch))
                .await
                .unwrap();
        }
        let doc = store.get_document(&doc.id).await.unwrap();
        assert_eq!(doc.counters.edits, 3);
    }
}
