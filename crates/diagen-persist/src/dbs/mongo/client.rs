use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::{doc, DateTime as BsonDateTime};
use mongodb::{Client, Collection};

use crate::dbs::mongo::models::{MongoDocument, MongoVersion};
use crate::error::{PersistError, Result};
use crate::models::{Document, DocumentUpdate, NewDocument, NewVersion, Version};
use crate::store::{DocumentStore, VersionStore};

const DOCUMENTS: &str = "documents";
const VERSIONS: &str = "versions";

/// Rebase attempts before an unanchored write gives up.
const MAX_SWAP_ATTEMPTS: u32 = 5;

#[derive(Debug, PartialEq, Eq)]
enum LostSwap {
    Retry,
    Conflict,
}

/// A write anchored to a base version reports the race. An unanchored
/// write (autosave, restore) rereads the pointer and tries again.
fn on_lost_swap(anchored: bool, attempt: u32) -> LostSwap {
    if anchored || attempt >= MAX_SWAP_ATTEMPTS {
        LostSwap::Conflict
    } else {
        LostSwap::Retry
    }
}

/// MongoDB backend. Pointer swaps are compare-and-set on
/// `current_version_id`. A racing writer that named a base version loses
/// with `Conflict`. One that did not is rebased onto the winner, so
/// autosave stays last-write-wins.
pub struct MongoStore {
    documents: Collection<MongoDocument>,
    versions: Collection<MongoVersion>,
}

impl MongoStore {
    pub async fn connect(mongodb_uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(mongodb_uri)
            .await
            .map_err(|e| PersistError::Connection(e.to_string()))?;
        let db = client.database(database);

        tracing::info!(database = %database, "Connected to MongoDB");
        Ok(Self {
            documents: db.collection(DOCUMENTS),
            versions: db.collection(VERSIONS),
        })
    }

    async fn find_document(&self, document_id: &str) -> Result<MongoDocument> {
        self.documents
            .find_one(doc! { "_id": document_id })
            .await?
            .ok_or_else(|| PersistError::DocumentNotFound(document_id.to_string()))
    }

    async fn find_version(&self, document_id: &str, version_id: &str) -> Result<MongoVersion> {
        self.versions
            .find_one(doc! { "_id": version_id, "document_id": document_id })
            .await?
            .ok_or_else(|| PersistError::VersionNotFound(version_id.to_string()))
    }

    /// Swap the pointer only if it still references `expected`.
    async fn swap_current(
        &self,
        document_id: &str,
        expected: &str,
        next: &str,
        count_edit: bool,
    ) -> Result<bool> {
        let now = BsonDateTime::from_chrono(Utc::now());
        let mut update = doc! {
            "$set": { "current_version_id": next, "updated_at": now },
        };
        if count_edit {
            update.insert("$inc", doc! { "counters.edits": 1_i64 });
        }
        let result = self
            .documents
            .update_one(
                doc! { "_id": document_id, "current_version_id": expected },
                update,
            )
            .await?;
        Ok(result.matched_count == 1)
    }
}

#[async_trait]
impl VersionStore for MongoStore {
    async fn create_initial(&self, document_id: &str, content: String) -> Result<Version> {
        let document = self.find_document(document_id).await?;
        let version = Version::initial(document_id, content, &document.owner_id);
        self.versions.insert_one(MongoVersion::from(version.clone())).await?;

        if !self
            .swap_current(document_id, &document.current_version_id, &version.id, false)
            .await?
        {
            self.versions.delete_one(doc! { "_id": version.id.as_str() }).await?;
            let actual = self.find_document(document_id).await?.current_version_id;
            return Err(PersistError::Conflict {
                document_id: document_id.to_string(),
                expected: document.current_version_id,
                actual,
            });
        }
        Ok(version)
    }

    async fn create_version(&self, document_id: &str, new: NewVersion) -> Result<Version> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let document = self.find_document(document_id).await?;
            let current: Version = self
                .find_version(document_id, &document.current_version_id)
                .await?
                .into();
            new.check_base(document_id, &current.id)?;

            let version = current.derive(new.clone());
            self.versions.insert_one(MongoVersion::from(version.clone())).await?;

            if self
                .swap_current(document_id, &current.id, &version.id, true)
                .await?
            {
                tracing::debug!(
                    document_id = %document_id,
                    version = %version.version_number,
                    "Created version"
                );
                return Ok(version);
            }

            // Another writer moved the pointer between read and swap.
            self.versions.delete_one(doc! { "_id": version.id.as_str() }).await?;
            if on_lost_swap(new.base_version_id.is_some(), attempt) == LostSwap::Conflict {
                let actual = self.find_document(document_id).await?.current_version_id;
                return Err(PersistError::Conflict {
                    document_id: document_id.to_string(),
                    expected: current.id,
                    actual,
                });
            }
            tracing::debug!(document_id = %document_id, attempt, "Pointer moved, rebasing");
        }
    }

    async fn get_current_version(&self, document_id: &str) -> Result<Version> {
        let document = self.find_document(document_id).await?;
        Ok(self
            .find_version(document_id, &document.current_version_id)
            .await?
            .into())
    }

    async fn get_versions(&self, document_id: &str) -> Result<Vec<Version>> {
        self.find_document(document_id).await?;
        let versions: Vec<MongoVersion> = self
            .versions
            .find(doc! { "document_id": document_id })
            .sort(doc! { "created_at": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(versions.into_iter().map(Into::into).collect())
    }

    async fn get_version(&self, document_id: &str, version_id: &str) -> Result<Version> {
        self.find_document(document_id).await?;
        Ok(self.find_version(document_id, version_id).await?.into())
    }

    async fn restore_version(&self, document_id: &str, version_id: &str) -> Result<Document> {
        self.find_version(document_id, version_id).await?;
        let mut attempt = 0;
        loop {
            attempt += 1;
            let document = self.find_document(document_id).await?;
            if self
                .swap_current(document_id, &document.current_version_id, version_id, false)
                .await?
            {
                return Ok(self.find_document(document_id).await?.into());
            }
            if on_lost_swap(false, attempt) == LostSwap::Conflict {
                let actual = self.find_document(document_id).await?.current_version_id;
                return Err(PersistError::Conflict {
                    document_id: document_id.to_string(),
                    expected: document.current_version_id,
                    actual,
                });
            }
        }
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn create_document(&self, new: NewDocument) -> Result<Document> {
        let mut document = Document::draft(&new);
        let version = Version::initial(&document.id, new.content, &new.owner_id);
        document.current_version_id = version.id.clone();

        // Version first so the pointer never dangles.
        self.versions.insert_one(MongoVersion::from(version)).await?;
        self.documents
            .insert_one(MongoDocument::from(document.clone()))
            .await?;
        Ok(document)
    }

    async fn get_document(&self, document_id: &str) -> Result<Document> {
        Ok(self.find_document(document_id).await?.into())
    }

    async fn list_documents(&self, owner_id: &str) -> Result<Vec<Document>> {
        let docs: Vec<MongoDocument> = self
            .documents
            .find(doc! { "owner_id": owner_id })
            .sort(doc! { "updated_at": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(docs.into_iter().map(Into::into).collect())
    }

    async fn update_document(&self, document_id: &str, update: DocumentUpdate) -> Result<Document> {
        let mut document: Document = self.find_document(document_id).await?.into();
        document.apply(update);

        let mut set = doc! {
            "name": document.name.clone(),
            "tags": document.tags.clone(),
            "updated_at": BsonDateTime::from_chrono(document.updated_at),
        };
        set.insert("status", bson::to_bson(&document.status)?);
        self.documents
            .update_one(doc! { "_id": document_id }, doc! { "$set": set })
            .await?;
        Ok(document)
    }

    async fn delete_document(&self, document_id: &str) -> Result<()> {
        let result = self.documents.delete_one(doc! { "_id": document_id }).await?;
        if result.deleted_count == 0 {
            return Err(PersistError::DocumentNotFound(document_id.to_string()));
        }
        let versions = self
            .versions
            .delete_many(doc! { "document_id": document_id })
            .await?;
        tracing::debug!(
            document_id = %document_id,
            versions = versions.deleted_count,
            "Deleted document"
        );
        Ok(())
    }

    async fn record_view(&self, document_id: &str) -> Result<Document> {
        let result = self
            .documents
            .update_one(
                doc! { "_id": document_id },
                doc! { "$inc": { "counters.views": 1_i64 } },
            )
            .await?;
        if result.matched_count == 0 {
            return Err(PersistError::DocumentNotFound(document_id.to_string()));
        }
        self.get_document(document_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unanchored_write_retries_lost_swap() {
        // Autosave and restore carry no base.
        assert_eq!(on_lost_swap(false, 1), LostSwap::Retry);
        assert_eq!(on_lost_swap(false, MAX_SWAP_ATTEMPTS - 1), LostSwap::Retry);
        assert_eq!(on_lost_swap(false, MAX_SWAP_ATTEMPTS), LostSwap::Conflict);
    }

    #[test]
    fn test_anchored_write_reports_lost_swap() {
        assert_eq!(on_lost_swap(true, 1), LostSwap::Conflict);
    }
}
