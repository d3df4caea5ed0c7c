use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;

use crate::dbs::memory::InMemoryStore;
use crate::error::{PersistError, Result};
use crate::store::{DocumentStore, VersionStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Mongodb,
}

impl FromStr for StorageBackend {
    type Err = PersistError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "mongodb" | "mongo" => Ok(Self::Mongodb),
            other => Err(PersistError::Internal(format!("Unknown storage backend: {other}"))),
        }
    }
}

/// The same backend seen through both store traits.
#[derive(Clone)]
pub struct Stores {
    pub documents: Arc<dyn DocumentStore>,
    pub versions: Arc<dyn VersionStore>,
}

impl Stores {
    pub fn in_memory() -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self {
            documents: store.clone(),
            versions: store,
        }
    }
}

pub struct StoreBuilder {
    backend: StorageBackend,
    mongodb_uri: Option<String>,
    database: Option<String>,
}

impl StoreBuilder {
    pub fn new() -> Self {
        Self {
            backend: StorageBackend::Memory,
            mongodb_uri: None,
            database: None,
        }
    }

    pub fn backend(mut self, backend: StorageBackend) -> Self {
        self.backend = backend;
        self
    }

    pub fn mongodb_uri(mut self, uri: impl Into<String>) -> Self {
        self.mongodb_uri = Some(uri.into());
        self
    }

    pub fn database(mut self, db: impl Into<String>) -> Self {
        self.database = Some(db.into());
        self
    }

    pub async fn build(self) -> Result<Stores> {
        match self.backend {
            StorageBackend::Memory => Ok(Stores::in_memory()),
            StorageBackend::Mongodb => self.build_mongo().await,
        }
    }

    #[cfg(feature = "mongodb")]
    async fn build_mongo(self) -> Result<Stores> {
        let uri = self
            .mongodb_uri
            .ok_or_else(|| PersistError::Internal("mongodb_uri is required".to_string()))?;
        let database = self
            .database
            .ok_or_else(|| PersistError::Internal("database is required".to_string()))?;
        let store = Arc::new(crate::dbs::mongo::MongoStore::connect(&uri, &database).await?);
        Ok(Stores {
            documents: store.clone(),
            versions: store,
        })
    }

    #[cfg(not(feature = "mongodb"))]
    async fn build_mongo(self) -> Result<Stores> {
        Err(PersistError::Internal(
            "mongodb backend requested but the `mongodb` feature is disabled".to_string(),
        ))
    }
}

impl Default for StoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_from_str() {
        assert_eq!("memory".parse::<StorageBackend>().unwrap(), StorageBackend::Memory);
        assert_eq!("MongoDB".parse::<StorageBackend>().unwrap(), StorageBackend::Mongodb);
        assert!("sqlite".parse::<StorageBackend>().is_err());
    }

    #[tokio::test]
    async fn test_memory_build_shares_one_store() {
        let stores = StoreBuilder::new().build().await.unwrap();
        let doc = stores
            .documents
            .create_document(crate::NewDocument::new("d", "u1").with_content("<a/>"))
            .await
            .unwrap();
        let current = stores.versions.get_current_version(&doc.id).await.unwrap();
        assert_eq!(current.content, "<a/>");
    }

    #[cfg(not(feature = "mongodb"))]
    #[tokio::test]
    async fn test_mongo_without_feature_fails() {
        let result = StoreBuilder::new().backend(StorageBackend::Mongodb).build().await;
        assert!(result.is_err());
    }
}
