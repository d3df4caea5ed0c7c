use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{
    ChangeType, Document, DocumentCounters, DocumentStatus, Version, VersionNumber,
};

/// `documents` collection row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub status: DocumentStatus,
    pub current_version_id: String,
    pub tags: Vec<String>,
    pub counters: DocumentCounters,
    pub owner_id: String,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

/// `versions` collection row. The version number is stored as the
/// `"major.minor"` string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoVersion {
    #[serde(rename = "_id")]
    pub id: String,
    pub document_id: String,
    pub version_number: VersionNumber,
    pub parent_version_id: Option<String>,
    pub content: String,
    pub change_type: ChangeType,
    pub change_summary: String,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

impl From<Document> for MongoDocument {
    fn from(doc: Document) -> Self {
        Self {
            id: doc.id,
            name: doc.name,
            status: doc.status,
            current_version_id: doc.current_version_id,
            tags: doc.tags,
            counters: doc.counters,
            owner_id: doc.owner_id,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        }
    }
}

impl From<MongoDocument> for Document {
    fn from(doc: MongoDocument) -> Self {
        Self {
            id: doc.id,
            name: doc.name,
            status: doc.status,
            current_version_id: doc.current_version_id,
            tags: doc.tags,
            counters: doc.counters,
            owner_id: doc.owner_id,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        }
    }
}

impl From<Version> for MongoVersion {
    fn from(v: Version) -> Self {
        Self {
            id: v.id,
            document_id: v.document_id,
            version_number: v.version_number,
            parent_version_id: v.parent_version_id,
            content: v.content,
            change_type: v.change_type,
            change_summary: v.change_summary,
            created_at: v.created_at,
            created_by: v.created_by,
        }
    }
}

impl From<MongoVersion> for Version {
    fn from(v: MongoVersion) -> Self {
        Self {
            id: v.id,
            document_id: v.document_id,
            version_number: v.version_number,
            parent_version_id: v.parent_version_id,
            content: v.content,
            change_type: v.change_type,
            change_summary: v.change_summary,
            created_at: v.created_at,
            created_by: v.created_by,
        }
    }
}
