use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Version not found: {0}")]
    VersionNotFound(String),

    #[error("Version conflict on document {document_id}: expected base {expected}, current is {actual}")]
    Conflict {
        document_id: String,
        expected: String,
        actual: String,
    },

    #[error("Invalid version number: {0}")]
    InvalidVersionNumber(String),

    #[cfg(feature = "mongodb")]
    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[cfg(feature = "mongodb")]
    #[error("BSON serialization error: {0}")]
    BsonSerialization(#[from] bson::ser::Error),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PersistError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::DocumentNotFound(_) | Self::VersionNotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, PersistError>;
