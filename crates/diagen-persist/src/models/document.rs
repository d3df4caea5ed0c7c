use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    #[default]
    Draft,
    Active,
    Archived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DocumentCounters {
    pub views: u64,
    pub edits: u64,
}

/// A named diagram with a movable pointer to its current version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub name: String,
    pub status: DocumentStatus,
    pub current_version_id: String,
    pub tags: Vec<String>,
    pub counters: DocumentCounters,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Document with no current version yet. Stores fill in
    /// `current_version_id` in the same step that writes the initial version.
    pub(crate) fn draft(new: &NewDocument) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: new.name.clone(),
            status: new.status.unwrap_or_default(),
            current_version_id: String::new(),
            tags: normalize_tags(new.tags.clone()),
            counters: DocumentCounters::default(),
            owner_id: new.owner_id.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    pub(crate) fn apply(&mut self, update: DocumentUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(tags) = update.tags {
            self.tags = normalize_tags(tags);
        }
        self.updated_at = Utc::now();
    }
}

/// Tags behave as a set: sorted, no duplicates, no blanks.
pub(crate) fn normalize_tags(mut tags: Vec<String>) -> Vec<String> {
    tags.retain(|t| !t.trim().is_empty());
    tags.sort();
    tags.dedup();
    tags
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDocument {
    pub name: String,
    pub owner_id: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub status: Option<DocumentStatus>,
    /// Markup stored as version 1.0.
    #[serde(default)]
    pub content: String,
}

impl NewDocument {
    pub fn new(name: impl Into<String>, owner_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            owner_id: owner_id.into(),
            tags: Vec::new(),
            status: None,
            content: String::new(),
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_status(mut self, status: DocumentStatus) -> Self {
        self.status = Some(status);
        self
    }
}

/// Metadata edit. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentUpdate {
    pub name: Option<String>,
    pub status: Option<DocumentStatus>,
    pub tags: Option<Vec<String>>,
}
