use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PersistError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Major,
    Minor,
    Patch,
}

/// `major.minor` pair, serialized as the string `"2.3"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionNumber {
    pub major: u32,
    pub minor: u32,
}

impl VersionNumber {
    pub const INITIAL: VersionNumber = VersionNumber { major: 1, minor: 0 };

    pub fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Number assigned to a version derived from `self`.
    ///
    /// A patch change keeps the number unchanged; only the lineage records
    /// that a new version exists.
    pub fn next(self, change: ChangeType) -> Self {
        match change {
            ChangeType::Major => Self::new(self.major + 1, 0),
            ChangeType::Minor => Self::new(self.major, self.minor + 1),
            ChangeType::Patch => self,
        }
    }
}

impl fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for VersionNumber {
    type Err = PersistError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PersistError::InvalidVersionNumber(s.to_string());
        let (major, minor) = s.split_once('.').ok_or_else(invalid)?;
        Ok(Self {
            major: major.parse().map_err(|_| invalid())?,
            minor: minor.parse().map_err(|_| invalid())?,
        })
    }
}

impl TryFrom<String> for VersionNumber {
    type Error = PersistError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VersionNumber> for String {
    fn from(value: VersionNumber) -> Self {
        value.to_string()
    }
}

/// Immutable snapshot of a document's markup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    pub id: String,
    pub document_id: String,
    pub version_number: VersionNumber,
    pub parent_version_id: Option<String>,
    pub content: String,
    pub change_type: ChangeType,
    pub change_summary: String,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

impl Version {
    pub(crate) fn initial(document_id: &str, content: String, created_by: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            document_id: document_id.to_string(),
            version_number: VersionNumber::INITIAL,
            parent_version_id: None,
            content,
            change_type: ChangeType::Major,
            change_summary: "Initial version".to_string(),
            created_at: Utc::now(),
            created_by: created_by.to_string(),
        }
    }

    /// Child of `self` carrying the new content.
    pub(crate) fn derive(&self, new: NewVersion) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            document_id: self.document_id.clone(),
            version_number: self.version_number.next(new.change_type),
            parent_version_id: Some(self.id.clone()),
            content: new.content,
            change_type: new.change_type,
            change_summary: new.change_summary,
            created_at: Utc::now(),
            created_by: new.created_by,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVersion {
    pub content: String,
    pub change_type: ChangeType,
    #[serde(default)]
    pub change_summary: String,
    #[serde(default)]
    pub created_by: String,
    /// When set, the save only succeeds if this is still the current version.
    #[serde(default)]
    pub base_version_id: Option<String>,
}

impl NewVersion {
    pub fn new(content: impl Into<String>, change_type: ChangeType) -> Self {
        Self {
            content: content.into(),
            change_type,
            change_summary: String::new(),
            created_by: String::new(),
            base_version_id: None,
        }
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.change_summary = summary.into();
        self
    }

    pub fn created_by(mut self, author: impl Into<String>) -> Self {
        self.created_by = author.into();
        self
    }

    pub fn based_on(mut self, version_id: impl Into<String>) -> Self {
        self.base_version_id = Some(version_id.into());
        self
    }

    /// Fails with `Conflict` when the caller edited a stale base.
    pub(crate) fn check_base(&self, document_id: &str, current: &str) -> Result<(), PersistError> {
        match &self.base_version_id {
            Some(expected) if expected != current => Err(PersistError::Conflict {
                document_id: document_id.to_string(),
                expected: expected.clone(),
                actual: current.to_string(),
            }),
            _ => Ok(()),
        }
    }
}
