pub mod document;
pub mod version;

pub use document::{Document, DocumentCounters, DocumentStatus, DocumentUpdate, NewDocument};
pub use version::{ChangeType, NewVersion, Version, VersionNumber};
