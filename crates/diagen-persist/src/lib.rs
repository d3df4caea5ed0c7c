pub mod models;
pub mod store;
pub mod dbs;
pub mod autosave;
pub mod error;
pub mod builder;

pub use models::{
    ChangeType, Document, DocumentCounters, DocumentStatus, DocumentUpdate, NewDocument,
    NewVersion, Version, VersionNumber,
};
pub use store::{DocumentStore, VersionStore};
pub use dbs::memory::InMemoryStore;
#[cfg(feature = "mongodb")]
pub use dbs::mongo::MongoStore;
pub use autosave::{AutosaveConfig, AutosaveCoordinator, AutosaveStatus, DirtySource};
pub use error::PersistError;
pub use builder::{StorageBackend, StoreBuilder, Stores};
