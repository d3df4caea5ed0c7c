//! Prelude module for convenient imports
//!
//! ```rust
//! use diagen::prelude::*;
//! ```

pub use crate::{
    ArtifactSpec, AutosaveConfig, AutosaveCoordinator, ChatClient, ClientFactory, DirtySource,
    DocumentStore, GenerationConfig, NewDocument, NewVersion, OpenAIConfig, Relay, RelayConfig,
    RelayEvent, RelayInput, SessionConfig, SessionRegistry, StoreBuilder, Stores, VersionStore,
};
