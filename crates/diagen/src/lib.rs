//! # Diagen
//!
//! Turns chat messages into draw.io diagrams.
//!
//! A reply is streamed token by token while any diagram markup in it is
//! held back, validated, and handed to a debounced autosave that writes a
//! new document version. The pieces:
//!
//! - **`diagen-llm`**: OpenAI-compatible streaming chat client
//! - **`diagen-artifact`**: incremental extraction and validation of diagram markup
//! - **`diagen-context`**: bounded per-session history and prompt assembly
//! - **`diagen-persist`**: documents, version lineage and autosave (memory or MongoDB)
//! - **`diagen-relay`**: one generation run, from user message to `done`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use diagen::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = ClientFactory::create_client(&OpenAIConfig::new(
//!         std::env::var("OPENAI_API_KEY")?,
//!     ))?;
//!
//!     let stores = Stores::in_memory();
//!     let doc = stores
//!         .documents
//!         .create_document(NewDocument::new("Checkout flow", "user-1"))
//!         .await?;
//!     let autosave = AutosaveCoordinator::new(stores.versions.clone(), AutosaveConfig::default());
//!
//!     let relay = Relay::builder()
//!         .client(client)
//!         .autosave(autosave.clone())
//!         .build()?;
//!
//!     let input = RelayInput::new("Draw the checkout flow", "user-1").with_document(doc.id.clone());
//!     let mut events = relay.spawn_run(input);
//!     while let Some(event) = events.recv().await {
//!         match event {
//!             RelayEvent::Content { delta, .. } => print!("{}", delta),
//!             RelayEvent::Error { message } => eprintln!("\n{}", message),
//!             _ => {}
//!         }
//!     }
//!
//!     autosave.flush(&doc.id).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `mongodb`: MongoDB storage backend

pub mod prelude;

pub use diagen_types::{GenerationConfig, RelayEvent};

pub use diagen_llm::{
    ChatClient, ChatRequest, ChatResponse, ClientFactory, Content, EventStream, Message,
    OpenAIClient, OpenAIConfig, StreamEvent, TokenUsage,
};

pub use diagen_artifact::{
    validate, ArtifactExtractor, ArtifactOutcome, ArtifactSpec, Extraction, ValidationError,
};

pub use diagen_context::{
    ContextBuilder, ContextWindow, Role, Session, SessionConfig, SessionMessage, SessionRegistry,
};

pub use diagen_persist::{
    AutosaveConfig, AutosaveCoordinator, AutosaveStatus, ChangeType, DirtySource, Document,
    DocumentStatus, DocumentStore, DocumentUpdate, InMemoryStore, NewDocument, NewVersion,
    PersistError, StorageBackend, StoreBuilder, Stores, Version, VersionNumber, VersionStore,
};

#[cfg(feature = "mongodb")]
pub use diagen_persist::MongoStore;

pub use diagen_relay::{Relay, RelayBuilder, RelayConfig, RelayError, RelayInput};
