mod session;
mod registry;
mod strategy;
mod templates;

pub use session::{Role, Session, SessionMessage};
pub use registry::{SessionConfig, SessionGuard, SessionRegistry};
pub use strategy::{ContextBuilder, ContextWindow};
pub use templates::{ARTIFACT_CONTEXT_PLACEHOLDER, DEFAULT_SYSTEM_PROMPT_TEMPLATE};
