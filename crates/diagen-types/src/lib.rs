pub mod config;
pub mod events;

pub use config::{GenerationConfig, DEFAULT_MAX_TOKENS, DEFAULT_MODEL};
pub use events::RelayEvent;
