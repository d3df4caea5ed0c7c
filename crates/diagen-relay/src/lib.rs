pub mod config;
pub mod error;
pub mod relay;
pub mod builder;

pub use config::{RelayConfig, RelayInput};
pub use error::RelayError;
pub use relay::Relay;
pub use builder::RelayBuilder;

pub use diagen_types::{GenerationConfig, RelayEvent};
