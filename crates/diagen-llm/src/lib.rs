pub mod types;
pub mod traits;
pub mod streaming;
pub mod buffer_utils;
pub mod openai;
pub mod config;

pub use traits::{ChatClient, ChatRequest, ChatResponse, EventStream, TokenUsage};

pub use streaming::StreamEvent;
pub use buffer_utils::{CircularLineBuffer, SseLineParser, parse_sse_bytes};
pub use openai::OpenAIClient;
pub use config::{ClientFactory, OpenAIConfig};
pub use types::{ChatRole, Content, ContentPart, Message};
