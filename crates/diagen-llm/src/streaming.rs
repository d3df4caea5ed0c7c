use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::buffer_utils::SseLineParser;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Incremental text produced by the model
    Message {
        content: String,
    },

    Done {
        #[serde(skip_serializing_if = "Option::is_none")]
        finish_reason: Option<String>,
    },
}

/// One `data:` payload of a streamed completion. Only the first choice
/// is read; the relay never requests `n > 1`.
#[derive(Debug, Deserialize)]
struct CompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    content: Option<String>,
}

impl CompletionChunk {
    fn into_events(self) -> Vec<StreamEvent> {
        let Some(choice) = self.choices.into_iter().next() else {
            return Vec::new();
        };

        let text = choice
            .delta
            .content
            .filter(|c| !c.is_empty())
            .map(|content| StreamEvent::Message { content });
        let done = choice
            .finish_reason
            .map(|reason| StreamEvent::Done { finish_reason: Some(reason) });

        text.into_iter().chain(done).collect()
    }
}

/// Parses `data:` lines of the chat completions stream
pub struct ChatSseParser;

impl SseLineParser for ChatSseParser {
    fn parse_data_line(&self, data: &str) -> Result<Vec<StreamEvent>> {
        let chunk: CompletionChunk = serde_json::from_str(data)
            .map_err(|e| anyhow::anyhow!("Failed to parse chat chunk: {}", e))?;
        Ok(chunk.into_events())
    }
}
