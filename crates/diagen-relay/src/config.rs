use std::time::Duration;

use diagen_types::GenerationConfig;

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub generation: GenerationConfig,
    /// Limit for the upstream call to start streaming.
    pub request_timeout: Duration,
    /// Limit between two upstream chunks.
    pub idle_timeout: Duration,
    pub channel_capacity: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            generation: GenerationConfig::default(),
            request_timeout: Duration::from_secs(60),
            idle_timeout: Duration::from_secs(60),
            channel_capacity: 256,
        }
    }
}

impl RelayConfig {
    pub fn with_generation(mut self, generation: GenerationConfig) -> Self {
        self.generation = generation;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }
}

/// One inbound chat message.
#[derive(Debug, Clone)]
pub struct RelayInput {
    pub message: String,
    /// Generated when absent.
    pub session_id: Option<String>,
    /// Document that receives the extracted artifact.
    pub document_id: Option<String>,
    /// Current diagram markup shown to the model.
    pub artifact_context: Option<String>,
    pub user_id: String,
}

impl RelayInput {
    pub fn new(message: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            session_id: None,
            document_id: None,
            artifact_context: None,
            user_id: user_id.into(),
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_document(mut self, document_id: impl Into<String>) -> Self {
        self.document_id = Some(document_id.into());
        self
    }

    pub fn with_artifact_context(mut self, markup: impl Into<String>) -> Self {
        self.artifact_context = Some(markup.into());
        self
    }
}
