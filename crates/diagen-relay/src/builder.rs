use std::sync::Arc;

use anyhow::{anyhow, Result};
use diagen_artifact::ArtifactSpec;
use diagen_context::{ContextBuilder, SessionConfig, SessionRegistry};
use diagen_llm::ChatClient;
use diagen_persist::AutosaveCoordinator;

use crate::config::RelayConfig;
use crate::relay::Relay;

/// Builder for a [`Relay`] with optional components
pub struct RelayBuilder {
    client: Option<Arc<dyn ChatClient>>,
    sessions: Option<Arc<SessionRegistry>>,
    context: ContextBuilder,
    autosave: Option<AutosaveCoordinator>,
    spec: ArtifactSpec,
    config: RelayConfig,
}

impl RelayBuilder {
    pub fn new() -> Self {
        Self {
            client: None,
            sessions: None,
            context: ContextBuilder::new(),
            autosave: None,
            spec: ArtifactSpec::drawio(),
            config: RelayConfig::default(),
        }
    }

    pub fn client(mut self, client: Arc<dyn ChatClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Shared registry. A private default one is created when unset.
    pub fn sessions(mut self, sessions: Arc<SessionRegistry>) -> Self {
        self.sessions = Some(sessions);
        self
    }

    pub fn context(mut self, context: ContextBuilder) -> Self {
        self.context = context;
        self
    }

    /// Without autosave, accepted artifacts are only streamed.
    pub fn autosave(mut self, autosave: AutosaveCoordinator) -> Self {
        self.autosave = Some(autosave);
        self
    }

    pub fn artifact_spec(mut self, spec: ArtifactSpec) -> Self {
        self.spec = spec;
        self
    }

    pub fn config(mut self, config: RelayConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<Relay> {
        let client = self
            .client
            .ok_or_else(|| anyhow!("Chat client is required"))?;
        let sessions = self
            .sessions
            .unwrap_or_else(|| Arc::new(SessionRegistry::new(SessionConfig::default())));

        Ok(Relay::new(client, sessions, self.config).with_parts(
            self.context,
            self.autosave,
            self.spec,
        ))
    }
}

impl Default for RelayBuilder {
    fn default() -> Self {
        Self::new()
    }
}
