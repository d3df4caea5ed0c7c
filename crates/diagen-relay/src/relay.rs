use std::sync::Arc;

use diagen_artifact::{ArtifactExtractor, ArtifactOutcome, ArtifactSpec};
use diagen_context::{ContextBuilder, SessionMessage, SessionRegistry};
use diagen_llm::{ChatClient, ChatRequest, EventStream, StreamEvent};
use diagen_persist::{AutosaveCoordinator, DirtySource};
use diagen_types::RelayEvent;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::time::timeout;

use crate::config::{RelayConfig, RelayInput};
use crate::error::RelayError;

/// Drives generation requests. Each run gets its own extractor and
/// output buffer; only the session registry and autosave are shared.
#[derive(Clone)]
pub struct Relay {
    client: Arc<dyn ChatClient>,
    sessions: Arc<SessionRegistry>,
    context: ContextBuilder,
    autosave: Option<AutosaveCoordinator>,
    spec: ArtifactSpec,
    config: RelayConfig,
}

impl Relay {
    pub fn new(
        client: Arc<dyn ChatClient>,
        sessions: Arc<SessionRegistry>,
        config: RelayConfig,
    ) -> Self {
        Self {
            client,
            sessions,
            context: ContextBuilder::new(),
            autosave: None,
            spec: ArtifactSpec::drawio(),
            config,
        }
    }

    pub(crate) fn with_parts(
        mut self,
        context: ContextBuilder,
        autosave: Option<AutosaveCoordinator>,
        spec: ArtifactSpec,
    ) -> Self {
        self.context = context;
        self.autosave = autosave;
        self.spec = spec;
        self
    }

    pub fn builder() -> crate::builder::RelayBuilder {
        crate::builder::RelayBuilder::new()
    }

    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Spawn the run in the background and return its event receiver.
    ///
    /// The receiver yields `connected`, then content deltas, then exactly
    /// one `done` or `error`, then closes. Dropping the receiver cancels
    /// the upstream call.
    pub fn spawn_run(&self, input: RelayInput) -> mpsc::Receiver<RelayEvent> {
        let (tx, rx) = mpsc::channel(self.config.channel_capacity.max(1));
        let relay = self.clone();

        tokio::spawn(async move {
            if let Err(e) = relay.execute(input, &tx).await {
                if e.is_reportable() {
                    tracing::warn!(error = %e, "Generation ended with error");
                    let _ = tx.send(RelayEvent::error(e.to_string())).await;
                } else {
                    tracing::info!("Caller disconnected; generation aborted");
                }
            }
        });

        rx
    }

    async fn execute(
        &self,
        input: RelayInput,
        tx: &mpsc::Sender<RelayEvent>,
    ) -> Result<(), RelayError> {
        send(tx, RelayEvent::connected()).await?;

        let session_id = input
            .session_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let _session_guard = tokio::select! {
            biased;
            _ = tx.closed() => return Err(RelayError::Disconnected),
            guard = self.sessions.lock_session(&session_id) => guard,
        };

        self.sessions
            .append(&session_id, SessionMessage::user(input.message.clone()))
            .await;
        let session = self.sessions.get(&session_id).await;
        let messages = self
            .context
            .build(session.messages(), input.artifact_context.as_deref())
            .into_messages();

        tracing::info!(
            session_id = %session_id,
            document_id = ?input.document_id,
            history = messages.len(),
            "Starting generation"
        );

        let mut stream = tokio::select! {
            biased;
            _ = tx.closed() => return Err(RelayError::Disconnected),
            stream = self.open_stream(messages) => stream?,
        };
        let mut extractor = ArtifactExtractor::new(self.spec.clone());
        let mut shown = String::new();

        loop {
            let next = tokio::select! {
                biased;
                _ = tx.closed() => return Err(RelayError::Disconnected),
                next = timeout(self.config.idle_timeout, stream.next()) => next,
            };

            match next {
                Err(_) => return Err(RelayError::IdleTimeout(self.config.idle_timeout)),
                Ok(None) | Ok(Some(Ok(StreamEvent::Done { .. }))) => break,
                Ok(Some(Err(e))) => return Err(RelayError::Upstream(e.to_string())),
                Ok(Some(Ok(StreamEvent::Message { content }))) => {
                    if let Some(delta) = extractor.push(&content) {
                        shown.push_str(&delta);
                        send(tx, RelayEvent::content(delta, shown.as_str())).await?;
                    }
                }
            }
        }
        drop(stream);

        let extraction = extractor.finalize();
        if let Some(trailing) = extraction.trailing.filter(|t| !t.is_empty()) {
            shown.push_str(&trailing);
            send(tx, RelayEvent::content(trailing, shown.as_str())).await?;
        }

        match extraction.outcome {
            ArtifactOutcome::Accepted(markup) => {
                self.schedule_save(&input, markup).await;
            }
            ArtifactOutcome::Rejected(e) => {
                tracing::warn!(session_id = %session_id, error = %e, "Diagram rejected");
                let notice = format!(
                    "\n\nThe diagram could not be used ({e}). Ask me to try again."
                );
                shown.push_str(&notice);
                send(tx, RelayEvent::content(notice, shown.as_str())).await?;
            }
            ArtifactOutcome::None => {}
        }

        let reply = SessionMessage::assistant(extractor.buffer());
        let message_id = reply.id.clone();
        self.sessions.append(&session_id, reply).await;

        send(
            tx,
            RelayEvent::Done {
                session_id,
                message_id,
                document_id: input.document_id,
            },
        )
        .await
    }

    async fn open_stream(&self, messages: Vec<diagen_llm::Message>) -> Result<EventStream, RelayError> {
        let generation = &self.config.generation;
        let request = ChatRequest::new(generation.model.clone(), messages)
            .temperature(generation.temperature)
            .max_tokens(generation.max_tokens);

        match timeout(self.config.request_timeout, self.client.chat_stream(request)).await {
            Err(_) => Err(RelayError::ConnectTimeout(self.config.request_timeout)),
            Ok(result) => Ok(result?),
        }
    }

    async fn schedule_save(&self, input: &RelayInput, markup: String) {
        let (Some(document_id), Some(autosave)) = (&input.document_id, &self.autosave) else {
            tracing::debug!("Artifact accepted without a target document");
            return;
        };
        autosave
            .mark_dirty(document_id, DirtySource::ExtractorOutput, markup, input.user_id.as_str())
            .await;
    }
}

async fn send(tx: &mpsc::Sender<RelayEvent>, event: RelayEvent) -> Result<(), RelayError> {
    tx.send(event).await.map_err(|_| RelayError::Disconnected)
}
