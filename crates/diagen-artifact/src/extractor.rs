use crate::error::ValidationError;
use crate::finalize::select_candidate;
use crate::scanner::{earliest_trigger, floor_char_boundary, holdback_len};
use crate::spec::ArtifactSpec;
use crate::validate::validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractorState {
    /// No trigger seen yet; text flows to the caller
    Scanning,
    /// Trigger found at `trigger_offset`; visible text is frozen before it
    Capturing { trigger_offset: usize },
    /// Stream ended and extraction ran
    Finalized,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactOutcome {
    /// Stream never contained a trigger
    None,
    /// Validated markup
    Accepted(String),
    /// Capture started but nothing valid came out of it
    Rejected(ValidationError),
}

/// Result of finalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// Text the caller should end up seeing
    pub display_text: String,
    /// Display text withheld during streaming and released now
    pub trailing: Option<String>,
    pub outcome: ArtifactOutcome,
}

impl Extraction {
    pub fn artifact(&self) -> Option<&str> {
        match &self.outcome {
            ArtifactOutcome::Accepted(markup) => Some(markup),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ValidationError> {
        match &self.outcome {
            ArtifactOutcome::Rejected(e) => Some(e),
            _ => None,
        }
    }
}

/// Observer over one request's growing output buffer.
///
/// `push` every chunk as it arrives, then `finalize` once the stream ends.
/// The final display text and artifact depend only on the concatenated
/// input, never on how it was split into chunks.
pub struct ArtifactExtractor {
    spec: ArtifactSpec,
    buffer: String,
    state: ExtractorState,
    /// Byte length of the buffer prefix already released to the caller
    emitted: usize,
}

impl ArtifactExtractor {
    pub fn new(spec: ArtifactSpec) -> Self {
        Self {
            spec,
            buffer: String::new(),
            state: ExtractorState::Scanning,
            emitted: 0,
        }
    }

    pub fn state(&self) -> ExtractorState {
        self.state
    }

    /// Everything received so far
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Text released to the caller so far
    pub fn visible(&self) -> &str {
        &self.buffer[..self.emitted]
    }

    /// Append a chunk and return the newly visible text, if any
    pub fn push(&mut self, chunk: &str) -> Option<String> {
        if self.state == ExtractorState::Finalized {
            tracing::warn!("Chunk pushed after finalization; ignoring");
            return None;
        }

        let previous_len = self.buffer.len();
        self.buffer.push_str(chunk);

        if self.state == ExtractorState::Scanning {
            // No trigger existed before this chunk, so a new one must end inside it
            let overlap = self.spec.longest_trigger().saturating_sub(1);
            let from = floor_char_boundary(&self.buffer, previous_len.saturating_sub(overlap));

            if let Some(offset) = earliest_trigger(&self.spec, &self.buffer, from) {
                tracing::debug!(trigger_offset = offset, "Artifact trigger found; capturing");
                self.state = ExtractorState::Capturing { trigger_offset: offset };
            }
        }

        let visible_end = match self.state {
            ExtractorState::Scanning => self.buffer.len() - holdback_len(&self.spec, &self.buffer),
            ExtractorState::Capturing { trigger_offset } => trigger_offset,
            ExtractorState::Finalized => self.emitted,
        };

        self.release_up_to(visible_end)
    }

    fn release_up_to(&mut self, end: usize) -> Option<String> {
        if end <= self.emitted {
            return None;
        }
        let delta = self.buffer[self.emitted..end].to_string();
        self.emitted = end;
        Some(delta)
    }

    /// Run extraction over the full buffer. Idempotent after the first call.
    pub fn finalize(&mut self) -> Extraction {
        let trigger_offset = match self.state {
            ExtractorState::Capturing { trigger_offset } => Some(trigger_offset),
            _ => earliest_trigger(&self.spec, &self.buffer, 0),
        };
        self.state = ExtractorState::Finalized;

        let Some(offset) = trigger_offset else {
            let trailing = self.release_up_to(self.buffer.len());
            return Extraction {
                display_text: self.buffer.clone(),
                trailing,
                outcome: ArtifactOutcome::None,
            };
        };

        let display_text = self.buffer[..offset].trim().to_string();
        let outcome = match select_candidate(&self.spec, &self.buffer) {
            None => ArtifactOutcome::Rejected(ValidationError::Incomplete),
            Some(candidate) => match validate(&self.spec, candidate) {
                Ok(()) => ArtifactOutcome::Accepted(candidate.to_string()),
                Err(e) => ArtifactOutcome::Rejected(e),
            },
        };

        match &outcome {
            ArtifactOutcome::Accepted(markup) => {
                tracing::debug!(artifact_len = markup.len(), "Artifact accepted")
            }
            ArtifactOutcome::Rejected(e) => tracing::info!(error = %e, "Artifact rejected"),
            ArtifactOutcome::None => {}
        }

        Extraction {
            display_text,
            trailing: None,
            outcome,
        }
    }
}

impl Default for ArtifactExtractor {
    fn default() -> Self {
        Self::new(ArtifactSpec::drawio())
    }
}
