use diagen_llm::Message;

use crate::session::SessionMessage;
use crate::templates::{ARTIFACT_CONTEXT_PLACEHOLDER, DEFAULT_SYSTEM_PROMPT_TEMPLATE, NO_ARTIFACT};

/// Everything sent upstream for one generation request.
#[derive(Debug, Clone)]
pub struct ContextWindow {
    pub system_prompt: String,
    pub messages: Vec<Message>,
}

impl ContextWindow {
    /// System prompt first, then history in order.
    pub fn into_messages(self) -> Vec<Message> {
        let mut out = Vec::with_capacity(self.messages.len() + 1);
        out.push(Message::system(self.system_prompt));
        out.extend(self.messages);
        out
    }
}

#[derive(Debug, Clone)]
pub struct ContextBuilder {
    system_prompt_template: String,
}

impl ContextBuilder {
    pub fn new() -> Self {
        Self::with_template(DEFAULT_SYSTEM_PROMPT_TEMPLATE)
    }

    pub fn with_template(template: impl Into<String>) -> Self {
        Self {
            system_prompt_template: template.into(),
        }
    }

    pub fn system_prompt(&self, artifact_context: Option<&str>) -> String {
        let artifact = artifact_context
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(NO_ARTIFACT);
        self.system_prompt_template
            .replace(ARTIFACT_CONTEXT_PLACEHOLDER, artifact)
    }

    /// `history` is expected to already end with the new user message.
    pub fn build<'a>(
        &self,
        history: impl IntoIterator<Item = &'a SessionMessage>,
        artifact_context: Option<&str>,
    ) -> ContextWindow {
        ContextWindow {
            system_prompt: self.system_prompt(artifact_context),
            messages: history.into_iter().map(Message::from).collect(),
        }
    }
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_artifact() {
        let builder = ContextBuilder::new();
        let prompt = builder.system_prompt(Some("<mxGraphModel/>"));
        assert!(prompt.contains("<mxGraphModel/>"));
        assert!(!prompt.contains(ARTIFACT_CONTEXT_PLACEHOLDER));
    }

    #[test]
    fn test_prompt_without_artifact() {
        let builder = ContextBuilder::new();
        assert!(builder.system_prompt(None).contains(NO_ARTIFACT));
        assert!(builder.system_prompt(Some("  ")).contains(NO_ARTIFACT));
    }

    #[test]
    fn test_custom_template() {
        let builder = ContextBuilder::with_template("diagram: <artifact_context>");
        assert_eq!(builder.system_prompt(Some("<a/>")), "diagram: <a/>");
    }
}
