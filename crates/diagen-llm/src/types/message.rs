use serde::{Deserialize, Serialize};

use super::content::Content;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One entry of a chat completion request. Serializes to the
/// `{"role": ..., "content": ...}` shape the completions endpoint takes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    role: ChatRole,
    content: Content,
}

impl Message {
    pub fn new(role: ChatRole, content: impl Into<Content>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Instructions plus the current diagram
    pub fn system(content: impl Into<Content>) -> Self {
        Self::new(ChatRole::System, content)
    }

    pub fn human(content: impl Into<Content>) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn ai(content: impl Into<Content>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }

    pub fn chat_role(&self) -> ChatRole {
        self.role
    }

    /// Wire name of the role
    pub fn role(&self) -> &'static str {
        self.role.as_str()
    }

    pub fn content(&self) -> &Content {
        &self.content
    }
}
