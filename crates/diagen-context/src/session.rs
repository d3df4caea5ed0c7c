use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use diagen_llm::Message;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One turn of the conversation. Never modified after it is appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl SessionMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

impl From<&SessionMessage> for Message {
    fn from(msg: &SessionMessage) -> Self {
        match msg.role {
            Role::User => Message::human(msg.content.clone()),
            Role::Assistant => Message::ai(msg.content.clone()),
        }
    }
}

/// Conversation history capped at the most recent messages.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    messages: VecDeque<SessionMessage>,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            messages: VecDeque::new(),
        }
    }

    pub fn messages(&self) -> impl Iterator<Item = &SessionMessage> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Append, then drop from the front until at most `limit` remain.
    pub(crate) fn push(&mut self, message: SessionMessage, limit: usize) {
        self.messages.push_back(message);
        while self.messages.len() > limit {
            self.messages.pop_front();
        }
    }
}
