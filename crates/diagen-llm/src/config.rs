//! Building a `ChatClient` from settings.

use std::fmt;
use std::sync::Arc;

use anyhow::{bail, Result};
use serde::Deserialize;

use crate::{ChatClient, OpenAIClient};

/// Connection settings for an OpenAI-compatible provider
#[derive(Clone, Deserialize)]
pub struct OpenAIConfig {
    pub api_key: String,
    /// Gateway or proxy URL. The public API when unset.
    #[serde(default)]
    pub base_url: Option<String>,
}

impl OpenAIConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

// Keeps the key out of logs
impl fmt::Debug for OpenAIConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAIConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

pub struct ClientFactory;

impl ClientFactory {
    pub fn create_client(config: &OpenAIConfig) -> Result<Arc<dyn ChatClient>> {
        if config.api_key.trim().is_empty() {
            bail!("OpenAI API key is empty");
        }

        let client = match &config.base_url {
            Some(base_url) => OpenAIClient::with_base_url(&config.api_key, base_url)?,
            None => OpenAIClient::new(&config.api_key)?,
        };
        tracing::debug!(base_url = %client.base_url(), "Chat client created");
        Ok(Arc::new(client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_key() {
        let config = OpenAIConfig::new("sk-secret").with_base_url("http://localhost:8080/v1");
        let printed = format!("{config:?}");
        assert!(!printed.contains("sk-secret"));
        assert!(printed.contains("localhost:8080"));
    }

    #[test]
    fn test_blank_key_rejected() {
        assert!(ClientFactory::create_client(&OpenAIConfig::new("  ")).is_err());
        assert!(ClientFactory::create_client(&OpenAIConfig::new("sk-test")).is_ok());
    }
}
