use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Diagrams are long; a whole draw.io document has to fit in one reply.
pub const DEFAULT_MAX_TOKENS: u32 = 8192;

/// Model settings for one generation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default = "default_max_tokens", skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

fn default_max_tokens() -> Option<u32> {
    Some(DEFAULT_MAX_TOKENS)
}

impl GenerationConfig {
    /// Settings for `model` with the default token budget
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: None,
            max_tokens: default_max_tokens(),
        }
    }

    pub fn with_temperature(self, temperature: f32) -> Self {
        Self {
            temperature: Some(temperature),
            ..self
        }
    }

    /// `None` leaves the limit to the provider
    pub fn with_max_tokens(self, max_tokens: Option<u32>) -> Self {
        Self { max_tokens, ..self }
    }

    /// Checks ranges the completions API would reject anyway
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("model must not be empty".to_string());
        }
        if let Some(t) = self.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(format!("temperature must be within 0.0..=2.0, got {t}"));
            }
        }
        if self.max_tokens == Some(0) {
            return Err("max_tokens must be positive".to_string());
        }
        Ok(())
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GenerationConfig::default();
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.max_tokens, Some(8192));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert!(GenerationConfig::new("m").with_temperature(3.5).validate().is_err());
        assert!(GenerationConfig::new("m").with_max_tokens(Some(0)).validate().is_err());
        assert!(GenerationConfig::new(" ").validate().is_err());
        assert!(GenerationConfig::new("m").with_max_tokens(None).validate().is_ok());
    }

    #[test]
    fn test_deserialize_fills_token_budget() {
        let config: GenerationConfig = serde_json::from_str(r#"{"model":"gpt-4o-mini"}"#).unwrap();
        assert_eq!(config.max_tokens, Some(DEFAULT_MAX_TOKENS));
        assert_eq!(config.temperature, None);
    }
}
