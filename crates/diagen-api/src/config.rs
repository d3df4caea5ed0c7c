use std::path::Path;
use std::time::Duration;

use config::{builder::DefaultState, Config as ConfigLoader, ConfigBuilder, ConfigError, File};
use diagen_context::SessionConfig;
use diagen_persist::{AutosaveConfig, StorageBackend};
use diagen_relay::{GenerationConfig, RelayConfig};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub llm: LlmConfig,
    #[serde(default)]
    pub sessions: SessionsConfig,
    #[serde(default)]
    pub autosave: AutosaveSettings,
    #[serde(default)]
    pub storage: StorageConfig,
    pub logging: LoggingConfig,

    // Secrets (from ENV only)
    #[serde(default)]
    pub openai_api_key: String,
    #[serde(default)]
    pub mongodb_uri: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    300
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub enabled: bool,
    pub origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub model: String,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// OpenAI-compatible gateway; the public API when unset.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_llm_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_llm_timeout")]
    pub idle_timeout_secs: u64,
}

fn default_llm_timeout() -> u64 {
    60
}

impl LlmConfig {
    pub fn generation(&self) -> GenerationConfig {
        let mut generation = GenerationConfig::new(self.model.clone());
        generation.temperature = self.temperature;
        if self.max_tokens.is_some() {
            generation.max_tokens = self.max_tokens;
        }
        generation
    }

    pub fn relay_config(&self) -> RelayConfig {
        RelayConfig::default()
            .with_generation(self.generation())
            .with_request_timeout(Duration::from_secs(self.request_timeout_secs))
            .with_idle_timeout(Duration::from_secs(self.idle_timeout_secs))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionsConfig {
    pub max_messages: usize,
    pub max_sessions: usize,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        let defaults = SessionConfig::default();
        Self {
            max_messages: defaults.max_messages,
            max_sessions: defaults.max_sessions,
        }
    }
}

impl From<&SessionsConfig> for SessionConfig {
    fn from(config: &SessionsConfig) -> Self {
        Self {
            max_messages: config.max_messages,
            max_sessions: config.max_sessions,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AutosaveSettings {
    pub manual_debounce_ms: u64,
    pub generated_debounce_ms: u64,
}

impl Default for AutosaveSettings {
    fn default() -> Self {
        Self {
            manual_debounce_ms: 5_000,
            generated_debounce_ms: 2_000,
        }
    }
}

impl From<&AutosaveSettings> for AutosaveConfig {
    fn from(config: &AutosaveSettings) -> Self {
        Self {
            manual_debounce: Duration::from_millis(config.manual_debounce_ms),
            generated_debounce: Duration::from_millis(config.generated_debounce_ms),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub database: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            database: "diagen".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

/// Environment variables that override file settings.
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("SERVER_HOST", "server.host"),
    ("SERVER_PORT", "server.port"),
    ("SERVER_REQUEST_TIMEOUT_SECS", "server.request_timeout_secs"),
    ("LLM_MODEL", "llm.model"),
    ("LLM_TEMPERATURE", "llm.temperature"),
    ("LLM_MAX_TOKENS", "llm.max_tokens"),
    ("LLM_BASE_URL", "llm.base_url"),
    ("LLM_REQUEST_TIMEOUT_SECS", "llm.request_timeout_secs"),
    ("LLM_IDLE_TIMEOUT_SECS", "llm.idle_timeout_secs"),
    ("SESSIONS_MAX_MESSAGES", "sessions.max_messages"),
    ("SESSIONS_MAX_SESSIONS", "sessions.max_sessions"),
    ("AUTOSAVE_MANUAL_DEBOUNCE_MS", "autosave.manual_debounce_ms"),
    ("AUTOSAVE_GENERATED_DEBOUNCE_MS", "autosave.generated_debounce_ms"),
    ("STORAGE_BACKEND", "storage.backend"),
    ("STORAGE_DATABASE", "storage.database"),
    ("LOG_LEVEL", "logging.level"),
    ("LOG_FORMAT", "logging.format"),
];

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. Environment variables (SERVER_, LLM_, SESSIONS_, AUTOSAVE_, STORAGE_, LOG_)
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let builder = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false));
        let builder = apply_env_overrides(builder, |name| std::env::var(name).ok())?;

        let mut cfg: Config = builder.build()?.try_deserialize()?;

        // Secrets come from ENV only
        cfg.openai_api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            ConfigError::Message("OPENAI_API_KEY environment variable is required".to_string())
        })?;
        cfg.mongodb_uri = std::env::var("MONGODB_URI").ok();
        cfg.validate()?;

        Ok(cfg)
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = ConfigLoader::builder().add_source(File::from(path.as_ref()));
        builder.build()?.try_deserialize()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.llm
            .generation()
            .validate()
            .map_err(|e| ConfigError::Message(format!("llm: {e}")))?;
        if self.storage.backend == StorageBackend::Mongodb && self.mongodb_uri.is_none() {
            return Err(ConfigError::Message(
                "MONGODB_URI environment variable is required for the mongodb backend".to_string(),
            ));
        }
        if !matches!(self.logging.format.as_str(), "json" | "pretty") {
            return Err(ConfigError::Message(format!(
                "logging.format must be \"json\" or \"pretty\", got {:?}",
                self.logging.format
            )));
        }
        Ok(())
    }
}

fn apply_env_overrides(
    mut builder: ConfigBuilder<DefaultState>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    for &(var, key) in ENV_OVERRIDES {
        builder = builder.set_override_option(key, lookup(var))?;
    }
    Ok(builder)
}
