//! TOML-based configuration for prosearch
//!
//! This module provides declarative configuration for the research loop,
//! the model provider, and logging via a TOML file (`prosearch.toml`).
//! Every field has a default, so a missing file is not an error when
//! loading through [`ProsearchConfig::load_or_default`].

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure loaded from prosearch.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProsearchConfig {
    #[serde(default)]
    pub research: ResearchConfig,

    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

// ============= Research Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchConfig {
    /// Number of search queries generated for the first round
    #[serde(default = "default_initial_queries")]
    pub number_of_initial_queries: usize,

    /// Maximum number of research/reflection rounds
    #[serde(default = "default_max_loops")]
    pub max_research_loops: usize,

    /// Model used for query writing and grounded search
    #[serde(default = "default_query_model")]
    pub query_generator_model: String,

    /// Model used for reflection and answer synthesis
    #[serde(default = "default_reasoning_model")]
    pub reasoning_model: String,
}

fn default_initial_queries() -> usize {
    3
}

fn default_max_loops() -> usize {
    2
}

fn default_query_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_reasoning_model() -> String {
    "gemini-2.5-flash".to_string()
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            number_of_initial_queries: default_initial_queries(),
            max_research_loops: default_max_loops(),
            query_generator_model: default_query_model(),
            reasoning_model: default_reasoning_model(),
        }
    }
}

// ============= Provider Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Environment variable containing the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Per-call timeout
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Automatic retries per call on transient failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_api_base() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    2
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            api_base: default_api_base(),
            request_timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

// ============= Logging Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON-formatted log lines
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ============= Errors =============

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' referenced in config is not set")]
    MissingEnvVar(String),

    #[error("Environment variable '{0}' has an invalid value: {1}")]
    InvalidEnvVar(String, String),
}

impl From<ConfigError> for crate::types::AppError {
    fn from(err: ConfigError) -> Self {
        crate::types::AppError::Configuration(err.to_string())
    }
}

impl ProsearchConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config: ProsearchConfig = toml::from_str(&content)?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration, falling back to defaults when the file is absent
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        match Self::load(path.as_ref()) {
            Err(ConfigError::FileNotFound(missing)) => {
                tracing::debug!(
                    "No configuration at {}, using defaults",
                    missing.display()
                );
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Validate numeric ranges and required names
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.research.number_of_initial_queries == 0 {
            return Err(ConfigError::ValidationError(
                "research.number_of_initial_queries must be at least 1".to_string(),
            ));
        }
        if self.research.max_research_loops == 0 {
            return Err(ConfigError::ValidationError(
                "research.max_research_loops must be at least 1".to_string(),
            ));
        }
        if self.research.query_generator_model.trim().is_empty()
            || self.research.reasoning_model.trim().is_empty()
        {
            return Err(ConfigError::ValidationError(
                "research model names must not be empty".to_string(),
            ));
        }
        if self.provider.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "provider.request_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.provider.api_key_env.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "provider.api_key_env must name an environment variable".to_string(),
            ));
        }

        Ok(())
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("NUMBER_OF_INITIAL_QUERIES") {
            self.research.number_of_initial_queries = parse_env("NUMBER_OF_INITIAL_QUERIES", &value)?;
        }
        if let Some(value) = lookup("MAX_RESEARCH_LOOPS") {
            self.research.max_research_loops = parse_env("MAX_RESEARCH_LOOPS", &value)?;
        }
        if let Some(value) = lookup("QUERY_GENERATOR_MODEL") {
            self.research.query_generator_model = value;
        }
        if let Some(value) = lookup("REASONING_MODEL") {
            self.research.reasoning_model = value;
        }

        self.validate()
    }

    /// Get the provider API key from the environment
    pub fn api_key(&self) -> Result<String, ConfigError> {
        std::env::var(&self.provider.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(self.provider.api_key_env.clone()))
    }
}

fn parse_env(name: &str, value: &str) -> Result<usize, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnvVar(name.to_string(), value.to_string()))
}
