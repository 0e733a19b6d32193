use std::env;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::helpers::collect_keys;
use crate::llm::anthropic_adapter::{ANTHROPIC_BASE_URL, ANTHROPIC_DEFAULT_MODEL};
use crate::llm::openai_adapter::{OPENAI_BASE_URL, OPENAI_DEFAULT_MODEL};
use crate::tools::fact_check::FACT_CHECK_BASE_URL;
use crate::tools::news::GDELT_BASE_URL;
use crate::tools::search::TAVILY_BASE_URL;

pub const LLM_OVERRIDE_VAR: &str = "FACT_CHECK_LLM";
pub const TAVILY_KEY_VAR: &str = "TAVILY_API_KEY";
pub const FACT_CHECK_KEY_VAR: &str = "GOOGLE_FACT_CHECK_API_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable is not set")]
    MissingEnv(String),
    #[error("LLM {0} is not supported")]
    UnsupportedProvider(String),
    #[error("failed to read settings file {path}: {message}")]
    Read { path: String, message: String },
    #[error("invalid settings file {path}: {message}")]
    Parse { path: String, message: String },
    #[error("invalid setting `{field}`: {message}")]
    Invalid { field: &'static str, message: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAI,
    Anthropic,
}

impl ProviderKind {
    pub fn key_var(&self) -> &'static str {
        match self {
            Self::OpenAI => "OPENAI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAI => OPENAI_DEFAULT_MODEL,
            Self::Anthropic => ANTHROPIC_DEFAULT_MODEL,
        }
    }
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "anthropic" => Ok(Self::Anthropic),
            _ => Err(ConfigError::UnsupportedProvider(raw.to_string())),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenAI => f.write_str("openai"),
            Self::Anthropic => f.write_str("anthropic"),
        }
    }
}

/// Base URLs of every remote service, overridable for staging or tests.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub openai: String,
    pub anthropic: String,
    pub tavily: String,
    pub fact_check: String,
    pub gdelt: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            openai: OPENAI_BASE_URL.to_string(),
            anthropic: ANTHROPIC_BASE_URL.to_string(),
            tavily: TAVILY_BASE_URL.to_string(),
            fact_check: FACT_CHECK_BASE_URL.to_string(),
            gdelt: GDELT_BASE_URL.to_string(),
        }
    }
}

/// Contents of `settings.json`. Every field is optional.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub llm: String,
    pub model: Option<String>,
    pub temperature: f64,
    pub max_tokens: u32,
    pub max_turns: usize,
    pub model_retries: u32,
    pub retry_backoff_ms: u64,
    pub model_timeout_secs: u64,
    pub tool_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub search_max_results: u64,
    pub news_max_results: u64,
    pub endpoints: Endpoints,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            llm: "openai".to_string(),
            model: None,
            temperature: 0.0,
            max_tokens: 1024,
            max_turns: 10,
            model_retries: 2,
            retry_backoff_ms: 500,
            model_timeout_secs: 60,
            tool_timeout_secs: 20,
            request_timeout_secs: 180,
            search_max_results: 3,
            news_max_results: 10,
            endpoints: Endpoints::default(),
        }
    }
}

impl Settings {
    /// Reads the settings file. A missing file means defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let display = path.display().to_string();
        let raw = fs::read_to_string(path).map_err(|err| ConfigError::Read {
            path: display.clone(),
            message: err.to_string(),
        })?;
        serde_json::from_str(&raw).map_err(|err| ConfigError::Parse {
            path: display,
            message: err.to_string(),
        })
    }

    pub fn model_timeout(&self) -> Duration {
        Duration::from_secs(self.model_timeout_secs)
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_turns == 0 {
            return Err(ConfigError::Invalid {
                field: "max_turns",
                message: "must be at least 1".to_string(),
            });
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::Invalid {
                field: "temperature",
                message: format!("{} is outside 0.0..=2.0", self.temperature),
            });
        }
        for (field, secs) in [
            ("model_timeout_secs", self.model_timeout_secs),
            ("tool_timeout_secs", self.tool_timeout_secs),
            ("request_timeout_secs", self.request_timeout_secs),
        ] {
            if secs == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    message: "must be greater than zero".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Credentials, read from the process environment at startup.
#[derive(Clone)]
pub struct Secrets {
    pub provider_keys: Vec<String>,
    pub tavily_key: String,
    pub fact_check_key: String,
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secrets")
            .field("provider_keys", &format!("<{} redacted>", self.provider_keys.len()))
            .field("tavily_key", &"<redacted>")
            .field("fact_check_key", &"<redacted>")
            .finish()
    }
}

impl Secrets {
    pub fn from_lookup<F>(provider: ProviderKind, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let provider_keys = collect_keys(provider.key_var(), &lookup);
        if provider_keys.is_empty() {
            return Err(ConfigError::MissingEnv(provider.key_var().to_string()));
        }
        Ok(Self {
            provider_keys,
            tavily_key: required(TAVILY_KEY_VAR, &lookup)?,
            fact_check_key: required(FACT_CHECK_KEY_VAR, &lookup)?,
        })
    }
}

fn required<F>(var: &str, lookup: &F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(var)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ConfigError::MissingEnv(var.to_string()))
}

/// Knobs of the reasoning loop itself.
#[derive(Clone, Debug)]
pub struct AgentConfig {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub max_turns: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: OPENAI_DEFAULT_MODEL.to_string(),
            temperature: 0.0,
            max_tokens: 1024,
            max_turns: 10,
        }
    }
}

/// Everything resolved at startup: validated settings, the selected provider
/// and its credentials.
#[derive(Clone, Debug)]
pub struct Config {
    pub settings: Settings,
    pub provider: ProviderKind,
    pub secrets: Secrets,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let settings = Settings::load(path)?;
        Self::resolve(settings, |var| env::var(var).ok())
    }

    pub fn resolve<F>(mut settings: Settings, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(llm) = lookup(LLM_OVERRIDE_VAR).filter(|v| !v.trim().is_empty()) {
            settings.llm = llm;
        }
        settings.validate()?;
        let provider: ProviderKind = settings.llm.parse()?;
        let secrets = Secrets::from_lookup(provider, &lookup)?;
        Ok(Self {
            settings,
            provider,
            secrets,
        })
    }

    pub fn agent_config(&self) -> AgentConfig {
        AgentConfig {
            model: self
                .settings
                .model
                .clone()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| self.provider.default_model().to_string()),
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
            max_turns: self.settings.max_turns,
        }
    }
}
