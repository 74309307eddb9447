//! Configuration loading and validation.

use std::path::{Path, PathBuf};

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::{ChatError, Result};

/// Env var consulted for the agent endpoint when `agent.api_url` is unset.
pub const DEFAULT_API_URL_ENV: &str = "WEATHER_CHAT_API_URL";
/// Env var consulted for the thread id when `agent.thread_id` is unset.
pub const DEFAULT_THREAD_ID_ENV: &str = "WEATHER_CHAT_THREAD_ID";
/// Agent name used as both run id and resource id unless overridden.
pub const DEFAULT_AGENT_ID: &str = "weatherAgent";

/// Top-level Weather Chat configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<AgentConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

/// Where the weather agent lives and which conversation thread to use.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url_env: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id_env: Option<String>,

    /// Overrides `runId` in the request body (default: "weatherAgent").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,

    /// Overrides `resourceId` in the request body (default: "weatherAgent").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
}

impl AgentConfig {
    /// Resolve the endpoint: `api_url` first, then the env var it names
    /// (or `WEATHER_CHAT_API_URL`).
    pub fn resolve_api_url(&self) -> Option<String> {
        resolve_secret_field(
            &self.api_url,
            &Some(
                self.api_url_env
                    .clone()
                    .unwrap_or_else(|| DEFAULT_API_URL_ENV.to_string()),
            ),
        )
    }

    /// Resolve the thread id: `thread_id` first, then the env var it names
    /// (or `WEATHER_CHAT_THREAD_ID`).
    pub fn resolve_thread_id(&self) -> Option<String> {
        resolve_secret_field(
            &self.thread_id,
            &Some(
                self.thread_id_env
                    .clone()
                    .unwrap_or_else(|| DEFAULT_THREAD_ID_ENV.to_string()),
            ),
        )
    }
}

/// Fully resolved settings the agent client needs. Read-only once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentSettings {
    pub endpoint: Url,
    pub thread_id: String,
    pub run_id: String,
    pub resource_id: String,
}

impl AgentSettings {
    /// Build settings from raw values, rejecting blanks and unparseable URLs.
    pub fn new(endpoint: &str, thread_id: &str) -> Result<Self> {
        let endpoint = endpoint.trim();
        if endpoint.is_empty() {
            return Err(ChatError::Config("API URL is not set".into()));
        }
        let thread_id = thread_id.trim();
        if thread_id.is_empty() {
            return Err(ChatError::Config("thread id is not set".into()));
        }
        let endpoint = Url::parse(endpoint)
            .map_err(|e| ChatError::Config(format!("invalid API URL '{endpoint}': {e}")))?;
        Ok(Self {
            endpoint,
            thread_id: thread_id.to_string(),
            run_id: DEFAULT_AGENT_ID.to_string(),
            resource_id: DEFAULT_AGENT_ID.to_string(),
        })
    }

    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = run_id.into();
        self
    }

    pub fn with_resource_id(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = resource_id.into();
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log format: "plain" (default) or "json".
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Log level override (trace/debug/info/warn/error).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    /// Per-crate log level overrides (e.g. "weather_chat_agent=trace").
    #[serde(default)]
    pub filters: Vec<String>,

    /// Output target: "stderr" (default) or "stdout".
    #[serde(default = "default_log_output")]
    pub output: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: default_log_format(),
            level: None,
            filters: Vec::new(),
            output: default_log_output(),
        }
    }
}

fn default_log_format() -> String {
    "plain".into()
}

fn default_log_output() -> String {
    "stderr".into()
}

/// Resolve a setting: check the direct value first, then the env-var reference.
pub fn resolve_secret_field(direct: &Option<String>, env_var: &Option<String>) -> Option<String> {
    if let Some(val) = direct {
        if !val.is_empty() {
            return Some(val.clone());
        }
    }
    if let Some(env) = env_var {
        if let Ok(val) = std::env::var(env) {
            if !val.is_empty() {
                return Some(val);
            }
        }
    }
    None
}

/// Substitute `${ENV_VAR}` patterns in a string with their environment variable values.
fn substitute_env_vars(input: &str) -> String {
    let re = match regex::Regex::new(r"\$\{([^}]+)\}") {
        Ok(re) => re,
        Err(_) => return input.to_string(),
    };
    re.replace_all(input, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_default()
    })
    .into_owned()
}

impl Config {
    /// Load config from a JSON5 file, substituting `${ENV_VAR}` references.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)?;

        // Substitute ${ENV_VAR} references before parsing
        let substituted = substitute_env_vars(&raw);

        let config: Config =
            json5::from_str(&substituted).map_err(|e| ChatError::Config(e.to_string()))?;

        Ok(config)
    }

    /// Default config file path.
    pub fn config_path() -> PathBuf {
        data_dir().join("config.json")
    }

    /// Resolve and validate the settings the agent client needs.
    ///
    /// Fails with [`ChatError::Config`] when the endpoint or thread id is missing.
    pub fn agent_settings(&self) -> Result<AgentSettings> {
        let agent = self.agent.clone().unwrap_or_default();

        let endpoint = agent.resolve_api_url().ok_or_else(|| {
            ChatError::Config(format!(
                "API URL is not set (agent.api_url or ${})",
                agent.api_url_env.as_deref().unwrap_or(DEFAULT_API_URL_ENV)
            ))
        })?;
        let thread_id = agent.resolve_thread_id().ok_or_else(|| {
            ChatError::Config(format!(
                "thread id is not set (agent.thread_id or ${})",
                agent.thread_id_env.as_deref().unwrap_or(DEFAULT_THREAD_ID_ENV)
            ))
        })?;

        let mut settings = AgentSettings::new(&endpoint, &thread_id)?;
        if let Some(run_id) = agent.run_id.filter(|r| !r.is_empty()) {
            settings = settings.with_run_id(run_id);
        }
        if let Some(resource_id) = agent.resource_id.filter(|r| !r.is_empty()) {
            settings = settings.with_resource_id(resource_id);
        }
        Ok(settings)
    }

    /// Logging settings, falling back to defaults.
    pub fn logging(&self) -> LoggingConfig {
        self.logging.clone().unwrap_or_default()
    }

    /// Validate config, returning (warnings, errors).
    pub fn validate(&self) -> (Vec<String>, Vec<String>) {
        let mut warnings = Vec::new();
        let mut errors = Vec::new();

        if let Err(e) = self.agent_settings() {
            errors.push(e.to_string());
        }

        if let Some(url) = self
            .agent
            .as_ref()
            .and_then(|a| a.resolve_api_url())
            .and_then(|u| Url::parse(&u).ok())
        {
            if url.scheme() == "http" && url.host_str().is_some_and(|h| h != "localhost" && h != "127.0.0.1") {
                warnings.push(format!("API URL '{url}' is not using https"));
            }
        }

        let logging = self.logging();
        if logging.format != "plain" && logging.format != "json" {
            warnings.push(format!(
                "Unknown log format '{}', falling back to plain",
                logging.format
            ));
        }
        if logging.output != "stderr" && logging.output != "stdout" {
            warnings.push(format!(
                "Unknown log output '{}', falling back to stderr",
                logging.output
            ));
        }

        (warnings, errors)
    }
}

/// Base directory for Weather Chat data: `~/.weather_chat/`
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".weather_chat")
}
