//! HTTP client for the weather agent endpoint.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tracing::{debug, trace, warn};

use weather_chat_core::config::{AgentSettings, Config};
use weather_chat_core::error::{ChatError, Result};

use crate::assemble::{AssembledResponse, assemble_body};
use crate::{AgentRequest, PLAYGROUND_HEADER, WeatherAgent};

pub struct AgentClient {
    settings: AgentSettings,
    client: reqwest::Client,
    in_flight: AtomicBool,
}

impl AgentClient {
    pub fn new(settings: AgentSettings) -> Self {
        Self {
            settings,
            client: reqwest::Client::new(),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Resolve settings from config, failing before any network call when
    /// the endpoint or thread id is missing.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(config.agent_settings()?))
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    /// Whether a request is currently outstanding on this client.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    async fn request(&self, text: &str) -> Result<String> {
        let body = AgentRequest::user_message(&self.settings, text);

        debug!(
            endpoint = %self.settings.endpoint,
            thread_id = %self.settings.thread_id,
            "Sending message to weather agent"
        );

        let response = self
            .client
            .post(self.settings.endpoint.clone())
            .header(PLAYGROUND_HEADER, "true")
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "Weather agent returned an error status");
            return Err(ChatError::HttpStatus {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let raw = response.text().await?;
        trace!(raw = %raw, "Raw agent response");

        let assembled = assemble_body(&raw);
        if let AssembledResponse::Failure(f) = &assembled {
            warn!(
                tokens = f.token_count,
                tool_results = f.tool_result_count,
                raw = %raw,
                "No usable content in agent response"
            );
        }
        assembled.into_result()
    }
}

#[async_trait]
impl WeatherAgent for AgentClient {
    async fn send_message(&self, text: &str) -> Result<String> {
        let _guard = InFlightGuard::acquire(&self.in_flight)?;
        self.request(text).await
    }
}

/// Clears the in-flight flag when the request finishes or its future is dropped.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ChatError::Busy)?;
        Ok(Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weather_chat_core::config::AgentConfig;

    fn settings() -> AgentSettings {
        AgentSettings::new("http://127.0.0.1:9/api/agents/weatherAgent/stream", "thread-1").unwrap()
    }

    #[test]
    fn test_guard_rejects_second_acquire() {
        let flag = AtomicBool::new(false);
        let first = InFlightGuard::acquire(&flag).unwrap();
        assert!(matches!(InFlightGuard::acquire(&flag), Err(ChatError::Busy)));
        drop(first);
        assert!(InFlightGuard::acquire(&flag).is_ok());
    }

    #[test]
    fn test_client_starts_idle() {
        let client = AgentClient::new(settings());
        assert!(!client.is_busy());
        assert_eq!(client.settings().thread_id, "thread-1");
    }

    #[test]
    fn test_from_config_requires_settings() {
        let config = Config {
            agent: Some(AgentConfig {
                api_url: Some("https://agent.example.com".into()),
                api_url_env: None,
                thread_id: None,
                thread_id_env: Some("WC_CLIENT_TEST_UNSET".into()),
                run_id: None,
                resource_id: None,
            }),
            ..Config::default()
        };
        assert!(matches!(
            AgentClient::from_config(&config),
            Err(ChatError::Config(_))
        ));
    }
}
