//! Weather agent client.
//!
//! [`client::AgentClient`] posts a user message to the agent endpoint, reads
//! the prefix-tagged data stream it answers with, and reduces it to a single
//! reply string via [`data_stream`] and [`assemble`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use weather_chat_core::config::AgentSettings;
use weather_chat_core::error::Result;

pub mod assemble;
pub mod client;
pub mod data_stream;

/// Upper bound on agent-side retries. A server hint only; the client never retries.
pub const MAX_RETRIES: u32 = 2;
/// Upper bound on agent steps (tool calls + generations), also a server hint.
pub const MAX_STEPS: u32 = 5;
pub const TEMPERATURE: f64 = 0.5;
pub const TOP_P: f64 = 1.0;

/// Header that puts the agent server into playground mode.
pub const PLAYGROUND_HEADER: &str = "x-mastra-dev-playground";

/// One conversation entry in the request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestMessage {
    pub role: String,
    pub content: String,
}

/// JSON body posted to the agent endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRequest {
    pub messages: Vec<RequestMessage>,
    pub run_id: String,
    pub max_retries: u32,
    pub max_steps: u32,
    pub temperature: f64,
    pub top_p: f64,
    pub runtime_context: serde_json::Map<String, serde_json::Value>,
    pub thread_id: String,
    pub resource_id: String,
}

impl AgentRequest {
    /// Single-message request for the configured thread.
    pub fn user_message(settings: &AgentSettings, text: &str) -> Self {
        Self {
            messages: vec![RequestMessage {
                role: "user".into(),
                content: text.to_string(),
            }],
            run_id: settings.run_id.clone(),
            max_retries: MAX_RETRIES,
            max_steps: MAX_STEPS,
            temperature: TEMPERATURE,
            top_p: TOP_P,
            runtime_context: serde_json::Map::new(),
            thread_id: settings.thread_id.clone(),
            resource_id: settings.resource_id.clone(),
        }
    }
}

/// Something that can answer a chat message.
#[async_trait]
pub trait WeatherAgent: Send + Sync {
    /// Send one user message and wait for the complete reply.
    async fn send_message(&self, text: &str) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_format() {
        let settings = AgentSettings::new("https://agent.example.com/stream", "thread-42").unwrap();
        let request = AgentRequest::user_message(&settings, "Weather in Paris?");
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "Weather in Paris?");
        assert_eq!(json["messages"].as_array().unwrap().len(), 1);
        assert_eq!(json["runId"], "weatherAgent");
        assert_eq!(json["maxRetries"], 2);
        assert_eq!(json["maxSteps"], 5);
        assert_eq!(json["temperature"].as_f64(), Some(0.5));
        assert_eq!(json["topP"].as_f64(), Some(1.0));
        assert!(json["runtimeContext"].as_object().unwrap().is_empty());
        assert_eq!(json["threadId"], "thread-42");
        assert_eq!(json["resourceId"], "weatherAgent");
    }
}
