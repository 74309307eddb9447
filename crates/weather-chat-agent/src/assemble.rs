//! Reduces decoded records into the reply shown to the user.

use serde_json::Value;
use tracing::debug;

use weather_chat_core::error::ChatError;

use crate::data_stream::{DecodedRecord, body_lines, decode_line};

/// Not enough usable content in an otherwise well-formed response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeFailure {
    pub token_count: usize,
    pub tool_result_count: usize,
}

impl From<DecodeFailure> for ChatError {
    fn from(f: DecodeFailure) -> Self {
        ChatError::Decode {
            token_count: f.token_count,
            tool_result_count: f.tool_result_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssembledResponse {
    Text(String),
    Failure(DecodeFailure),
}

impl AssembledResponse {
    pub fn into_result(self) -> Result<String, ChatError> {
        match self {
            AssembledResponse::Text(text) => Ok(text),
            AssembledResponse::Failure(f) => Err(f.into()),
        }
    }
}

/// Collects text tokens and tool results in document order.
#[derive(Debug, Default)]
pub struct ResponseAssembler {
    tokens: Vec<String>,
    tool_results: Vec<Value>,
}

impl ResponseAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: DecodedRecord) {
        match record {
            DecodedRecord::TextToken { text } => self.tokens.push(text),
            DecodedRecord::ToolResult { result } => self.tool_results.push(result),
            DecodedRecord::Metadata { .. } | DecodedRecord::Unparseable { .. } => {}
        }
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    pub fn tool_result_count(&self) -> usize {
        self.tool_results.len()
    }

    /// Produce the final reply.
    ///
    /// Text tokens win and are concatenated as-is. Without any, the last tool
    /// result is rendered as a weather sentence if it carries a numeric
    /// `temperature`.
    pub fn finish(self) -> AssembledResponse {
        debug!(
            tokens = self.tokens.len(),
            tool_results = self.tool_results.len(),
            "Assembling response"
        );

        if !self.tokens.is_empty() {
            return AssembledResponse::Text(self.tokens.concat());
        }

        if let Some(sentence) = self.tool_results.last().and_then(format_weather) {
            return AssembledResponse::Text(sentence);
        }

        AssembledResponse::Failure(DecodeFailure {
            token_count: self.tokens.len(),
            tool_result_count: self.tool_results.len(),
        })
    }
}

/// Decode a whole response body into the reply.
pub fn assemble_body(body: &str) -> AssembledResponse {
    let mut assembler = ResponseAssembler::new();
    for record in body_lines(body).filter_map(decode_line) {
        assembler.push(record);
    }
    assembler.finish()
}

/// Render a weather tool result, or `None` when it has no numeric temperature.
pub fn format_weather(result: &Value) -> Option<String> {
    let temperature = result.get("temperature").filter(|t| t.is_number())?;

    let location = present(result.get("location")).unwrap_or_else(|| "the requested location".into());
    let conditions = present(result.get("conditions")).unwrap_or_else(|| "unknown conditions".into());
    let field = |name: &str| present(result.get(name)).unwrap_or_else(|| "unknown".into());

    Some(format!(
        "The current weather in {location} is {conditions} with a temperature of {}°C (feels like {}°C). Humidity is {}% and wind speed is {} km/h.",
        display_value(temperature),
        field("feelsLike"),
        field("humidity"),
        field("windSpeed"),
    ))
}

/// Display form of a field, treating null and empty strings as absent.
fn present(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        other => Some(display_value(other)),
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            // 20.0 reads as "20" like the agent's own rendering
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => format!("{f:.0}"),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}
