//! Terminal chat surface: conversation history for one session.
//!
//! `submit` takes `&mut self`, so a surface can never have two requests
//! outstanding; the agent client enforces the same rule for shared clients.

use tracing::debug;

use weather_chat_agent::WeatherAgent;
use weather_chat_core::types::ChatEntry;

/// Longest message the surface will send, in characters.
pub const MAX_INPUT_CHARS: usize = 200;

/// Suggestions offered before the first message.
pub const QUICK_QUESTIONS: [&str; 4] = [
    "What's the weather in New York?",
    "Current temperature in London",
    "Weather forecast for Tokyo",
    "Is it raining in Paris?",
];

pub struct ChatSurface<A> {
    agent: A,
    entries: Vec<ChatEntry>,
}

impl<A: WeatherAgent> ChatSurface<A> {
    pub fn new(agent: A) -> Self {
        Self {
            agent,
            entries: Vec::new(),
        }
    }

    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    /// Quick questions are only offered on an empty conversation.
    pub fn show_suggestions(&self) -> bool {
        self.entries.is_empty()
    }

    /// Send one user message and record the reply or the error.
    ///
    /// Input is trimmed and capped at [`MAX_INPUT_CHARS`]. Blank input is
    /// ignored and returns `None`; otherwise returns the entry appended for
    /// the outcome.
    pub async fn submit(&mut self, input: &str) -> Option<&ChatEntry> {
        let text = prepare_input(input)?;

        self.entries.push(ChatEntry::user(text.clone()));
        let outcome = self.agent.send_message(&text).await;

        let entry = match outcome {
            Ok(reply) => ChatEntry::agent(reply),
            Err(e) => {
                debug!(%e, "Agent request failed");
                ChatEntry::error(e.to_string())
            }
        };
        self.entries.push(entry);
        self.entries.last()
    }
}

/// Trim and cap user input; `None` when nothing is left to send.
pub fn prepare_input(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(MAX_INPUT_CHARS).collect())
}

/// One display line per entry, e.g. `[14:05] Agent: Sunny.`
pub fn render_entry(entry: &ChatEntry) -> String {
    let time = entry
        .timestamp
        .with_timezone(&chrono::Local)
        .format("%H:%M");
    format!("[{time}] {}: {}", entry.role.label(), entry.text)
}
