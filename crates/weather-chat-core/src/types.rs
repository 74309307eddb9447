use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who produced a chat history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Agent,
    Error,
}

impl ChatRole {
    /// Label shown in front of the entry text.
    pub fn label(&self) -> &'static str {
        match self {
            ChatRole::User => "You",
            ChatRole::Agent => "Agent",
            ChatRole::Error => "Error",
        }
    }
}

/// One line of the conversation as displayed by the chat surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatEntry {
    pub id: Uuid,
    pub role: ChatRole,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatEntry {
    pub fn new(role: ChatRole, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(ChatRole::User, text)
    }

    pub fn agent(text: impl Into<String>) -> Self {
        Self::new(ChatRole::Agent, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(ChatRole::Error, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_snake_case() {
        let json = serde_json::to_string(&ChatRole::Agent).unwrap();
        assert_eq!(json, "\"agent\"");
    }

    #[test]
    fn test_entries_get_distinct_ids() {
        let a = ChatEntry::user("hi");
        let b = ChatEntry::user("hi");
        assert_ne!(a.id, b.id);
        assert_eq!(a.role, ChatRole::User);
        assert_eq!(a.role.label(), "You");
    }
}
