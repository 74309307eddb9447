use thiserror::Error;

/// Every failure a chat turn can surface to the user.
///
/// The `Display` output is the message shown in the chat history, so callers
/// can match on the variant for handling and print it for the user.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Weather service is not properly configured: {0}")]
    Config(String),

    #[error("API request failed with status {status}: {status_text}")]
    HttpStatus { status: u16, status_text: String },

    #[error("Unable to connect to the weather service. Please check your internet connection. ({0})")]
    Connectivity(String),

    #[error(
        "No valid response received from the API. Found {token_count} tokens and {tool_result_count} tool results."
    )]
    Decode {
        token_count: usize,
        tool_result_count: usize,
    },

    #[error("A request is already in progress. Please wait for the current reply.")]
    Busy,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for ChatError {
    fn from(e: reqwest::Error) -> Self {
        // Anything reqwest reports before a status line arrives is a transport
        // problem; status errors are built explicitly by the client.
        ChatError::Connectivity(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ChatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_message() {
        let err = ChatError::HttpStatus {
            status: 503,
            status_text: "Service Unavailable".into(),
        };
        assert_eq!(
            err.to_string(),
            "API request failed with status 503: Service Unavailable"
        );
    }

    #[test]
    fn test_decode_message_reports_counts() {
        let err = ChatError::Decode {
            token_count: 0,
            tool_result_count: 1,
        };
        let msg = err.to_string();
        assert!(msg.contains("Found 0 tokens and 1 tool results"), "got: {msg}");
    }

    #[test]
    fn test_config_message() {
        let err = ChatError::Config("api_url is not set".into());
        assert!(err.to_string().starts_with("Weather service is not properly configured"));
    }
}
