//! Error types for the multi-agent assistant

use thiserror::Error;

/// Result type alias for assistant operations
pub type Result<T> = std::result::Result<T, AssistantError>;

/// Fixed message shown whenever the chat-completion key is absent.
pub const MISSING_KEY_MESSAGE: &str =
    "Error: GROQ_API_KEY not found. Please add it to your .env file.";

#[derive(Error, Debug)]
pub enum AssistantError {

    // =============================
    // Chat Completion Errors
    // =============================

    #[error("GROQ_API_KEY not configured")]
    MissingCredential,

    #[error("authentication rejected: {0}")]
    LlmAuth(String),

    #[error("rate limit reached: {0}")]
    LlmRateLimited(String),

    #[error("network failure: {0}")]
    LlmNetwork(String),

    #[error("upstream returned {status}: {body}")]
    LlmUpstream { status: u16, body: String },

    #[error("malformed response: {0}")]
    LlmMalformed(String),

    // =============================
    // Integration Errors
    // =============================

    #[error("Market data error: {0}")]
    MarketData(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),
}

impl AssistantError {
    /// Text shown to the user in place of a model answer.
    pub fn user_message(&self) -> String {
        match self {
            AssistantError::MissingCredential => MISSING_KEY_MESSAGE.to_string(),
            AssistantError::LlmAuth(_) => format!(
                "Error calling Groq API: {}. Check that GROQ_API_KEY is valid.",
                self
            ),
            AssistantError::LlmRateLimited(_) => format!(
                "Error calling Groq API: {}. Please wait a moment and try again.",
                self
            ),
            _ => format!("Error calling Groq API: {}", self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credential_message_is_fixed() {
        assert_eq!(
            AssistantError::MissingCredential.user_message(),
            MISSING_KEY_MESSAGE
        );
    }

    #[test]
    fn test_messages_distinguish_causes() {
        let auth = AssistantError::LlmAuth("invalid key".into()).user_message();
        let limited = AssistantError::LlmRateLimited("slow down".into()).user_message();
        let upstream = AssistantError::LlmUpstream {
            status: 502,
            body: "bad gateway".into(),
        }
        .user_message();

        assert!(auth.starts_with("Error calling Groq API: authentication rejected"));
        assert!(limited.contains("rate limit reached"));
        assert!(upstream.contains("502"));
        assert_ne!(auth, limited);
    }
}
