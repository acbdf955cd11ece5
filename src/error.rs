//! Error types for olloquy
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for olloquy operations
///
/// This enum encompasses all possible errors that can occur during
/// configuration loading, conversation management, attachment ingestion,
/// and streaming calls to the model backend.
#[derive(Error, Debug)]
pub enum OlloquyError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Model backend errors (connection failures, non-success responses)
    #[error("Backend error: {0}")]
    Backend(String),

    /// Stream dropped, timed out, or ended before the completion marker
    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    /// Attachment could not be read or stored
    #[error("Ingest error: {0}")]
    Ingest(String),

    /// Operation referenced a conversation id that was never created
    #[error("Conversation not found: {0}")]
    ConversationNotFound(String),

    /// Operation required an active conversation but none was selected
    #[error("No active conversation")]
    NoActiveConversation,

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for olloquy operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let error = OlloquyError::Config("invalid format".to_string());
        assert_eq!(error.to_string(), "Configuration error: invalid format");
    }

    #[test]
    fn test_backend_error_display() {
        let error = OlloquyError::Backend("connection refused".to_string());
        assert_eq!(error.to_string(), "Backend error: connection refused");
    }

    #[test]
    fn test_stream_interrupted_display() {
        let error = OlloquyError::StreamInterrupted("connection reset".to_string());
        assert_eq!(error.to_string(), "Stream interrupted: connection reset");
    }

    #[test]
    fn test_ingest_error_display() {
        let error = OlloquyError::Ingest("permission denied".to_string());
        assert_eq!(error.to_string(), "Ingest error: permission denied");
    }

    #[test]
    fn test_conversation_not_found_display() {
        let error = OlloquyError::ConversationNotFound("2024-01-01 00:00:00".to_string());
        assert_eq!(
            error.to_string(),
            "Conversation not found: 2024-01-01 00:00:00"
        );
    }

    #[test]
    fn test_no_active_conversation_display() {
        let error = OlloquyError::NoActiveConversation;
        assert_eq!(error.to_string(), "No active conversation");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: OlloquyError = io_error.into();
        assert!(matches!(error, OlloquyError::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_str = "{invalid json}";
        let json_error = serde_json::from_str::<serde_json::Value>(json_str).unwrap_err();
        let error: OlloquyError = json_error.into();
        assert!(matches!(error, OlloquyError::Serialization(_)));
    }

    #[test]
    fn test_yaml_error_conversion() {
        let yaml_str = "invalid: : yaml";
        let yaml_error = serde_yaml::from_str::<serde_yaml::Value>(yaml_str).unwrap_err();
        let error: OlloquyError = yaml_error.into();
        assert!(matches!(error, OlloquyError::Yaml(_)));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<OlloquyError>();
    }
}
