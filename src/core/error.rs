use std::io;
use thiserror::Error;

/// Unified error type for the SmartCloud agent
#[derive(Error, Debug)]
pub enum SmartCloudError {
    /// API-related errors (Groq, OpenAI, Anthropic, etc.)
    #[error("API error: {0}")]
    Api(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// User input errors
    #[error("Input error: {0}")]
    Input(String),

    /// Command execution errors
    #[error("Execution error: {0}")]
    Execution(String),

    /// IO-related errors
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Network-related errors
    #[error("Network error: {0}")]
    Network(String),

    /// Inference request exceeded the configured deadline
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Conversation store errors
    #[error("Store error: {0}")]
    Store(String),

    /// Metrics sampling errors
    #[error("Metrics error: {0}")]
    Metrics(String),
}

impl From<reqwest::Error> for SmartCloudError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SmartCloudError::Timeout(format!("Request timed out: {}", err))
        } else if err.is_connect() {
            SmartCloudError::Network(format!("Connection failed: {}", err))
        } else if err.is_status() {
            SmartCloudError::Api(format!("API returned error status: {}", err))
        } else {
            SmartCloudError::Network(format!("Request failed: {}", err))
        }
    }
}

impl From<serde_json::Error> for SmartCloudError {
    fn from(err: serde_json::Error) -> Self {
        SmartCloudError::Serialization(format!("JSON error: {}", err))
    }
}

impl From<serde_yml::Error> for SmartCloudError {
    fn from(err: serde_yml::Error) -> Self {
        SmartCloudError::Serialization(format!("YAML error: {}", err))
    }
}

impl From<rusqlite::Error> for SmartCloudError {
    fn from(err: rusqlite::Error) -> Self {
        SmartCloudError::Store(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_convert_with_source() {
        let err: SmartCloudError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, SmartCloudError::Io { .. }));
        assert_eq!(err.to_string(), "IO error: gone");
    }

    #[test]
    fn sqlite_errors_become_store_errors() {
        let err: SmartCloudError = rusqlite::Error::InvalidQuery.into();
        assert!(matches!(err, SmartCloudError::Store(_)));
    }

    #[test]
    fn conversions_keep_their_category() {
        let json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: SmartCloudError = json.into();
        assert!(matches!(err, SmartCloudError::Serialization(_)));
        assert!(err.to_string().starts_with("Serialization error: JSON error:"));
    }
}
