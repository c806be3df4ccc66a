use thiserror::Error;

/// Top-level error type for UrlGenie.
///
/// Subsystem crates define their own error types and implement
/// `From<SubsystemError> for UrlGenieError` so that `?` works across crate
/// boundaries in the binary.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum UrlGenieError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Chat error: {0}")]
    Chat(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Voice error: {0}")]
    Voice(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for UrlGenieError {
    fn from(err: toml::de::Error) -> Self {
        UrlGenieError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for UrlGenieError {
    fn from(err: toml::ser::Error) -> Self {
        UrlGenieError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for UrlGenieError {
    fn from(err: serde_json::Error) -> Self {
        UrlGenieError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for UrlGenie operations.
pub type Result<T> = std::result::Result<T, UrlGenieError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_all_variants() {
        let cases: Vec<(UrlGenieError, &str)> = vec![
            (
                UrlGenieError::Config("bad key".to_string()),
                "Configuration error: bad key",
            ),
            (
                UrlGenieError::Chat("session poisoned".to_string()),
                "Chat error: session poisoned",
            ),
            (
                UrlGenieError::Model("status 500".to_string()),
                "Model error: status 500",
            ),
            (
                UrlGenieError::Voice("no microphone".to_string()),
                "Voice error: no microphone",
            ),
            (
                UrlGenieError::Api("bind failed".to_string()),
                "API error: bind failed",
            ),
            (
                UrlGenieError::Serialization("invalid json".to_string()),
                "Serialization error: invalid json",
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.to_string(), expected);
        }
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: UrlGenieError = io_err.into();
        assert!(matches!(err, UrlGenieError::Io(_)));
        assert!(err.to_string().starts_with("I/O error:"));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_error_from_toml_de() {
        let err: std::result::Result<toml::Value, _> = toml::from_str("invalid = [[[");
        let err: UrlGenieError = err.unwrap_err().into();
        assert!(matches!(err, UrlGenieError::Config(_)));
    }

    #[test]
    fn test_error_from_serde_json() {
        let err: std::result::Result<serde_json::Value, _> = serde_json::from_str("{ nope }");
        let err: UrlGenieError = err.unwrap_err().into();
        assert!(matches!(err, UrlGenieError::Serialization(_)));
    }

    #[test]
    fn test_result_type_with_question_mark() {
        fn inner() -> Result<String> {
            let io_result: std::result::Result<i32, std::io::Error> = Ok(42);
            let value = io_result?;
            Ok(value.to_string())
        }

        assert_eq!(inner().unwrap(), "42");
    }
}
