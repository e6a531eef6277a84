use std::io;

use thiserror::Error;

/// Library-wide error type for fmtmod operations.
#[derive(Debug, Error)]
pub enum AppError {
    /// Underlying I/O failure.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Configuration or environment issue on the host side.
    #[error("{0}")]
    Configuration(String),

    /// The user supplied a value that can never work (bad version, bad URL, missing class).
    #[error("{0}")]
    InvalidUserArgument(String),

    /// Declared coordinates could not be fetched. May succeed on a later attempt.
    #[error("Failed to resolve '{coordinate}': {details}")]
    ResolutionFailure { coordinate: String, details: String },

    /// A referenced input (such as a preferences file) does not exist.
    #[error("{0}")]
    IllegalArgument(String),

    /// Parse error.
    #[error("Failed to parse {what}: {details}")]
    ParseError { what: String, details: String },

    /// The engine rejected a specific input.
    #[error("Step '{step}' failed to format input: {diagnostic}")]
    FormattingFailure { step: String, input: String, diagnostic: String },

    /// The host cancelled an in-flight resolution.
    #[error("Resolution interrupted by host")]
    Interrupted,

    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),
}

impl AppError {
    pub fn config_error<S: Into<String>>(message: S) -> Self {
        AppError::Configuration(message.into())
    }

    pub fn invalid_argument<S: Into<String>>(message: S) -> Self {
        AppError::InvalidUserArgument(message.into())
    }

    pub fn resolution_failure(coordinate: impl Into<String>, details: impl Into<String>) -> Self {
        AppError::ResolutionFailure { coordinate: coordinate.into(), details: details.into() }
    }

    /// Whether the failure may clear up without any change to the configuration.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::ResolutionFailure { .. } | AppError::Interrupted)
    }

    /// Provide an `io::ErrorKind`-like view for callers expecting legacy behavior.
    pub fn kind(&self) -> io::ErrorKind {
        match self {
            AppError::Io(err) => err.kind(),
            AppError::Configuration(_)
            | AppError::InvalidUserArgument(_)
            | AppError::ParseError { .. }
            | AppError::TomlParseError(_) => io::ErrorKind::InvalidInput,
            AppError::IllegalArgument(_) => io::ErrorKind::NotFound,
            AppError::FormattingFailure { .. } => io::ErrorKind::InvalidData,
            AppError::ResolutionFailure { .. } => io::ErrorKind::Other,
            AppError::Interrupted => io::ErrorKind::Interrupted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_only_for_infrastructure_failures() {
        assert!(AppError::resolution_failure("a:b:1", "timed out").is_retryable());
        assert!(AppError::Interrupted.is_retryable());
        assert!(!AppError::invalid_argument("bad version").is_retryable());
        assert!(!AppError::IllegalArgument("missing".into()).is_retryable());
    }

    #[test]
    fn kind_maps_user_errors_to_invalid_input() {
        assert_eq!(AppError::invalid_argument("x").kind(), io::ErrorKind::InvalidInput);
        assert_eq!(AppError::IllegalArgument("x".into()).kind(), io::ErrorKind::NotFound);
        assert_eq!(AppError::Interrupted.kind(), io::ErrorKind::Interrupted);
    }

    #[test]
    fn resolution_failure_message_names_coordinate() {
        let err = AppError::resolution_failure("com.example:lib:1.0.0", "connection refused");
        assert_eq!(
            err.to_string(),
            "Failed to resolve 'com.example:lib:1.0.0': connection refused"
        );
    }
}
