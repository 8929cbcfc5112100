use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlashgenError {
    #[error("Completion request failed: {0}")]
    UpstreamTransport(#[from] reqwest::Error),

    #[error("Completion service returned status {status}: {message}")]
    UpstreamStatus { status: u16, message: String },

    #[error("Completion service returned an empty body")]
    UpstreamEmptyBody,

    #[error("Completion response could not be decoded: {message}")]
    UpstreamDecode { message: String },

    #[error("Completion service rejected the request: {message}")]
    UpstreamRejected { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Storage object not found: {path}")]
    StorageNotFound { path: String },

    #[error("Storage error: {message}")]
    StorageError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Flashcard collection '{name}' already exists")]
    CollectionExists { name: String },

    #[error("Flashcard collection '{name}' not found")]
    CollectionNotFound { name: String },

    #[error("Collection limit reached for {plan} plan ({limit} collections)")]
    QuotaExceeded { plan: String, limit: usize },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Upstream,
    Storage,
    Configuration,
    Collection,
    Validation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// Process exit code for a command that failed with this severity.
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Medium => 2, // 上游錯誤，可重試
            Self::High => 1,
            Self::Critical => 3,
        }
    }
}

impl FlashgenError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UpstreamTransport(_)
            | Self::UpstreamStatus { .. }
            | Self::UpstreamEmptyBody
            | Self::UpstreamDecode { .. }
            | Self::UpstreamRejected { .. } => ErrorCategory::Upstream,
            Self::IoError(_)
            | Self::SerializationError(_)
            | Self::StorageNotFound { .. }
            | Self::StorageError { .. } => ErrorCategory::Storage,
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Configuration,
            Self::CollectionExists { .. }
            | Self::CollectionNotFound { .. }
            | Self::QuotaExceeded { .. } => ErrorCategory::Collection,
            Self::ValidationError { .. } => ErrorCategory::Validation,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 上游服務不穩定，重試通常可以解決
            ErrorCategory::Upstream => ErrorSeverity::Medium,
            ErrorCategory::Collection | ErrorCategory::Validation => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    /// Completion service failures, as opposed to degraded model output which is never an error.
    pub fn is_upstream(&self) -> bool {
        self.category() == ErrorCategory::Upstream
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            Self::UpstreamTransport(_) => {
                "Check network connectivity and the completion endpoint, then try again".to_string()
            }
            Self::UpstreamStatus { status: 401, .. } | Self::UpstreamStatus { status: 403, .. } => {
                "Check that OPENROUTER_API_KEY (or completion.api_key) is set and valid".to_string()
            }
            Self::UpstreamStatus { status: 429, .. } => {
                "The provider is rate limiting requests; wait a moment before retrying".to_string()
            }
            Self::UpstreamStatus { .. }
            | Self::UpstreamEmptyBody
            | Self::UpstreamDecode { .. }
            | Self::UpstreamRejected { .. } => {
                "The completion service misbehaved; retry later or choose another model".to_string()
            }
            Self::IoError(_) | Self::StorageError { .. } => {
                "Check that the storage location exists and is writable".to_string()
            }
            Self::SerializationError(_) => {
                "A stored collection file is corrupt; inspect or remove it".to_string()
            }
            Self::StorageNotFound { path } => format!("Nothing is stored at '{}'", path),
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. } => {
                "Fix the configuration file or command-line arguments".to_string()
            }
            Self::MissingConfigError { field } => {
                format!("Provide a value for '{}'", field)
            }
            Self::CollectionExists { .. } => "Choose a different collection name".to_string(),
            Self::CollectionNotFound { .. } => {
                "Run `flashgen list` to see the saved collections".to_string()
            }
            Self::QuotaExceeded { .. } => {
                "Delete an existing collection or upgrade to a higher plan".to_string()
            }
            Self::ValidationError { .. } => "Correct the input and try again".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Upstream => format!("Could not generate flashcards: {}", self),
            ErrorCategory::Storage => format!("Storage problem: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Collection | ErrorCategory::Validation => self.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FlashgenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_errors_are_distinguishable() {
        let err = FlashgenError::UpstreamStatus {
            status: 502,
            message: "bad gateway".to_string(),
        };
        assert!(err.is_upstream());
        assert_eq!(err.severity(), ErrorSeverity::Medium);

        let err = FlashgenError::CollectionExists {
            name: "Biology".to_string(),
        };
        assert!(!err.is_upstream());
        assert_eq!(err.category(), ErrorCategory::Collection);
    }

    #[test]
    fn test_every_failure_exits_non_zero() {
        let upstream = FlashgenError::UpstreamEmptyBody;
        let quota = FlashgenError::QuotaExceeded {
            plan: "free".to_string(),
            limit: 3,
        };
        let storage = FlashgenError::StorageError {
            message: "disk full".to_string(),
        };

        assert_eq!(upstream.severity().exit_code(), 2);
        assert_eq!(quota.severity().exit_code(), 1);
        assert_eq!(storage.severity().exit_code(), 3);
    }

    #[test]
    fn test_auth_status_gets_key_suggestion() {
        let err = FlashgenError::UpstreamStatus {
            status: 401,
            message: "unauthorized".to_string(),
        };
        assert!(err.recovery_suggestion().contains("OPENROUTER_API_KEY"));
    }
}
