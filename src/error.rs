//! Error types and handling for the SafeSafar service

use thiserror::Error;

/// Main error type for the SafeSafar service
#[derive(Error, Debug)]
pub enum SafetyError {
    /// Configuration-related errors, including a missing provider credential
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Upstream provider communication errors
    #[error("API error: {message}")]
    Api { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Cache operation errors
    #[error("Cache error: {message}")]
    Cache { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// General application errors
    #[error("Application error: {message}")]
    General { message: String },
}

impl SafetyError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new cache error
    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// Create a new general error
    pub fn general<S: Into<String>>(message: S) -> Self {
        Self::General {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            SafetyError::Config { .. } => {
                "Configuration error. Please check your config file and API tokens.".to_string()
            }
            SafetyError::Api { .. } => {
                "Unable to reach the weather or air quality provider.".to_string()
            }
            SafetyError::Validation { message } => message.clone(),
            SafetyError::Cache { .. } => {
                "Cache operation failed. You may need to clear your cache.".to_string()
            }
            SafetyError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
            SafetyError::General { message } => message.clone(),
        }
    }
}

impl From<anyhow::Error> for SafetyError {
    fn from(err: anyhow::Error) -> Self {
        SafetyError::general(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_err = SafetyError::config("missing WAQI token");
        assert!(matches!(config_err, SafetyError::Config { .. }));

        let api_err = SafetyError::api("connection failed");
        assert!(matches!(api_err, SafetyError::Api { .. }));

        let validation_err = SafetyError::validation("invalid coordinates");
        assert!(matches!(validation_err, SafetyError::Validation { .. }));
    }

    #[test]
    fn test_user_messages() {
        let config_err = SafetyError::config("test");
        assert!(config_err.user_message().contains("Configuration error"));

        let api_err = SafetyError::api("test");
        assert!(api_err.user_message().contains("Unable to reach"));

        let validation_err = SafetyError::validation("lat must be between -90 and 90");
        assert_eq!(validation_err.user_message(), "lat must be between -90 and 90");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: SafetyError = io_err.into();
        assert!(matches!(err, SafetyError::Io { .. }));
    }

    #[test]
    fn test_anyhow_conversion_keeps_message() {
        let err: SafetyError = anyhow::anyhow!("fjall refused to open").into();
        assert!(err.to_string().contains("fjall refused to open"));
    }
}
