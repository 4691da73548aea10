//! Error handling for the speed measurement engine

use thiserror::Error;

/// Custom error types for the speed measurement engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A single measurement attempt failed at the transport level
    #[error("Measurement error: {0}")]
    Measurement(String),

    /// A measurement attempt exceeded its deadline
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// Aggregation was invoked without any run results
    #[error("Cannot aggregate an empty result set")]
    EmptyResultSet,

    /// A test session ended in the failed state
    #[error("Session failed: {0}")]
    SessionFailed(String),

    /// The host cancelled an in-flight session
    #[error("Session cancelled: {0}")]
    Cancelled(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// I/O errors (history file, etc.)
    #[error("I/O error: {0}")]
    Io(String),

    /// Parsing errors (URLs, JSON, etc.)
    #[error("Parsing error: {0}")]
    Parse(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new measurement error
    pub fn measurement<S: Into<String>>(message: S) -> Self {
        Self::Measurement(message.into())
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::Timeout(message.into())
    }

    /// Create a new session failure
    pub fn session_failed<S: Into<String>>(message: S) -> Self {
        Self::SessionFailed(message.into())
    }

    /// Create a new cancellation error
    pub fn cancelled<S: Into<String>>(message: S) -> Self {
        Self::Cancelled(message.into())
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io(message.into())
    }

    /// Create a new parsing error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse(message.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Get error category for logging and reporting
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG",
            Self::Measurement(_) => "MEASUREMENT",
            Self::Timeout(_) => "TIMEOUT",
            Self::EmptyResultSet => "AGGREGATE",
            Self::SessionFailed(_) => "SESSION",
            Self::Cancelled(_) => "CANCELLED",
            Self::Validation(_) => "VALIDATION",
            Self::Io(_) => "IO",
            Self::Parse(_) => "PARSE",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Whether this error came from the measurement transport (including timeouts)
    pub fn is_measurement_failure(&self) -> bool {
        matches!(self, Self::Measurement(_) | Self::Timeout(_))
    }

    /// Get user-friendly error message with suggestions
    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::Config(msg) => {
                format!("Configuration problem: {}\n\nSuggestion: Check your .env file or command line arguments.", msg)
            }
            Self::Measurement(msg) => {
                format!("The speed test could not reach the measurement server: {}\n\nSuggestion: Check your Wi-Fi connection and run the test again.", msg)
            }
            Self::Timeout(msg) => {
                format!("The speed test took too long: {}\n\nSuggestion: Increase the timeout with --timeout or move closer to the access point.", msg)
            }
            Self::EmptyResultSet => {
                "No measurements were collected, so no average can be reported.\n\nThis is likely a bug. Please report this issue with the error details.".to_string()
            }
            Self::SessionFailed(msg) => {
                format!("The speed test did not finish: {}\n\nSuggestion: Run the test again.", msg)
            }
            Self::Cancelled(msg) => {
                format!("The speed test was stopped: {}", msg)
            }
            Self::Validation(msg) => {
                format!("Invalid input: {}\n\nSuggestion: Check the values passed on the command line.", msg)
            }
            Self::Io(msg) => {
                format!("File operation failed: {}\n\nSuggestion: Check file permissions and disk space.", msg)
            }
            Self::Parse(msg) => {
                format!("Failed to parse data: {}\n\nSuggestion: Check the format of your input data or history file.", msg)
            }
            Self::Internal(msg) => {
                format!("Internal error: {}\n\nThis is likely a bug. Please report this issue with the error details.", msg)
            }
        }
    }

    /// Get exit code for this error type
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Validation(_) | Self::Parse(_) => 1,
            Self::Measurement(_) => 2,
            Self::Timeout(_) => 3,
            Self::SessionFailed(_) | Self::Cancelled(_) => 4,
            Self::Io(_) => 5,
            Self::EmptyResultSet | Self::Internal(_) => 99,
        }
    }

    /// Format error for console display with color coding
    pub fn format_for_console(&self, use_color: bool) -> String {
        let category = self.category();
        let message = self.to_string();

        if use_color {
            use colored::Colorize;
            match self {
                Self::Config(_) | Self::Validation(_) | Self::Parse(_) => {
                    format!("[{}] {}", category.red().bold(), message.red())
                }
                Self::Measurement(_) | Self::SessionFailed(_) | Self::Cancelled(_) => {
                    format!("[{}] {}", category.yellow().bold(), message.yellow())
                }
                Self::Timeout(_) => {
                    format!("[{}] {}", category.blue().bold(), message.blue())
                }
                Self::Io(_) => {
                    format!("[{}] {}", category.cyan().bold(), message.cyan())
                }
                Self::EmptyResultSet | Self::Internal(_) => {
                    format!("[{}] {}", category.bright_red().bold(), message.bright_red())
                }
            }
        } else {
            format!("[{}] {}", category, message)
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::io(error.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(error: url::ParseError) -> Self {
        Self::parse(format!("URL parse error: {}", error))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::parse(format!("JSON parse error: {}", error))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::timeout(error.to_string())
        } else {
            Self::measurement(error.to_string())
        }
    }
}

impl From<dotenv::Error> for AppError {
    fn from(error: dotenv::Error) -> Self {
        Self::config(format!("Environment file error: {}", error))
    }
}

impl From<std::num::ParseIntError> for AppError {
    fn from(error: std::num::ParseIntError) -> Self {
        Self::parse(format!("Integer parse error: {}", error))
    }
}

/// Custom Result type for the application
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_constructors() {
        assert_eq!(AppError::config("bad"), AppError::Config("bad".to_string()));
        assert_eq!(AppError::measurement("down"), AppError::Measurement("down".to_string()));
        assert_eq!(AppError::timeout("slow"), AppError::Timeout("slow".to_string()));
        assert_eq!(AppError::session_failed("x"), AppError::SessionFailed("x".to_string()));
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(AppError::config("x").category(), "CONFIG");
        assert_eq!(AppError::measurement("x").category(), "MEASUREMENT");
        assert_eq!(AppError::EmptyResultSet.category(), "AGGREGATE");
        assert_eq!(AppError::cancelled("x").category(), "CANCELLED");
    }

    #[test]
    fn test_measurement_failure_kinds() {
        assert!(AppError::measurement("x").is_measurement_failure());
        assert!(AppError::timeout("x").is_measurement_failure());
        assert!(!AppError::EmptyResultSet.is_measurement_failure());
        assert!(!AppError::config("x").is_measurement_failure());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(AppError::config("x").exit_code(), 1);
        assert_eq!(AppError::measurement("x").exit_code(), 2);
        assert_eq!(AppError::timeout("x").exit_code(), 3);
        assert_eq!(AppError::session_failed("x").exit_code(), 4);
        assert_eq!(AppError::EmptyResultSet.exit_code(), 99);
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            AppError::EmptyResultSet.to_string(),
            "Cannot aggregate an empty result set"
        );
        assert_eq!(
            AppError::measurement("connection refused").to_string(),
            "Measurement error: connection refused"
        );
    }

    #[test]
    fn test_plain_console_format() {
        let formatted = AppError::timeout("attempt 2").format_for_console(false);
        assert_eq!(formatted, "[TIMEOUT] Timeout error: attempt 2");
    }

    #[test]
    fn test_user_friendly_message_has_suggestion() {
        let message = AppError::measurement("refused").user_friendly_message();
        assert!(message.contains("refused"));
        assert!(message.contains("Suggestion"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let app: AppError = io.into();
        assert_eq!(app.category(), "IO");
    }

    #[test]
    fn test_json_error_conversion() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let app: AppError = err.into();
        assert!(matches!(app, AppError::Parse(_)));
    }
}
