//! Error types for slow log conversion

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, SlowlogError>;

/// Errors produced while reading, parsing or writing slow log data
#[derive(Debug, Error)]
pub enum SlowlogError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error{}: {message}", line_suffix(.line_number))]
    Parse {
        message: String,
        line_number: Option<usize>,
        line_content: Option<String>,
    },

    #[error("timestamp error{}: {message} ({value:?})", line_suffix(.line_number))]
    Timestamp {
        message: String,
        value: String,
        line_number: Option<usize>,
    },

    #[error(
        "invalid boolean token for {field}{}: expected Yes or No, got {token:?}",
        line_suffix(.line_number)
    )]
    InvalidBooleanToken {
        field: String,
        token: String,
        line_number: Option<usize>,
    },

    #[error("configuration error: {message}")]
    Configuration {
        message: String,
        field: Option<String>,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SlowlogError {
    /// Attach the offending line to a coercion error
    pub fn at_line(self, line: usize, content: &str) -> Self {
        match self {
            SlowlogError::Parse { message, .. } => SlowlogError::Parse {
                message,
                line_number: Some(line),
                line_content: Some(content.to_string()),
            },
            SlowlogError::Timestamp { message, value, .. } => SlowlogError::Timestamp {
                message,
                value,
                line_number: Some(line),
            },
            SlowlogError::InvalidBooleanToken { field, token, .. } => SlowlogError::InvalidBooleanToken {
                field,
                token,
                line_number: Some(line),
            },
            other => other,
        }
    }

    /// Whether this error came from converting a single field value
    pub fn is_coercion_error(&self) -> bool {
        matches!(
            self,
            SlowlogError::Parse { .. }
                | SlowlogError::Timestamp { .. }
                | SlowlogError::InvalidBooleanToken { .. }
        )
    }
}

fn line_suffix(line_number: &Option<usize>) -> String {
    match line_number {
        Some(n) => format!(" at line {}", n),
        None => String::new(),
    }
}

/// Build a [`SlowlogError::Parse`]
pub fn parse_error(message: &str, line_number: Option<usize>, line_content: Option<&str>) -> SlowlogError {
    SlowlogError::Parse {
        message: message.to_string(),
        line_number,
        line_content: line_content.map(str::to_string),
    }
}

/// Build a [`SlowlogError::Timestamp`]
pub fn timestamp_error(message: &str, value: &str) -> SlowlogError {
    SlowlogError::Timestamp {
        message: message.to_string(),
        value: value.to_string(),
        line_number: None,
    }
}

/// Build a [`SlowlogError::Configuration`]
pub fn config_error(message: impl Into<String>, field: Option<&str>) -> SlowlogError {
    SlowlogError::Configuration {
        message: message.into(),
        field: field.map(str::to_string),
    }
}
