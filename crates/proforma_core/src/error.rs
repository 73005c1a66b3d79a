use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level error type for roster loading, selection and export.
#[derive(Error, Debug)]
pub enum ProformaError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// The backend could not be reached or answered with a failure status.
    #[error("Roster fetch failed: {0}")]
    Roster(String),

    /// The backend (or a roster file) answered with data we cannot read.
    #[error("Invalid roster data: {0}")]
    InvalidRoster(String),

    #[error("No students selected for export")]
    EmptySelection,

    #[error("{format} export failed: {message}")]
    Export { format: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Classification of errors for logging and user display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Caused by the user's action (e.g. exporting nothing).
    UserError,
    /// Backend unreachable or returned garbage.
    DataFetchError,
    /// Local file system or document generation failure.
    SystemError,
    /// Invalid or missing configuration.
    ConfigError,
}

impl ProformaError {
    pub fn export(format: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Export {
            format: format.into(),
            message: err.to_string(),
        }
    }

    /// Returns the broad error category for routing and display purposes.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(_) => ErrorCategory::ConfigError,
            Self::Roster(_) | Self::InvalidRoster(_) => ErrorCategory::DataFetchError,
            Self::EmptySelection => ErrorCategory::UserError,
            Self::Export { .. } | Self::Io(_) | Self::Serialization(_) => {
                ErrorCategory::SystemError
            }
        }
    }

    /// Returns a user-friendly message (hides internal details).
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(msg) => format!("Configuration issue: {msg}"),
            Self::Roster(_) => "Could not load students. Check your connection and try again.".into(),
            Self::InvalidRoster(_) => "The student list could not be read. Try again.".into(),
            Self::EmptySelection => "Select at least one student to export.".into(),
            Self::Export { format, .. } => format!("Could not generate the {format} file."),
            Self::Io(_) => "File error. Check disk space and permissions.".into(),
            Self::Serialization(_) => "An unexpected error occurred.".into(),
        }
    }

    /// Whether offering a "try again" action makes sense. Nothing is retried
    /// automatically.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Roster(_) | Self::InvalidRoster(_))
    }
}

pub type Result<T, E = ProformaError> = std::result::Result<T, E>;
