// src/error/types.rs
use crate::domain::DomainError;
use serde::Serialize;
use thiserror::Error;

/// Shown when a failure carries nothing a user can act on.
pub const FALLBACK_MESSAGE: &str = "Something went wrong. Please try again.";

#[derive(Debug, Error)]
pub enum AppError {
    /// The backend answered with a non-success status.
    #[error("Gateway rejected request ({}): {}", status_label(.status), .message.as_deref().unwrap_or("no message"))]
    Gateway {
        status: Option<u16>,
        message: Option<String>,
        /// Nested validation messages (`response.data.errors`)
        errors: Vec<String>,
    },

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("{0}")]
    Validation(String),

    #[error("Another change to record {0} is still pending")]
    MutationInProgress(String),

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No educator is signed in")]
    Unauthenticated,

    #[error("List controller has been detached")]
    Detached,

    #[error("Resource not found")]
    NotFound,

    #[error("Other error: {0}")]
    Other(String),
}

fn status_label(status: &Option<u16>) -> String {
    status
        .map(|s| s.to_string())
        .unwrap_or_else(|| "no status".to_string())
}

impl AppError {
    /// Message for a toast or dialog.
    ///
    /// Order: first nested validation message, then the top-level response
    /// message, then the error's own text, then [`FALLBACK_MESSAGE`].
    pub fn user_message(&self) -> String {
        let message = match self {
            AppError::Gateway {
                message, errors, ..
            } => errors
                .iter()
                .find(|e| !e.trim().is_empty())
                .or(message.as_ref().filter(|m| !m.trim().is_empty()))
                .cloned(),
            AppError::Transport(msg) | AppError::Validation(msg) | AppError::Other(msg) => {
                Some(msg.clone())
            }
            other => Some(other.to_string()),
        };

        match message {
            Some(m) if !m.trim().is_empty() => m,
            _ => FALLBACK_MESSAGE.to_string(),
        }
    }

    /// Gateway rejection built from a JSON error body of the shape
    /// `{ "message": ..., "errors": [ ... ] }`.
    pub fn from_response_body(status: Option<u16>, body: &serde_json::Value) -> Self {
        let message = body
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string);

        let errors = match body.get("errors") {
            Some(serde_json::Value::Array(items)) => items.iter().filter_map(error_text).collect(),
            Some(serde_json::Value::Object(fields)) => fields.values().filter_map(error_text).collect(),
            Some(serde_json::Value::String(s)) => vec![s.clone()],
            _ => Vec::new(),
        };

        AppError::Gateway {
            status,
            message,
            errors,
        }
    }
}

/// Validation entries arrive as bare strings or as `{ msg }` / `{ message }` objects.
fn error_text(entry: &serde_json::Value) -> Option<String> {
    match entry {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Object(map) => map
            .get("msg")
            .or_else(|| map.get("message"))
            .and_then(|m| m.as_str())
            .map(str::to_string),
        _ => None,
    }
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Transport(err.to_string())
    }
}

impl From<chrono::ParseError> for AppError {
    fn from(err: chrono::ParseError) -> Self {
        AppError::Other(format!("Date parse error: {}", err))
    }
}

pub type AppResult<T> = Result<T, AppError>;
