// src/application/error_handling.rs
//
// Error responses for the dashboard UI
//
// ARCHITECTURE:
// - Maps AppError -> one serializable response with a user-facing message
// - Decides WHERE the failure is shown: toast, inline banner or dialog
// - Logs internals that the message does not expose

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Standard error response for UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error_type: ErrorType,
    pub surface: ErrorSurface,
    pub message: String,
    pub details: Option<String>,
    /// A banner offers retry; toasts and dialogs do not
    pub retryable: bool,
}

/// Error categories for UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// Record gone (404)
    NotFound,

    /// Client-side or server-side validation (400 / 422)
    Validation,

    /// Another change to the record is pending (409-like)
    Conflict,

    /// Signed out or token rejected (401 / 403)
    Unauthenticated,

    /// Backend answered with an error status
    Gateway,

    /// No answer: connection, timeout, decoding
    Network,

    Configuration,

    Internal,
}

/// Where a failure is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSurface {
    Toast,
    Banner,
    Dialog,
}

/// What the user was doing when the error happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorOrigin {
    /// Loading the list
    Fetch,
    /// Create, update, delete or bulk assign
    Mutation,
}

impl ErrorType {
    pub fn of(error: &AppError) -> Self {
        match error {
            AppError::NotFound => ErrorType::NotFound,
            AppError::Validation(_) | AppError::Domain(_) => ErrorType::Validation,
            AppError::MutationInProgress(_) => ErrorType::Conflict,
            AppError::Unauthenticated => ErrorType::Unauthenticated,
            AppError::Gateway { status, .. } => match status {
                Some(401) | Some(403) => ErrorType::Unauthenticated,
                Some(404) => ErrorType::NotFound,
                Some(400) | Some(422) => ErrorType::Validation,
                Some(409) => ErrorType::Conflict,
                _ => ErrorType::Gateway,
            },
            AppError::Transport(_) | AppError::Serialization(_) => ErrorType::Network,
            AppError::Config(_) => ErrorType::Configuration,
            AppError::Io(_) | AppError::Detached | AppError::Other(_) => ErrorType::Internal,
        }
    }
}

impl ErrorResponse {
    pub fn from_app_error(error: &AppError, origin: ErrorOrigin) -> Self {
        let error_type = ErrorType::of(error);
        let surface = match (error_type, origin) {
            // Rejected before the gateway was called; the form stays open.
            (ErrorType::Validation, ErrorOrigin::Mutation) if is_client_side(error) => {
                ErrorSurface::Dialog
            }
            (_, ErrorOrigin::Fetch) => ErrorSurface::Banner,
            (_, ErrorOrigin::Mutation) => ErrorSurface::Toast,
        };

        let details = match error {
            AppError::Io(_) | AppError::Serialization(_) | AppError::Other(_) => {
                log::error!("Internal error surfaced to UI: {}", error);
                Some("Check logs for details".to_string())
            }
            AppError::Gateway { status, errors, .. } if errors.len() > 1 => {
                log::debug!("Gateway rejection ({:?}) with {} messages", status, errors.len());
                Some(errors.join("; "))
            }
            _ => None,
        };

        Self {
            success: false,
            error_type,
            surface,
            message: error.user_message(),
            details,
            retryable: surface == ErrorSurface::Banner,
        }
    }

    /// Create validation error
    pub fn validation(message: String) -> Self {
        Self {
            success: false,
            error_type: ErrorType::Validation,
            surface: ErrorSurface::Dialog,
            message,
            details: None,
            retryable: false,
        }
    }
}

fn is_client_side(error: &AppError) -> bool {
    matches!(error, AppError::Validation(_) | AppError::Domain(_))
}

/// Helper trait to convert Results to ErrorResponse
pub trait ToErrorResponse<T> {
    fn to_error_response(self, origin: ErrorOrigin) -> Result<T, ErrorResponse>;
}

impl<T> ToErrorResponse<T> for Result<T, AppError> {
    fn to_error_response(self, origin: ErrorOrigin) -> Result<T, ErrorResponse> {
        self.map_err(|e| ErrorResponse::from_app_error(&e, origin))
    }
}
