//! Service layer error types
//!
//! Every failure a caller can observe is one of these variants. `Display`
//! yields the external message; `Internal` carries detail for the logs only.

use auth_common::{AppError, ErrorResponse};
use auth_core::DomainError;
use std::fmt;
use validator::ValidationErrors;

/// Service layer error type
#[derive(Debug)]
pub enum ServiceError {
    /// Email is already registered
    AlreadyExists,

    /// Unknown email or wrong password; the two are indistinguishable
    InvalidCredentials,

    /// Token failed signature, expiry or issuer checks
    Unauthorized,

    /// Malformed input
    Validation(String),

    /// Store, hashing or signing failure
    Internal(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyExists => write!(f, "User already exists"),
            Self::InvalidCredentials => write!(f, "User/Password not valid"),
            Self::Unauthorized => write!(f, "Invalid token"),
            Self::Validation(msg) => write!(f, "{msg}"),
            Self::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for ServiceError {}

impl ServiceError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Get the status code carried in error replies
    pub fn status_code(&self) -> u16 {
        match self {
            Self::AlreadyExists | Self::InvalidCredentials | Self::Validation(_) => 400,
            Self::Unauthorized => 401,
            Self::Internal(_) => 500,
        }
    }

    /// Get the error code for logs
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AlreadyExists => "ALREADY_EXISTS",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if this is a server-side failure
    pub fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::EmailAlreadyExists => Self::AlreadyExists,
            DomainError::DatabaseError(msg) => Self::Internal(msg),
        }
    }
}

impl From<AppError> for ServiceError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::InvalidToken | AppError::TokenExpired | AppError::InvalidIssuer => {
                Self::Unauthorized
            }
            AppError::Domain(e) => Self::from(e),
            AppError::Internal(e) => Self::Internal(format!("{e:#}")),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, field_errors)| {
                field_errors.iter().map(move |error| match &error.message {
                    Some(message) => message.to_string(),
                    None => format!("{field} is invalid"),
                })
            })
            .collect();
        messages.sort();

        Self::Validation(messages.join(", "))
    }
}

impl From<&ServiceError> for ErrorResponse {
    fn from(err: &ServiceError) -> Self {
        if err.is_server_error() {
            return ErrorResponse::internal();
        }
        ErrorResponse::new(err.status_code(), err.to_string())
    }
}

impl From<ServiceError> for ErrorResponse {
    fn from(err: ServiceError) -> Self {
        Self::from(&err)
    }
}

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;
