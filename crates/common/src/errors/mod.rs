//! Error types for Citagraph
//!
//! Provides a single error enum for the whole service with:
//! - Distinct variants for library, storage, auth and upstream failures
//! - HTTP status code mapping
//! - Structured error responses
//! - Error codes for client handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (1xxx)
    ValidationError,
    MissingField,

    // Authentication errors (2xxx)
    Unauthorized,
    InvalidPassword,
    ExpiredToken,

    // Resource errors (4xxx)
    PaperNotFound,
    CitationNotFound,
    MetadataNotFound,

    // Conflict errors (5xxx)
    DuplicatePaper,
    DuplicateCitation,

    // Rate limiting (6xxx)
    RateLimited,

    // Storage errors (7xxx)
    StorageError,
    CorruptLibrary,

    // External service errors (8xxx)
    UpstreamError,
    MetadataError,

    // Internal errors (9xxx)
    InternalError,
    ConfigurationError,
    SerializationError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            ErrorCode::ValidationError => 1001,
            ErrorCode::MissingField => 1002,

            ErrorCode::Unauthorized => 2001,
            ErrorCode::InvalidPassword => 2002,
            ErrorCode::ExpiredToken => 2003,


            ErrorCode::PaperNotFound => 4002,
            ErrorCode::CitationNotFound => 4003,
            ErrorCode::MetadataNotFound => 4004,

            ErrorCode::DuplicatePaper => 5002,
            ErrorCode::DuplicateCitation => 5003,

            ErrorCode::RateLimited => 6001,

            ErrorCode::StorageError => 7001,
            ErrorCode::CorruptLibrary => 7002,

            ErrorCode::UpstreamError => 8001,
            ErrorCode::MetadataError => 8002,

            ErrorCode::InternalError => 9001,
            ErrorCode::ConfigurationError => 9002,
            ErrorCode::SerializationError => 9003,
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        field: Option<String>
    },

    #[error("Required field missing: {field}")]
    MissingField { field: String },

    // Authentication errors
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Invalid admin password")]
    InvalidPassword,

    #[error("Token expired")]
    ExpiredToken,

    // Resource errors
    #[error("Paper not found: {id}")]
    PaperNotFound { id: String },

    #[error("Citation not found: {citing_id} -> {cited_id}")]
    CitationNotFound { citing_id: String, cited_id: String },

    #[error("No metadata found for DOI {doi}")]
    MetadataNotFound { doi: String },

    // Conflict errors
    #[error("Paper already exists: {id}")]
    DuplicatePaper { id: String },

    #[error("Citation already exists: {citing_id} -> {cited_id}")]
    DuplicateCitation { citing_id: String, cited_id: String },

    // Rate limiting
    #[error("Rate limit exceeded for {scope}")]
    RateLimited { scope: String },

    // Storage errors
    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Library file {path} is malformed: {message}")]
    CorruptLibrary { path: String, message: String },

    // External service errors
    #[error("Metadata service error: {message}")]
    MetadataError { message: String },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    // Internal errors
    #[error("Internal server error: {message}")]
    Internal { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::MissingField { .. } => ErrorCode::MissingField,
            AppError::Unauthorized { .. } => ErrorCode::Unauthorized,
            AppError::InvalidPassword => ErrorCode::InvalidPassword,
            AppError::ExpiredToken => ErrorCode::ExpiredToken,
            AppError::PaperNotFound { .. } => ErrorCode::PaperNotFound,
            AppError::CitationNotFound { .. } => ErrorCode::CitationNotFound,
            AppError::MetadataNotFound { .. } => ErrorCode::MetadataNotFound,
            AppError::DuplicatePaper { .. } => ErrorCode::DuplicatePaper,
            AppError::DuplicateCitation { .. } => ErrorCode::DuplicateCitation,
            AppError::RateLimited { .. } => ErrorCode::RateLimited,
            AppError::Storage { .. } => ErrorCode::StorageError,
            AppError::CorruptLibrary { .. } => ErrorCode::CorruptLibrary,
            AppError::MetadataError { .. } => ErrorCode::MetadataError,
            AppError::HttpClient(_) => ErrorCode::UpstreamError,
            AppError::Internal { .. } => ErrorCode::InternalError,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
            AppError::Serialization(_) => ErrorCode::SerializationError,
            AppError::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::Validation { .. } |
            AppError::MissingField { .. } => StatusCode::BAD_REQUEST,

            // 401 Unauthorized
            AppError::Unauthorized { .. } |
            AppError::InvalidPassword |
            AppError::ExpiredToken => StatusCode::UNAUTHORIZED,

            // 404 Not Found
            AppError::PaperNotFound { .. } |
            AppError::CitationNotFound { .. } |
            AppError::MetadataNotFound { .. } => StatusCode::NOT_FOUND,

            // 409 Conflict
            AppError::DuplicatePaper { .. } |
            AppError::DuplicateCitation { .. } => StatusCode::CONFLICT,

            // 429 Too Many Requests
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,

            // 500 Internal Server Error
            AppError::Storage { .. } |
            AppError::CorruptLibrary { .. } |
            AppError::Internal { .. } |
            AppError::Configuration { .. } |
            AppError::Serialization(_) |
            AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,

            // 502 Bad Gateway
            AppError::MetadataError { .. } |
            AppError::HttpClient(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Check if this error should be logged at error level
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Check if this error is a client error
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

/// Structured error response for API
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub numeric_code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        let message = self.to_string();

        if self.is_server_error() {
            tracing::error!(
                error = %message,
                code = ?code,
                status = status.as_u16(),
                "Server error"
            );
        } else if self.is_client_error() {
            tracing::warn!(
                error = %message,
                code = ?code,
                status = status.as_u16(),
                "Client error"
            );
        }

        let field = match &self {
            AppError::Validation { field, .. } => field.clone(),
            AppError::MissingField { field } => Some(field.clone()),
            _ => None,
        };

        let body = ErrorResponse {
            error: ErrorDetails {
                code,
                numeric_code: code.as_code(),
                message,
                field,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage {
            message: err.to_string()
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        let field = err.field_errors().keys().next().map(|f| f.to_string());
        AppError::Validation {
            message: err.to_string(),
            field,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_reachable_codes_exist() {
        assert!(serde_json::from_str::<ErrorCode>(r#""FORBIDDEN""#).is_err());
        assert!(serde_json::from_str::<ErrorCode>(r#""INVALID_FORMAT""#).is_err());
        assert_eq!(
            serde_json::from_str::<ErrorCode>(r#""MISSING_FIELD""#).unwrap(),
            ErrorCode::MissingField
        );
    }

    #[test]
    fn test_error_code_mapping() {
        let err = AppError::PaperNotFound { id: "0001".into() };
        assert_eq!(err.code(), ErrorCode::PaperNotFound);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_validation_error() {
        let err = AppError::Validation {
            message: "Title must not be blank".into(),
            field: Some("title".into()),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(!err.is_server_error());
        assert!(err.is_client_error());
    }

    #[test]
    fn test_auth_errors_are_unauthorized() {
        assert_eq!(AppError::InvalidPassword.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::ExpiredToken.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_duplicates_conflict() {
        let err = AppError::DuplicateCitation {
            citing_id: "a".into(),
            cited_id: "b".into(),
        };
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.code().as_code(), 5003);
    }

    #[test]
    fn test_io_error_is_storage_error() {
        let err: AppError = std::io::Error::new(std::io::ErrorKind::Other, "disk full").into();
        assert_eq!(err.code(), ErrorCode::StorageError);
        assert!(err.is_server_error());
    }

    #[test]
    fn test_error_code_serializes_screaming_snake() {
        let json = serde_json::to_string(&ErrorCode::CorruptLibrary).unwrap();
        assert_eq!(json, "\"CORRUPT_LIBRARY\"");
    }
}
