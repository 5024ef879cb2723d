//! Unified error handling for the Chibi backend
//!
//! This module provides a comprehensive error type that covers all possible
//! failure scenarios in the application, with automatic HTTP response mapping.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// Main application error type
///
/// All errors in the application should be converted to this type.
/// It implements `ResponseError` for automatic HTTP response generation.
#[derive(Error, Debug)]
pub enum AppError {
    // ==================== Database Errors ====================
    #[error("Database error: {0}")]
    Database(String),

    #[error("Database pool error: {0}")]
    Pool(String),

    #[error("Transaction failed: {0}")]
    Transaction(String),

    // ==================== Queue Errors ====================
    #[error("Queue error: {0}")]
    Queue(String),

    #[error("Queue connection failed: {0}")]
    QueueConnection(String),

    // ==================== Carrier Errors ====================
    #[error("Carrier request failed: {0}")]
    Carrier(String),

    #[error("Call record not found: {0}")]
    CallRecordNotFound(String),

    // ==================== Payload Errors ====================
    #[error("XML parse error: {0}")]
    XmlParse(String),

    #[error("Unsupported attachment: {0}")]
    UnsupportedAttachment(String),

    // ==================== Domain Errors ====================
    #[error("Message not found: {0}")]
    MessageNotFound(String),

    #[error("Phone call not found: {0}")]
    PhoneCallNotFound(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    // ==================== Auth Errors ====================
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    // ==================== Validation Errors ====================
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    // ==================== Resource Errors ====================
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    // ==================== Internal Errors ====================
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AppError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::Validation(_)
            | AppError::InvalidInput(_)
            | AppError::MissingField(_)
            | AppError::XmlParse(_) => StatusCode::BAD_REQUEST,

            // 401 Unauthorized
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,

            // 404 Not Found
            AppError::CallRecordNotFound(_)
            | AppError::MessageNotFound(_)
            | AppError::PhoneCallNotFound(_)
            | AppError::UserNotFound(_)
            | AppError::NotFound(_) => StatusCode::NOT_FOUND,

            // 409 Conflict
            AppError::Conflict(_) | AppError::AlreadyExists(_) => StatusCode::CONFLICT,

            // 415 Unsupported Media Type
            AppError::UnsupportedAttachment(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,

            // 502 Bad Gateway
            AppError::Carrier(_) => StatusCode::BAD_GATEWAY,

            // 500 Internal Server Error
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "database_error",
            AppError::Pool(_) => "pool_error",
            AppError::Transaction(_) => "transaction_error",
            AppError::Queue(_) => "queue_error",
            AppError::QueueConnection(_) => "queue_connection_error",
            AppError::Carrier(_) => "carrier_error",
            AppError::CallRecordNotFound(_) => "call_record_not_found",
            AppError::XmlParse(_) => "xml_parse_error",
            AppError::UnsupportedAttachment(_) => "unsupported_attachment",
            AppError::MessageNotFound(_) => "message_not_found",
            AppError::PhoneCallNotFound(_) => "phone_call_not_found",
            AppError::UserNotFound(_) => "user_not_found",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Validation(_) => "validation_error",
            AppError::InvalidInput(_) => "invalid_input",
            AppError::MissingField(_) => "missing_field",
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::AlreadyExists(_) => "already_exists",
            AppError::Internal(_) => "internal_error",
            AppError::Config(_) => "config_error",
            AppError::Serialization(_) => "serialization_error",
        }
    }

    /// Whether this error is a write-conflict class error eligible for retry
    pub fn is_conflict(&self) -> bool {
        matches!(self, AppError::Conflict(_) | AppError::AlreadyExists(_))
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        AppError::status_code(self)
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let body = json!({
            "error": self.error_code(),
            "message": self.to_string(),
            "status": status.as_u16(),
        });

        HttpResponse::build(status).json(body)
    }
}

// ==================== From implementations ====================

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            AppError::Unauthorized("bad credentials".to_string()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::CallRecordNotFound("CA123".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::XmlParse("unexpected end of document".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Carrier("timeout".to_string()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::UnsupportedAttachment("payload.pdf".to_string()).status_code(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AppError::CallRecordNotFound("CA123".to_string()).error_code(),
            "call_record_not_found"
        );
        assert_eq!(
            AppError::Queue("boom".to_string()).error_code(),
            "queue_error"
        );
    }

    #[test]
    fn test_is_conflict() {
        assert!(AppError::Conflict("duplicate".to_string()).is_conflict());
        assert!(AppError::AlreadyExists("sid".to_string()).is_conflict());
        assert!(!AppError::Database("down".to_string()).is_conflict());
    }
}
