//! Centralized error handling for the escrow service
//!
//! Every public operation returns [`EscrowResult`]. Missing rows, business-rule
//! rejections and validation failures are separate variants so callers can
//! tell them apart without inspecting messages.

use serde::Serialize;
use thiserror::Error;

/// Escrow service error type
#[derive(Error, Debug)]
pub enum EscrowError {
    #[error("{entity} with the id={id} was not found!")]
    NotFound { entity: &'static str, id: i64 },

    /// Business-rule rejection, surfaced verbatim to the caller
    #[error("{0}")]
    Message(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Broadcast failed: {0}")]
    Broadcast(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// JSON error body for callers that forward errors over the wire
#[derive(Debug, Serialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
}

impl EscrowError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        EscrowError::NotFound { entity, id }
    }

    /// Get the error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            EscrowError::NotFound { .. } => "NOT_FOUND",
            EscrowError::Message(_) => "BUSINESS_RULE_VIOLATION",
            EscrowError::Validation(_) => "VALIDATION_ERROR",
            EscrowError::InvalidParams(_) => "INVALID_PARAMS",
            EscrowError::Database(_) => "DATABASE_ERROR",
            EscrowError::Broadcast(_) => "BROADCAST_ERROR",
            EscrowError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, EscrowError::NotFound { .. })
    }

    pub fn is_business_rule(&self) -> bool {
        matches!(self, EscrowError::Message(_))
    }

    pub fn details(&self) -> ErrorDetails {
        ErrorDetails {
            code: self.error_code().to_string(),
            message: self.to_string(),
        }
    }
}

/// Result type alias using EscrowError
pub type EscrowResult<T> = Result<T, EscrowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(EscrowError::not_found("Escrow", 1).error_code(), "NOT_FOUND");
        assert_eq!(
            EscrowError::Message("posted".to_string()).error_code(),
            "BUSINESS_RULE_VIOLATION"
        );
        assert_eq!(
            EscrowError::InvalidParams("test".to_string()).error_code(),
            "INVALID_PARAMS"
        );
        assert_eq!(
            EscrowError::Broadcast("test".to_string()).error_code(),
            "BROADCAST_ERROR"
        );
    }

    #[test]
    fn test_not_found_message_carries_id() {
        let err = EscrowError::not_found("Escrow", 42);
        assert_eq!(err.to_string(), "Escrow with the id=42 was not found!");
        assert!(err.is_not_found());
        assert!(!err.is_business_rule());
    }

    #[test]
    fn test_message_is_surfaced_verbatim() {
        let err = EscrowError::Message("Escrow cannot be created".to_string());
        assert_eq!(err.to_string(), "Escrow cannot be created");
        assert_eq!(err.details().code, "BUSINESS_RULE_VIOLATION");
    }

    #[test]
    fn test_sqlx_errors_stay_database_errors() {
        // lookups use fetch_optional, so a missing row here is a store fault
        let err: EscrowError = sqlx::Error::RowNotFound.into();
        assert!(!err.is_not_found());
        assert_eq!(err.error_code(), "DATABASE_ERROR");

        let err: EscrowError = sqlx::Error::PoolTimedOut.into();
        assert_eq!(err.error_code(), "DATABASE_ERROR");
    }
}
