//! Domain error types.

use thiserror::Error;

/// Error returned by every storage port.
///
/// Stores know nothing about business rules; they only distinguish a
/// uniqueness violation from every other failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Duplicate record: {0}")]
    Duplicate(String),

    #[error("Storage failure: {0}")]
    Backend(String),
}

/// Error returned by the invitation core.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The entity is absent, or absent from the caller's view.
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid: {0}")]
    Invalid(String),

    /// A write was undone after a later step failed; the whole operation
    /// can be retried.
    #[error("Transient failure: {0}")]
    Transient(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(msg) => DomainError::Conflict(msg),
            StoreError::Backend(msg) => DomainError::Internal(msg),
        }
    }
}

impl From<validator::ValidationError> for DomainError {
    fn from(err: validator::ValidationError) -> Self {
        let message = err
            .message
            .map(|m| m.to_string())
            .unwrap_or_else(|| err.code.to_string());
        DomainError::Invalid(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_duplicate_maps_to_conflict() {
        let err: DomainError = StoreError::Duplicate("pending invitation".into()).into();
        assert_eq!(err, DomainError::Conflict("pending invitation".into()));
    }

    #[test]
    fn test_store_backend_maps_to_internal() {
        let err: DomainError = StoreError::Backend("connection reset".into()).into();
        assert!(matches!(err, DomainError::Internal(_)));
    }

    #[test]
    fn test_validation_error_maps_to_invalid() {
        let err: DomainError = shared::validation::validate_email_address("nope")
            .unwrap_err()
            .into();
        assert_eq!(err, DomainError::Invalid("Invalid email address".into()));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            DomainError::NotFound("Invitation".into()).to_string(),
            "Not found: Invitation"
        );
        assert_eq!(
            StoreError::Duplicate("x".into()).to_string(),
            "Duplicate record: x"
        );
    }
}
