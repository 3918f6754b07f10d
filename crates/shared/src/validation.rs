//! Common validation utilities.

use validator::{ValidateEmail, ValidationError};

/// Maximum length of an email address (RFC 5321 path limit).
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Canonical form of an email address used for storage and matching.
///
/// Invitations are matched against the authenticated user's email, so both
/// sides must go through this before comparison.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validates that an email address is syntactically valid.
pub fn validate_email_address(email: &str) -> Result<(), ValidationError> {
    let normalized = normalize_email(email);
    if normalized.len() > MAX_EMAIL_LENGTH {
        let mut err = ValidationError::new("email_length");
        err.message = Some("Email address is too long".into());
        return Err(err);
    }

    if normalized.as_str().validate_email() {
        Ok(())
    } else {
        let mut err = ValidationError::new("email_format");
        err.message = Some("Invalid email address".into());
        Err(err)
    }
}
