// ============================
// crates/backend-lib/src/validation/mod.rs
// ============================
//! Field validation run by the pre-save hooks.

use thiserror::Error;

/// Possible validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("a username is required")]
    MissingUsername,

    #[error("an email is required")]
    MissingEmail,

    #[error("Invalid password")]
    MissingPassword,
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

/// A value is present when it exists and is non-empty
pub fn validate_presence_of(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.is_empty())
}

/// Validate a username
pub fn validate_username(username: &str) -> ValidationResult<&str> {
    if !validate_presence_of(Some(username)) {
        return Err(ValidationError::MissingUsername);
    }
    Ok(username)
}

/// Validate an email address
pub fn validate_email(email: &str) -> ValidationResult<&str> {
    if !validate_presence_of(Some(email)) {
        return Err(ValidationError::MissingEmail);
    }
    Ok(email)
}

/// Validate a plaintext password
pub fn validate_password(password: Option<&str>) -> ValidationResult<&str> {
    match password {
        Some(p) if !p.is_empty() => Ok(p),
        _ => Err(ValidationError::MissingPassword),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presence() {
        assert!(validate_presence_of(Some("x")));
        assert!(!validate_presence_of(Some("")));
        assert!(!validate_presence_of(None));
    }

    #[test]
    fn test_required_fields() {
        assert_eq!(validate_username("alice"), Ok("alice"));
        assert_eq!(validate_username(""), Err(ValidationError::MissingUsername));
        assert_eq!(validate_email("a@x.com"), Ok("a@x.com"));
        assert_eq!(validate_email(""), Err(ValidationError::MissingEmail));
    }

    #[test]
    fn test_password_presence() {
        assert_eq!(validate_password(Some("secret1")), Ok("secret1"));
        assert_eq!(validate_password(Some("")), Err(ValidationError::MissingPassword));
        assert_eq!(validate_password(None), Err(ValidationError::MissingPassword));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(ValidationError::MissingUsername.to_string(), "a username is required");
        assert_eq!(ValidationError::MissingEmail.to_string(), "an email is required");
        assert_eq!(ValidationError::MissingPassword.to_string(), "Invalid password");
    }
}
