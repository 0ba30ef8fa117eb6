//! Error types shared by the authorization core.
//!
//! Decoding and bootstrap never surface these: a malformed token decodes to an
//! invalid result and a corrupt persisted session boots as logged out. Errors
//! are reserved for operations whose caller can act on the failure, such as a
//! storage write that did not land or a permission gate that refused.

use thiserror::Error;

/// Generic error for auth context, storage and permission operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Storage error for key '{key}': {message}")]
    Storage { key: String, message: String },

    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    #[error("Internal error: {message}")]
    InternalError { message: String },
}

pub type AuthResult<T> = Result<T, AuthError>;

impl AuthError {
    // Helper constructors for common patterns

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn storage(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Storage {
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: message.into(),
        }
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = AuthError::storage("authData", "disk full");
        assert_eq!(err.to_string(), "Storage error for key 'authData': disk full");

        let err = AuthError::permission_denied("requires one of: ADMIN");
        assert_eq!(err.to_string(), "Permission denied: requires one of: ADMIN");
    }

    #[test]
    fn test_serde_error_converts() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: AuthError = parse_err.into();
        assert!(matches!(err, AuthError::Serialization { .. }));
    }
}
