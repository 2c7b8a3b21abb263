//! User domain errors
//!
//! Domain failures are classified into the shared taxonomy through
//! [`UserError::kind`]; the repository converts them with `From`.

use thiserror::Error;

use core_kernel::{CoreError, ErrorKind};

/// Errors that can occur in the user domain
#[derive(Debug, Error)]
pub enum UserError {
    /// One or more validation rules failed
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// A password change was requested without confirming the old password
    #[error("old password is required to change the password")]
    OldPasswordRequired,

    /// The candidate password does not match the stored hash
    #[error("Password is incorrect")]
    PasswordMismatch,

    /// The stored credential is not a parsable hash
    #[error("stored password hash is malformed: {0}")]
    MalformedHash(String),

    /// Hashing itself failed
    #[error("password hashing failed: {0}")]
    Hashing(String),

    /// The configured work factor was rejected
    #[error("invalid password hashing parameters: {0}")]
    HashingConfig(String),
}

impl UserError {
    /// Returns the taxonomy classification of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            UserError::Validation(_) | UserError::OldPasswordRequired => ErrorKind::Unprocessable,
            UserError::PasswordMismatch => ErrorKind::Unauthorized,
            UserError::MalformedHash(_) | UserError::Hashing(_) | UserError::HashingConfig(_) => {
                ErrorKind::Internal
            }
        }
    }
}

impl From<UserError> for CoreError {
    fn from(error: UserError) -> Self {
        CoreError::new(error.kind(), error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert_eq!(UserError::Validation(vec!["email is required".into()]).kind(), ErrorKind::Unprocessable);
        assert_eq!(UserError::OldPasswordRequired.kind(), ErrorKind::Unprocessable);
        assert_eq!(UserError::PasswordMismatch.kind(), ErrorKind::Unauthorized);
        assert_eq!(UserError::Hashing("rng".into()).kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_into_core_error() {
        let error: CoreError = UserError::PasswordMismatch.into();
        assert_eq!(error.kind(), ErrorKind::Unauthorized);
        assert_eq!(error.to_string(), "unauthorized: Password is incorrect");
    }
}
