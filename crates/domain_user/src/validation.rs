//! User validation rules
//!
//! # Validation Rules
//!
//! ## Entity fields (`validator` derive on [`User`])
//! - Email is required and must be a syntactically valid address
//!
//! ## Plaintext password
//! - Between 8 and 99 characters (counted as Unicode scalar values)
//! - Only checked while the password is plaintext: on insert, and on update
//!   when a password change is requested

use validator::Validate;

use crate::error::UserError;
use crate::user::User;

/// Minimum plaintext password length in characters
pub const PASSWORD_MIN_CHARS: usize = 8;

/// Maximum plaintext password length in characters
pub const PASSWORD_MAX_CHARS: usize = 99;

/// Result of user validation
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether the user is valid
    pub is_valid: bool,
    /// List of validation errors
    pub errors: Vec<String>,
}

impl ValidationResult {
    /// Creates a successful validation result
    pub fn ok() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
        }
    }

    /// Adds an error to the result
    pub fn add_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
        self.is_valid = false;
    }

    /// Merges another validation result into this one
    pub fn merge(&mut self, other: ValidationResult) {
        if !other.is_valid {
            self.is_valid = false;
        }
        self.errors.extend(other.errors);
    }

    /// Converts into a `Result`, failing with every collected message
    pub fn into_result(self) -> Result<(), UserError> {
        if self.is_valid {
            Ok(())
        } else {
            Err(UserError::Validation(self.errors))
        }
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::ok()
    }
}

/// Validator for user entities
///
/// # Examples
///
/// ```rust
/// use domain_user::{User, UserValidator};
///
/// let user = User::new("not-an-email", "longenough", "Ada", "Lovelace");
/// let result = UserValidator::validate_new(&user);
///
/// assert!(!result.is_valid);
/// ```
pub struct UserValidator;

impl UserValidator {
    /// Validates entity fields, leaving the password untouched
    pub fn validate(user: &User) -> ValidationResult {
        let mut result = ValidationResult::ok();

        if let Err(errors) = user.validate() {
            let mut messages: Vec<String> = errors
                .field_errors()
                .into_iter()
                .flat_map(|(field, field_errors)| {
                    field_errors.iter().map(move |e| match &e.message {
                        Some(message) => message.to_string(),
                        None => format!("{} is invalid ({})", field, e.code),
                    })
                })
                .collect();
            // field_errors() is a HashMap
            messages.sort();
            for message in messages {
                result.add_error(message);
            }
        }

        result
    }

    /// Validates a plaintext password
    pub fn validate_password(plaintext: &str) -> ValidationResult {
        let mut result = ValidationResult::ok();
        let chars = plaintext.chars().count();

        if chars == 0 {
            result.add_error("password is required");
        } else if !(PASSWORD_MIN_CHARS..=PASSWORD_MAX_CHARS).contains(&chars) {
            result.add_error(format!(
                "password must be between {} and {} characters",
                PASSWORD_MIN_CHARS, PASSWORD_MAX_CHARS
            ));
        }

        result
    }

    /// Validates a user about to be inserted, whose password is plaintext
    pub fn validate_new(user: &User) -> ValidationResult {
        let mut result = Self::validate(user);
        result.merge(Self::validate_password(&user.password));
        result
    }
}
