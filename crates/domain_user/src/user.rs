//! User entity
//!
//! A user account as stored by the repository. The `password` field holds
//! the plaintext only between construction and the first successful insert
//! or password change; afterwards it holds the Argon2 PHC hash.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::UserId;

use crate::credential::PasswordHasher;
use crate::error::UserError;

/// A user account
///
/// # Serialization
///
/// `password` is accepted on input but never written out, so a `User` can be
/// handed to an outward-facing serializer as is.
///
/// # Examples
///
/// ```rust
/// use domain_user::User;
///
/// let user = User::new("a@x.com", "correct horse", "Ada", "Lovelace");
/// let json = serde_json::to_string(&user).unwrap();
/// assert!(!json.contains("correct horse"));
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct User {
    /// Storage-assigned identifier, unassigned (0) before insert
    #[serde(default)]
    pub id: UserId,
    /// Natural key, unique across users
    #[validate(
        length(min = 1, message = "email is required"),
        email(message = "email is not a valid address")
    )]
    pub email: String,
    /// Plaintext before hashing, PHC hash afterwards
    #[serde(default, skip_serializing)]
    pub password: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    /// Set by storage on insert
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    /// Maintained by storage on every write
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Creates a user that has not been persisted yet
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            id: UserId::default(),
            email: email.into(),
            password: password.into(),
            description: String::new(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            created_at: DateTime::<Utc>::default(),
            updated_at: DateTime::<Utc>::default(),
        }
    }

    /// Sets the free-text description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Returns true once storage has assigned an identifier
    pub fn is_persisted(&self) -> bool {
        !self.id.is_unassigned()
    }

    /// Checks a candidate plaintext against the stored hash
    ///
    /// # Errors
    ///
    /// `UserError::PasswordMismatch` when the candidate is wrong,
    /// `UserError::MalformedHash` when `password` does not hold a hash.
    pub fn is_correct_password(
        &self,
        hasher: &PasswordHasher,
        candidate: &str,
    ) -> Result<(), UserError> {
        hasher.verify(candidate, &self.password)
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("description", &self.description)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// Normalizes incidental whitespace before validation and storage
///
/// Implementations must be idempotent: sanitizing twice equals sanitizing once.
pub trait Sanitize {
    fn sanitize(&mut self);
}

impl Sanitize for User {
    /// Removes leading and trailing whitespace from every text field
    fn sanitize(&mut self) {
        trim_in_place(&mut self.email);
        trim_in_place(&mut self.password);
        trim_in_place(&mut self.description);
        trim_in_place(&mut self.first_name);
        trim_in_place(&mut self.last_name);
    }
}

fn trim_in_place(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}
