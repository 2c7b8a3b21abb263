//! User Domain
//!
//! This crate owns the user account entity and everything that happens to
//! it before it reaches storage:
//!
//! - **Sanitize**: trims incidental whitespace from text fields
//! - **Validate**: statically declared field rules plus password bounds
//! - **Credentials**: Argon2id hashing and constant-time verification
//!
//! Persistence lives in `infra_db`, which runs these steps in order around
//! each write.
//!
//! # Examples
//!
//! ```rust
//! use domain_user::{HashingConfig, PasswordHasher, Sanitize, User, UserValidator};
//!
//! let mut user = User::new("  a@x.com ", "correct horse", "Ada", "Lovelace");
//! user.sanitize();
//! UserValidator::validate_new(&user).into_result().unwrap();
//!
//! let hasher = PasswordHasher::new(HashingConfig::minimal()).unwrap();
//! user.password = hasher.hash(&user.password).unwrap();
//! assert!(user.is_correct_password(&hasher, "correct horse").is_ok());
//! ```

pub mod credential;
pub mod error;
pub mod user;
pub mod validation;

pub use credential::{HashingConfig, PasswordHasher};
pub use error::UserError;
pub use user::{Sanitize, User};
pub use validation::{UserValidator, ValidationResult, PASSWORD_MAX_CHARS, PASSWORD_MIN_CHARS};
