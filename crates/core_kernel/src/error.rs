//! Error taxonomy shared across the system
//!
//! Every error that crosses the repository boundary is a [`CoreError`]
//! carrying exactly one [`ErrorKind`]. Callers (transport layers, jobs,
//! tests) switch on the kind; the underlying cause is kept for diagnostics
//! only and is never part of the contract.

use std::error::Error as StdError;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Boxed underlying cause of a [`CoreError`]
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Result alias used by every operation exposed across crate boundaries
pub type CoreResult<T> = Result<T, CoreError>;

/// The closed set of error classifications
///
/// The mapping to outward-facing responses is the caller's concern:
///
/// | kind            | typical meaning                                   |
/// |-----------------|---------------------------------------------------|
/// | `NotFound`      | the addressed row does not exist                  |
/// | `Conflict`      | a natural key is already taken                    |
/// | `Unprocessable` | input failed sanitation, validation or a FK check |
/// | `Unauthorized`  | a credential did not match                        |
/// | `Internal`      | anything else                                     |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Unprocessable,
    Unauthorized,
    Internal,
}

impl ErrorKind {
    /// Stable snake_case name of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Unprocessable => "unprocessable",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classified error with an optional human-readable message and cause
///
/// # Example
///
/// ```rust
/// use core_kernel::{CoreError, ErrorKind};
///
/// let error = CoreError::conflict("user with email a@x.com does already exist");
/// assert_eq!(error.kind(), ErrorKind::Conflict);
/// assert!(error.to_string().contains("a@x.com"));
/// ```
#[derive(Debug, Error)]
#[error("{}", render(.kind, .message, .source))]
pub struct CoreError {
    kind: ErrorKind,
    message: Option<String>,
    #[source]
    source: Option<BoxError>,
}

impl CoreError {
    /// Creates an error of the given kind wrapping an underlying cause
    pub fn new<E>(kind: ErrorKind, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self {
            kind,
            message: None,
            source: Some(source.into()),
        }
    }

    /// Creates an error of the given kind carrying only a message
    pub fn with_kind(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: Some(message.into()),
            source: None,
        }
    }

    /// Replaces the human-readable message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::NotFound, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Conflict, message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Unprocessable, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Unauthorized, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Internal, message)
    }

    /// Returns the classification of this error
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the human-readable message, if any
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Checks the classification without matching on [`ErrorKind`]
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }
}

// the message wins over the cause
fn render(kind: &ErrorKind, message: &Option<String>, source: &Option<BoxError>) -> String {
    match (message, source) {
        (Some(message), _) => format!("{}: {}", kind, message),
        (None, Some(source)) => format!("{}: {}", kind, source),
        (None, None) => kind.to_string(),
    }
}
