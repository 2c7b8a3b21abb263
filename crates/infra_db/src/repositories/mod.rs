//! Repository implementations for domain entities
//!
//! Repositories encapsulate SQL and map between database rows and domain
//! types. Each one:
//! - Declares its row shape's column mapping once
//! - Runs fixed statements with `$n` parameters; list queries go through
//!   the query builder
//! - Classifies storage failures into `CoreError` before returning

pub mod user;

pub use user::{UserFilter, UserListParams, UserRepository, UserRow};
