//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! user store test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built users and hashers with predictable values
//! - `database`: PostgreSQL test containers with the users schema applied
//! - `generators`: Fake data and property-based strategies for users

pub mod database;
pub mod fixtures;
pub mod generators;

pub use database::*;
pub use fixtures::*;
pub use generators::*;
