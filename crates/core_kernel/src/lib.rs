//! Core Kernel - Foundational types shared by every crate of the user store
//!
//! This crate provides the building blocks the other layers agree on:
//! - The error taxonomy every repository operation reports through
//! - Strongly-typed identifiers
//! - Ports for the secondary cache and adapter health checks

pub mod error;
pub mod identifiers;
pub mod ports;

pub use error::{BoxError, CoreError, CoreResult, ErrorKind};
pub use identifiers::UserId;
pub use ports::{
    cache_key, AdapterHealth, CachePort, HealthCheckResult, HealthCheckable, InMemoryCache,
};
