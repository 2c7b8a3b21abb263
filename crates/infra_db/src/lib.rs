//! Infrastructure Database Layer
//!
//! This crate provides the database infrastructure for the user store,
//! built on PostgreSQL using SQLx.
//!
//! # Architecture
//!
//! The crate follows the repository pattern, providing data access abstractions
//! that hide the database implementation details from the domain layer.
//!
//! # Query Layer
//!
//! List requests never assemble SQL from caller strings:
//! - **Column mapping** ([`column`]): static logical → physical names per entity
//! - **Filters** ([`filter`]): typed, optional per-field combinators
//! - **Query builder** ([`query`]): parameterized SELECT with sort and pagination
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, DatabaseConfig, UserRepository};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! let repo = UserRepository::new(pool, cache, hasher);
//! let user = repo.get_by_id(UserId::new(1)).await?;
//! ```

pub mod column;
pub mod error;
pub mod filter;
pub mod pool;
pub mod query;
pub mod repositories;

pub use column::{ColumnMapped, ColumnMapping};
pub use error::DatabaseError;
pub use filter::{Combinator, EntityFilter, IntFilter, Predicate, SqlValue, StringFilter, TimeFilter};
pub use pool::{create_pool, DatabaseConfig, DatabasePool};
pub use query::{
    LimitOffsetPagination, ListParams, OneColumnSort, SelectQuery, SortDirection, Statement,
    DEFAULT_LIMIT, MAX_LIMIT,
};
pub use repositories::{UserFilter, UserListParams, UserRepository, UserRow};
