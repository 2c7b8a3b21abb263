//! Strongly-typed identifiers for domain entities
//!
//! Storage assigns identifiers as `BIGSERIAL` values; wrapping them keeps a
//! user id from being passed where some other integer is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a storage-assigned value
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            /// Returns the raw storage value
            pub const fn get(&self) -> i64 {
                self.0
            }

            /// Returns true until storage has assigned a value
            pub const fn is_unassigned(&self) -> bool {
                self.0 == 0
            }

            /// Returns the identifier prefix used in cache keys and logs
            pub fn prefix() -> &'static str {
                $prefix
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw = s.strip_prefix(concat!($prefix, ":")).unwrap_or(s);
                Ok(Self(raw.parse()?))
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> i64 {
                id.0
            }
        }
    };
}

define_id!(UserId, "user");
