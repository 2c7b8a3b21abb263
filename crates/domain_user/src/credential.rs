//! Credential lifecycle: one-way hashing and verification of passwords
//!
//! Passwords are hashed with Argon2id using a fresh random salt per
//! credential and stored as PHC strings (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`).
//! The cost parameters are embedded in every hash, so raising the work
//! factor later does not invalidate existing credentials.

use std::fmt;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{
    Error as PasswordHashError, PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
};
use argon2::{Algorithm, Argon2, Params, Version};
use serde::{Deserialize, Serialize};

use crate::error::UserError;

/// Work factor of the credential hash
///
/// Higher values make both hashing and brute-force attacks more expensive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashingConfig {
    /// Memory cost in KiB
    pub memory_kib: u32,
    /// Number of passes over memory
    pub iterations: u32,
    /// Degree of parallelism (lanes)
    pub parallelism: u32,
}

impl HashingConfig {
    /// Cheapest parameters Argon2 accepts; only meant for test suites
    pub fn minimal() -> Self {
        Self {
            memory_kib: Params::MIN_M_COST.max(8),
            iterations: 1,
            parallelism: 1,
        }
    }
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

/// Hashes and verifies passwords
///
/// Cheap to clone; share one instance per process.
#[derive(Clone)]
pub struct PasswordHasher {
    config: HashingConfig,
    argon2: Argon2<'static>,
}

impl PasswordHasher {
    /// Creates a hasher with the given work factor
    ///
    /// # Errors
    ///
    /// Returns `UserError::HashingConfig` if Argon2 rejects the parameters.
    pub fn new(config: HashingConfig) -> Result<Self, UserError> {
        let params = Params::new(config.memory_kib, config.iterations, config.parallelism, None)
            .map_err(|e| UserError::HashingConfig(e.to_string()))?;

        Ok(Self {
            config,
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Returns the configured work factor
    pub fn config(&self) -> HashingConfig {
        self.config
    }

    /// Hashes a plaintext password with a fresh random salt
    pub fn hash(&self, plaintext: &str) -> Result<String, UserError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| UserError::Hashing(e.to_string()))
    }

    /// Verifies a candidate plaintext against a stored PHC hash
    ///
    /// The comparison is the constant-time one provided by `argon2`. The
    /// parameters are read from the stored hash, not from `self`.
    pub fn verify(&self, candidate: &str, stored_hash: &str) -> Result<(), UserError> {
        let parsed =
            PasswordHash::new(stored_hash).map_err(|e| UserError::MalformedHash(e.to_string()))?;

        self.argon2
            .verify_password(candidate.as_bytes(), &parsed)
            .map_err(|e| match e {
                PasswordHashError::Password => UserError::PasswordMismatch,
                other => UserError::Hashing(other.to_string()),
            })
    }

    /// Returns true if `value` parses as a PHC hash string
    pub fn is_hash(value: &str) -> bool {
        PasswordHash::new(value).is_ok()
    }
}

impl fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("config", &self.config)
            .finish()
    }
}
