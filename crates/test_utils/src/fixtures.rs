//! Pre-built Test Fixtures
//!
//! Provides ready-to-use users with predictable values. Passwords are
//! plaintext, as a caller would hand them to `insert`.

use domain_user::{HashingConfig, PasswordHasher, User};

/// Plaintext password shared by the fixture users
pub const FIXTURE_PASSWORD: &str = "correct horse battery";

/// Fixture for user test data
pub struct UserFixtures;

impl UserFixtures {
    /// A valid new user
    pub fn ada() -> User {
        User::new("ada@example.com", FIXTURE_PASSWORD, "Ada", "Lovelace")
            .with_description("first programmer")
    }

    /// A second valid user with a distinct email
    pub fn grace() -> User {
        User::new("grace@example.com", FIXTURE_PASSWORD, "Grace", "Hopper")
            .with_description("compiler pioneer")
    }

    /// A valid user whose text fields carry surrounding whitespace
    pub fn padded() -> User {
        User::new("  alan@example.com ", FIXTURE_PASSWORD, " Alan ", "Turing\n")
    }

    /// A user with an email that fails validation
    pub fn invalid_email() -> User {
        User::new("not-an-email", FIXTURE_PASSWORD, "No", "Body")
    }

    /// A user whose password is below the minimum length
    pub fn short_password() -> User {
        User::new("short@example.com", "short", "Short", "Password")
    }
}

/// Fixture for credential hashing
pub struct CredentialFixtures;

impl CredentialFixtures {
    /// Cheapest valid work factor, keeps test suites fast
    pub fn hashing_config() -> HashingConfig {
        HashingConfig::minimal()
    }

    /// A hasher using the minimal work factor
    pub fn hasher() -> PasswordHasher {
        match PasswordHasher::new(Self::hashing_config()) {
            Ok(hasher) => hasher,
            Err(e) => panic!("minimal hashing config rejected: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_user::{Sanitize, UserValidator};

    #[test]
    fn test_valid_fixtures_pass_validation() {
        for mut user in [UserFixtures::ada(), UserFixtures::grace(), UserFixtures::padded()] {
            user.sanitize();
            assert!(UserValidator::validate_new(&user).is_valid, "{:?}", user);
        }
    }

    #[test]
    fn test_invalid_fixtures_fail_validation() {
        assert!(!UserValidator::validate_new(&UserFixtures::invalid_email()).is_valid);
        assert!(!UserValidator::validate_new(&UserFixtures::short_password()).is_valid);
    }
}
