//! Test Data Generators
//!
//! Fake users for integration tests and proptest strategies that keep
//! the user invariants (valid email, password within bounds).

use std::sync::atomic::{AtomicU64, Ordering};

use fake::faker::internet::en::{Password, SafeEmail};
use fake::faker::lorem::en::Sentence;
use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;
use proptest::prelude::*;

use domain_user::{User, PASSWORD_MAX_CHARS, PASSWORD_MIN_CHARS};

static EMAIL_SEQ: AtomicU64 = AtomicU64::new(0);

/// An email that no other call in this process returns
pub fn unique_email() -> String {
    let seq = EMAIL_SEQ.fetch_add(1, Ordering::Relaxed);
    let email: String = SafeEmail().fake();
    format!("u{}.{}", seq, email)
}

/// A valid new user with fake names and a unique email
pub fn fake_user() -> User {
    let password: String = Password(PASSWORD_MIN_CHARS + 4..32).fake();
    let first: String = FirstName().fake();
    let last: String = LastName().fake();
    let description: String = Sentence(2..5).fake();

    User::new(unique_email(), password, first, last)
        .with_description(description)
}

/// Strategy for syntactically valid email addresses
pub fn email_strategy() -> impl Strategy<Value = String> {
    ("[a-z][a-z0-9]{0,11}", "[a-z]{2,10}", prop_oneof![Just("com"), Just("org"), Just("net")])
        .prop_map(|(local, domain, tld)| format!("{}@{}.{}", local, domain, tld))
}

/// Strategy for passwords within the accepted length bounds
pub fn password_strategy() -> impl Strategy<Value = String> {
    proptest::collection::vec(proptest::char::range('!', '~'), PASSWORD_MIN_CHARS..=PASSWORD_MAX_CHARS)
        .prop_map(|chars| chars.into_iter().collect())
}

/// Strategy for passwords that are too short
pub fn short_password_strategy() -> impl Strategy<Value = String> {
    proptest::collection::vec(proptest::char::range('!', '~'), 1..PASSWORD_MIN_CHARS)
        .prop_map(|chars| chars.into_iter().collect())
}

/// Strategy for names, possibly empty
pub fn name_strategy() -> impl Strategy<Value = String> {
    "[A-Z][a-z]{0,15}|"
}

/// Strategy for valid new users
pub fn user_strategy() -> impl Strategy<Value = User> {
    (email_strategy(), password_strategy(), name_strategy(), name_strategy())
        .prop_map(|(email, password, first, last)| User::new(email, password, first, last))
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_user::UserValidator;

    #[test]
    fn test_unique_emails_differ() {
        assert_ne!(unique_email(), unique_email());
    }

    #[test]
    fn test_fake_user_is_valid() {
        let user = fake_user();
        assert!(UserValidator::validate_new(&user).is_valid, "{:?}", user);
    }

    proptest! {
        #[test]
        fn prop_generated_users_are_valid(user in user_strategy()) {
            prop_assert!(UserValidator::validate_new(&user).is_valid);
        }

        #[test]
        fn prop_short_passwords_are_rejected(password in short_password_strategy()) {
            prop_assert!(!UserValidator::validate_password(&password).is_valid);
        }
    }
}
