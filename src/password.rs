//! Password hashing and validation
//!
//! Hashes are Argon2id PHC strings with the crate's default cost parameters.
//! Every call to `hash` draws a fresh salt.

use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::password_hash::rand_core::OsRng;
use log::{debug, error};

use crate::error::{Error, Result};


/// Bounds of an acceptable password, in characters
pub const MIN_PASSWORD_LENGTH: usize = 4;
pub const MAX_PASSWORD_LENGTH: usize = 100;

/// Minimum length of a new privacy password
pub const MIN_PRIVACY_PASSWORD_LENGTH: usize = 6;


/// Reason a candidate password was rejected
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum PasswordIssue {
    #[display(fmt = "Password must be at least {} characters long", _0)]
    TooShort(usize),
    #[display(fmt = "Password is too long (max {} characters)", MAX_PASSWORD_LENGTH)]
    TooLong,
}


/// Hashes `plaintext` with a random salt
pub fn hash(plaintext: &str) -> Result<String> {

    let salt = SaltString::generate(&mut OsRng);

    let digest = Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map_err(|err| {
            error!("failed to hash password: {}", err);
            Error::Web(actix_web::http::StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        })?;

    Ok(digest.to_string())
}


/// Checks `plaintext` against a digest produced by `hash`
///
/// Malformed digests never verify.
pub fn verify(plaintext: &str, digest: &str) -> bool {

    let parsed = match PasswordHash::new(digest) {
        Ok(parsed) => parsed,
        Err(err) => {
            debug!("refusing malformed password digest: {}", err);
            return false;
        },
    };

    Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .is_ok()
}


/// Checks general password length rules
pub fn validate(password: &str) -> std::result::Result<(), PasswordIssue> {
    validate_with_minimum(password, MIN_PASSWORD_LENGTH)
}


/// Checks the rules for a new privacy password
pub fn validate_privacy(password: &str) -> std::result::Result<(), PasswordIssue> {
    validate_with_minimum(password, MIN_PRIVACY_PASSWORD_LENGTH)
}


fn validate_with_minimum(password: &str, min: usize) -> std::result::Result<(), PasswordIssue> {

    let len = password.chars().count();

    if len < min {
        Err(PasswordIssue::TooShort(min))
    } else if len > MAX_PASSWORD_LENGTH {
        Err(PasswordIssue::TooLong)
    } else {
        Ok(())
    }
}


#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn hash_verifies_own_plaintext_only() {

        let digest = hash("hunter22").unwrap();
        assert!(verify("hunter22", &digest));
        assert!(!verify("hunter22x", &digest));

        let other = hash("hunter22x").unwrap();
        assert!(!verify("hunter22", &other));
    }

    #[test]
    fn hashes_are_salted() {
        assert_ne!(hash("same").unwrap(), hash("same").unwrap());
    }

    #[test]
    fn malformed_digest_never_verifies() {
        assert!(!verify("anything", ""));
        assert!(!verify("anything", "$2a$10$not-an-argon2-digest"));
        assert!(!verify("anything", "plaintext"));
    }

    #[test]
    fn length_rules() {
        assert_eq!(validate("abc"), Err(PasswordIssue::TooShort(4)));
        assert_eq!(validate("abcd"), Ok(()));
        assert_eq!(validate(&"x".repeat(101)), Err(PasswordIssue::TooLong));
        assert_eq!(validate_privacy("abcde"), Err(PasswordIssue::TooShort(6)));
        assert_eq!(validate_privacy("abcdef"), Ok(()));
    }
}
