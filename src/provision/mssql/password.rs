//! SQL Server password complexity policy.
//!
//! See <https://learn.microsoft.com/en-us/sql/relational-databases/security/password-policy>.

use thiserror::Error;

/// Minimum password length accepted by SQL Server.
pub const MIN_PASSWORD_LEN: usize = 10;

/// Non-alphanumeric characters that count towards the "special" class.
pub const SPECIAL_CHARS: &str = "!@#$%^&*()_-+={}[]\\|/<>~,.;:'\"";

/// Number of character classes a password must draw from.
const REQUIRED_CLASSES: usize = 3;

/// Why a password was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordPolicyError {
    #[error("password can't be empty")]
    Empty,

    #[error("password is too short (must be at least {min} chars)")]
    TooShort { min: usize },

    #[error(
        "password doesn't meet the complexity requirements \
         (must contain 3 out of 4 char types: lowercase char, uppercase char, digit, non-alphanumeric)"
    )]
    TooSimple,
}

/// Check `password` against the SQL Server policy.
pub fn validate_password(password: &str) -> Result<(), PasswordPolicyError> {
    if password.is_empty() {
        return Err(PasswordPolicyError::Empty);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(PasswordPolicyError::TooShort {
            min: MIN_PASSWORD_LEN,
        });
    }
    if !is_complex_enough(password) {
        return Err(PasswordPolicyError::TooSimple);
    }
    Ok(())
}

fn is_complex_enough(password: &str) -> bool {
    let mut seen = [false; 4];
    let mut matched = 0;

    for c in password.chars() {
        let class = if c.is_ascii_lowercase() {
            0
        } else if c.is_ascii_uppercase() {
            1
        } else if c.is_ascii_digit() {
            2
        } else if SPECIAL_CHARS.contains(c) {
            3
        } else {
            continue;
        };

        if !seen[class] {
            seen[class] = true;
            matched += 1;
            if matched >= REQUIRED_CLASSES {
                return true;
            }
        }
    }
    false
}
