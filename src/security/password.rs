//! Password rules and helpers.

use rand::rngs::OsRng;
use rand::Rng;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::config::SecurityConfig;

/// Characters used by [`generate_password`].
const PASSWORD_ALPHABET: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!@#$%^&*";

/// Every rule the password breaks, in a stable order. Empty means acceptable.
pub fn validate_password_strength(password: &str, min_length: usize) -> Vec<String> {
    let mut errors = Vec::new();

    if password.chars().count() < min_length {
        errors.push(format!(
            "Password must be at least {min_length} characters long."
        ));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        errors.push("Password must contain at least one lowercase letter.".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        errors.push("Password must contain at least one uppercase letter.".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push("Password must contain at least one number.".to_string());
    }

    errors
}

/// Strength rules with the configured minimum length.
pub fn check_password_policy(password: &str, config: &SecurityConfig) -> Vec<String> {
    validate_password_strength(password, config.password_min_length)
}

/// Random password drawn from the OS CSPRNG.
pub fn generate_password(length: usize) -> String {
    let mut rng = OsRng;
    (0..length)
        .map(|_| PASSWORD_ALPHABET[rng.gen_range(0..PASSWORD_ALPHABET.len())] as char)
        .collect()
}

/// Hex SHA-256 of `salt || password`.
pub fn password_digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Constant-time check of `password` against a stored digest.
pub fn verify_password_digest(salt: &str, password: &str, expected_hex: &str) -> bool {
    let actual = password_digest(salt, password);
    let expected = expected_hex.trim().to_ascii_lowercase();
    actual.as_bytes().ct_eq(expected.as_bytes()).into()
}
