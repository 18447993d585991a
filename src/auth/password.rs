// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Salted password hashing (Argon2id, PHC string format).

use std::sync::OnceLock;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

#[derive(Debug, thiserror::Error)]
#[error("password hashing failed: {0}")]
pub struct PasswordError(String);

pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError(e.to_string()))
}

/// Check a password against a stored PHC string.
///
/// An unparseable stored hash verifies as `false`.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => {
            tracing::warn!("Stored password hash is not a valid PHC string");
            false
        }
    }
}

/// Hash used when the account does not exist, generated with the same
/// parameters as real hashes.
pub(super) static ABSENT_USER_HASH: OnceLock<Option<String>> = OnceLock::new();

/// Spend one full verification on a throwaway hash so that logins for unknown
/// users take as long as wrong passwords. Always `false`.
pub fn verify_absent_user(password: &str) -> bool {
    let hash = ABSENT_USER_HASH.get_or_init(|| hash_password("absent-user-placeholder").ok());
    if let Some(hash) = hash {
        let _ = verify_password(password, hash);
    }
    false
}
