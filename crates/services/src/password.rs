//! Password digests.
//!
//! Passwords are stored as the hex SHA-256 of the password concatenated with
//! a fixed application salt. The digest must stay byte-compatible with
//! existing stored hashes, so the salt is a constant rather than per-user.

use sha2::{Digest, Sha256};

const PASSWORD_SALT: &str = "patente_hub_salt_2024_production_v2";

/// Digest of a password as stored on the user record.
#[must_use]
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(PASSWORD_SALT.as_bytes());
    hex::encode(hasher.finalize())
}

/// Whether `password` matches a stored digest.
#[must_use]
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    hash_password(password) == stored_hash
}
