//! Password Hashing
//! Mission: One-way adaptive hashing for stored credentials

use anyhow::{Context, Result};
use bcrypt::DEFAULT_COST;

/// Hash a plaintext password with a fresh random salt.
///
/// Two calls with the same input produce different strings; the salt is
/// embedded in the output so `verify` can recompute.
pub fn hash(plain: &str) -> Result<String> {
    bcrypt::hash(plain, DEFAULT_COST).context("Failed to hash password")
}

/// Verify a plaintext password against a stored bcrypt hash.
///
/// A mismatch or a malformed stored hash both return `false`; callers map
/// that to an invalid-credentials error. bcrypt compares in constant time.
pub fn verify(plain: &str, hashed: &str) -> bool {
    bcrypt::verify(plain, hashed).unwrap_or(false)
}
