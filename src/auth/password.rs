//! Salted one-way password derivation. Raw passwords exist only on the
//! stack of these two functions; nothing here logs or returns them.

use argon2::{
    password_hash::{rand_core, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    Hash(String),
}

/// Derive a PHC-format argon2 hash with a fresh random salt.
pub fn hash(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut rand_core::OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| PasswordError::Hash(e.to_string()))
}

/// Verify a password against a stored PHC hash. An unparseable stored hash
/// verifies as false rather than erroring, so a corrupt row presents the
/// same way as a wrong password.
pub fn verify(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let hashed = hash("pw123456").unwrap();
        assert_ne!(hashed, "pw123456");
        assert!(verify("pw123456", &hashed));
        assert!(!verify("pw123457", &hashed));
    }

    #[test]
    fn fresh_salt_per_hash() {
        let a = hash("pw123456").unwrap();
        let b = hash("pw123456").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn corrupt_hash_verifies_false() {
        assert!(!verify("pw123456", "not-a-phc-hash"));
    }
}
