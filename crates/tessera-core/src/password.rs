//! Password hashing boundary.
//!
//! Wraps bcrypt so callers only see [`PasswordError`]. `bcrypt::verify` compares the
//! derived hash in constant time, so a wrong password takes as long to reject as a
//! right one takes to accept.

use bcrypt::{hash, verify};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password does not match")]
    Mismatch,
    #[error("failed to hash password: {0}")]
    Hash(#[source] bcrypt::BcryptError),
    #[error("failed to verify password: {0}")]
    Verify(#[source] bcrypt::BcryptError),
}

pub fn hash_password_with_cost(password: &str, cost: u32) -> Result<String, PasswordError> {
    hash(password, cost).map_err(PasswordError::Hash)
}

/// Returns `Ok(())` when `password` matches `hashed`, [`PasswordError::Mismatch`] otherwise.
pub fn verify_password(password: &str, hashed: &str) -> Result<(), PasswordError> {
    match verify(password, hashed) {
        Ok(true) => Ok(()),
        Ok(false) => Err(PasswordError::Mismatch),
        Err(e) => Err(PasswordError::Verify(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_COST: u32 = 4 /* bcrypt minimum cost */;

    #[test]
    fn test_hash_and_verify() {
        let hashed = hash_password_with_cost("hunter22", TEST_COST).unwrap();
        assert_ne!(hashed, "hunter22");
        assert!(verify_password("hunter22", &hashed).is_ok());
    }

    #[test]
    fn test_wrong_password_is_mismatch() {
        let hashed = hash_password_with_cost("hunter22", TEST_COST).unwrap();
        let result = verify_password("hunter23", &hashed);
        assert!(matches!(result, Err(PasswordError::Mismatch)));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password_with_cost("same-password", TEST_COST).unwrap();
        let b = hash_password_with_cost("same-password", TEST_COST).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_garbage_hash_is_verify_error() {
        let result = verify_password("hunter22", "not-a-bcrypt-hash");
        assert!(matches!(result, Err(PasswordError::Verify(_))));
    }
}
