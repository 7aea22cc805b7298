//! Password hashing, verification, and strength validation.

use argon2::password_hash::{rand_core::OsRng, PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};

use crate::common::ApiError;

/// Hash a plaintext password with Argon2id and a fresh salt.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Failed to hash password: {}", e)))
}

/// Verify `password` against a stored hash. Returns `Ok(())` on match.
pub fn verify_password(password: &str, hash: &str) -> Result<(), ApiError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Invalid password hash: {}", e)))?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::bad_request("Invalid email or password"))
}

/// Validate password strength: 8..=128 chars with at least one letter and
/// one digit.
pub fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.len() < 8 {
        return Err(ApiError::bad_request(
            "Password must be at least 8 characters long",
        ));
    }

    if password.len() > 128 {
        return Err(ApiError::bad_request(
            "Password must be at most 128 characters long",
        ));
    }

    if !password.chars().any(|c| c.is_alphabetic()) {
        return Err(ApiError::bad_request(
            "Password must contain at least one letter",
        ));
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(ApiError::bad_request(
            "Password must contain at least one number",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_roundtrip() {
        let hash = hash_password("correct horse 1").unwrap();
        assert!(verify_password("correct horse 1", &hash).is_ok());
        assert!(verify_password("wrong password 2", &hash).is_err());
    }

    #[test]
    fn test_hashes_are_salted() {
        let h1 = hash_password("same password 1").unwrap();
        let h2 = hash_password("same password 1").unwrap();
        assert_ne!(h1, h2);
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("goodpass1").is_ok());
        assert!(validate_password("short1").is_err());
        assert!(validate_password("nodigitshere").is_err());
        assert!(validate_password("12345678").is_err());
        assert!(validate_password(&"a1".repeat(100)).is_err());
    }
}
