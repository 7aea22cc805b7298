//! TOTP construction and backup code handling.

use totp_rs::{Algorithm, Secret, TOTP};

use crate::common::ApiError;
use crate::domains::auth::password;

pub const BACKUP_CODE_COUNT: usize = 10;
pub const BACKUP_CODE_LENGTH: usize = 8;
const TOTP_DIGITS: usize = 6;
const TOTP_PERIOD: u64 = 30;

/// Generate a fresh base32-encoded TOTP secret.
pub fn generate_secret() -> Result<String, ApiError> {
    Ok(Secret::generate_secret().to_encoded().to_string())
}

/// Build a TOTP instance from an encoded secret for a user account.
pub fn build_totp(encoded_secret: &str, account_email: &str, issuer: &str) -> Result<TOTP, ApiError> {
    let secret_bytes = Secret::Encoded(encoded_secret.to_string())
        .to_bytes()
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Failed to decode TOTP secret: {}", e)))?;

    TOTP::new(
        Algorithm::SHA1,
        TOTP_DIGITS,
        1,
        TOTP_PERIOD,
        secret_bytes,
        Some(issuer.to_string()),
        account_email.to_string(),
    )
    .map_err(|e| ApiError::Internal(anyhow::anyhow!("Failed to create TOTP: {}", e)))
}

/// Check a 6-digit code against the secret (current time step, +/- 1 skew).
pub fn check_code(encoded_secret: &str, account_email: &str, issuer: &str, code: &str) -> Result<bool, ApiError> {
    let totp = build_totp(encoded_secret, account_email, issuer)?;
    totp.check_current(code)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("TOTP check error: {}", e)))
}

/// Generate plaintext backup codes (shown to the user exactly once).
pub fn generate_backup_codes() -> Vec<String> {
    use rand::Rng;
    (0..BACKUP_CODE_COUNT)
        .map(|_| {
            rand::thread_rng()
                .sample_iter(&rand::distributions::Alphanumeric)
                .take(BACKUP_CODE_LENGTH)
                .map(char::from)
                .collect::<String>()
                .to_uppercase()
        })
        .collect()
}

/// Hash backup codes for storage.
pub fn hash_backup_codes(codes: &[String]) -> Result<Vec<String>, ApiError> {
    codes.iter().map(|code| password::hash_password(code)).collect()
}

/// Find and remove the matching backup code. Returns the remaining hashes,
/// or None when no code matched.
pub fn consume_backup_code(code: &str, hashes: &[String]) -> Option<Vec<String>> {
    let index = hashes
        .iter()
        .position(|hash| password::verify_password(code, hash).is_ok())?;

    let mut remaining = hashes.to_vec();
    remaining.remove(index);
    Some(remaining)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_codes_shape() {
        let codes = generate_backup_codes();
        assert_eq!(codes.len(), BACKUP_CODE_COUNT);
        for code in &codes {
            assert_eq!(code.len(), BACKUP_CODE_LENGTH);
            assert_eq!(*code, code.to_uppercase());
        }
    }

    #[test]
    fn test_consume_backup_code() {
        let codes = vec!["ABCD1234".to_string(), "EFGH5678".to_string()];
        let hashes = hash_backup_codes(&codes).unwrap();

        let remaining = consume_backup_code("ABCD1234", &hashes).expect("code should match");
        assert_eq!(remaining.len(), 1);

        // The consumed code no longer matches
        assert!(consume_backup_code("ABCD1234", &remaining).is_none());
        // The other one still does
        assert!(consume_backup_code("EFGH5678", &remaining).is_some());
    }

    #[test]
    fn test_totp_roundtrip() {
        let secret = generate_secret().unwrap();
        let totp = build_totp(&secret, "artist@example.com", "encore-test").unwrap();
        let code = totp.generate_current().unwrap();
        assert!(check_code(&secret, "artist@example.com", "encore-test", &code).unwrap());
        assert!(!check_code(&secret, "artist@example.com", "encore-test", "000000").unwrap()
            || code == "000000");
    }

    #[test]
    fn test_otpauth_uri_contains_issuer() {
        let secret = generate_secret().unwrap();
        let totp = build_totp(&secret, "artist@example.com", "encore-test").unwrap();
        let uri = totp.get_url();
        assert!(uri.starts_with("otpauth://totp/"));
        assert!(uri.contains("encore-test"));
    }
}
