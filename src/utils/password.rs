use bcrypt::{DEFAULT_COST, hash, verify};
use data_encoding::BASE64URL_NOPAD;
use rand::RngCore;
use rand::rngs::OsRng;

use crate::utils::errors::AppError;

pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::internal(anyhow::anyhow!("Failed to hash password: {}", e)))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    verify(password, hash)
        .map_err(|e| AppError::internal(anyhow::anyhow!("Failed to verify password: {}", e)))
}

// Refresh tokens are hashed with the same memory-hard primitive as passwords.
// The aliases keep call sites honest about which secret they are handling.

pub fn hash_token(token: &str) -> Result<String, AppError> {
    hash_password(token)
}

pub fn verify_token_hash(token: &str, token_hash: &str) -> Result<bool, AppError> {
    verify_password(token, token_hash)
}

/// Generate an opaque refresh token: 48 random bytes, URL-safe base64.
///
/// The raw value is handed to the client once; only its bcrypt hash is stored.
pub fn generate_opaque_token() -> String {
    let mut bytes = [0u8; 48];
    OsRng.fill_bytes(&mut bytes);
    BASE64URL_NOPAD.encode(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("secret-password").unwrap();
        assert!(verify_password("secret-password", &hash).unwrap());
        assert!(!verify_password("wrong-password", &hash).unwrap());
    }

    #[test]
    fn test_token_aliases_round_trip() {
        let raw = generate_opaque_token();
        let hash = hash_token(&raw).unwrap();
        assert!(verify_token_hash(&raw, &hash).unwrap());
        assert!(!verify_token_hash(&generate_opaque_token(), &hash).unwrap());
    }

    #[test]
    fn test_opaque_tokens_are_unique_and_url_safe() {
        let a = generate_opaque_token();
        let b = generate_opaque_token();
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }
}
