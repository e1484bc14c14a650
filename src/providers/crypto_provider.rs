use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use base64::{Engine as _, engine::general_purpose};
use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;

use crate::errors::InternalError;
use crate::errors::internal::CredentialError;

type HmacSha256 = Hmac<Sha256>;

const VERIFICATION_CODE_LENGTH: usize = 20;

/// Password hashing, token hashing and random secret generation
pub struct CryptoProvider;

impl CryptoProvider {
    pub fn new() -> Self {
        Self
    }

    /// Hash a password with Argon2id and a random salt (PHC string format)
    pub fn hash_password(&self, password: &str) -> Result<String, InternalError> {
        let salt = SaltString::generate(&mut rand_core::OsRng);

        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| CredentialError::PasswordHashingFailed(e.to_string()).into())
    }

    /// Check a password against a stored PHC hash
    ///
    /// Unparseable hashes count as a mismatch.
    pub fn verify_password(&self, password: &str, password_hash: &str) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(password_hash) else {
            return false;
        };

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }

    /// Compute HMAC-SHA256 of a token and return it as hexadecimal
    ///
    /// Verification codes and reset tokens are only ever stored in this form.
    pub fn hmac_sha256_token(&self, key: &str, token: &str) -> Result<String, InternalError> {
        let mut mac = HmacSha256::new_from_slice(key.as_bytes())
            .map_err(|e| InternalError::crypto("hmac_sha256", e.to_string()))?;
        mac.update(token.as_bytes());
        Ok(format!("{:x}", mac.finalize().into_bytes()))
    }

    /// Random alphanumeric code sent in the verification email
    pub fn generate_verification_code(&self) -> String {
        const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

        let mut rng = rand::rng();
        (0..VERIFICATION_CODE_LENGTH)
            .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
            .collect()
    }

    /// URL-safe password reset token (32 random bytes)
    pub fn generate_reset_token(&self) -> String {
        let random_bytes: [u8; 32] = rand::rng().random();
        general_purpose::URL_SAFE_NO_PAD.encode(random_bytes)
    }
}

impl Default for CryptoProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_verifies() {
        let crypto = CryptoProvider::new();
        let hash = crypto.hash_password("ramen-lover-42").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(crypto.verify_password("ramen-lover-42", &hash));
        assert!(!crypto.verify_password("wrong-password", &hash));
    }

    #[test]
    fn test_same_password_gets_different_salts() {
        let crypto = CryptoProvider::new();
        let first = crypto.hash_password("password123").unwrap();
        let second = crypto.hash_password("password123").unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn test_malformed_hash_never_verifies() {
        let crypto = CryptoProvider::new();
        assert!(!crypto.verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn test_hmac_is_deterministic_per_key() {
        let crypto = CryptoProvider::new();

        let first = crypto.hmac_sha256_token("key", "token").unwrap();
        let second = crypto.hmac_sha256_token("key", "token").unwrap();
        let other_key = crypto.hmac_sha256_token("other-key", "token").unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
        assert_ne!(first, other_key);
    }

    #[test]
    fn test_verification_code_shape() {
        let crypto = CryptoProvider::new();
        let code = crypto.generate_verification_code();

        assert_eq!(code.len(), 20);
        assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(code, crypto.generate_verification_code());
    }

    #[test]
    fn test_reset_token_is_url_safe() {
        let crypto = CryptoProvider::new();
        let token = crypto.generate_reset_token();

        assert_eq!(token.len(), 43);
        assert!(!token.contains('+') && !token.contains('/') && !token.contains('='));
    }
}
