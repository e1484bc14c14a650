use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use crate::config::ApplicationSettings;
use crate::errors::InternalError;
use crate::errors::internal::CredentialError;
use crate::types::internal::auth::Claims;

/// Issues and validates the HS256 access tokens handed out at sign-in
pub struct TokenProvider {
    settings: Arc<ApplicationSettings>,
}

impl TokenProvider {
    pub fn new(settings: Arc<ApplicationSettings>) -> Self {
        Self { settings }
    }

    /// Lifetime of an access token in seconds
    pub fn expires_in(&self) -> i64 {
        self.settings.jwt_expiration_minutes() * 60
    }

    /// Generate a JWT whose subject is the user id
    pub fn generate_jwt(&self, user_id: &str) -> Result<String, InternalError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            exp: now + self.expires_in(),
            iat: now,
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.settings.jwt_secret().as_bytes()),
        )
        .map_err(|e| InternalError::crypto("jwt_generation", format!("Failed to generate JWT: {}", e)))
    }

    /// Validate a JWT and return its claims
    ///
    /// # Errors
    /// * `CredentialError::ExpiredToken("jwt")` - signature is fine but `exp` has passed
    /// * `CredentialError::InvalidToken` - bad signature or malformed token
    pub fn validate_jwt(&self, token: &str) -> Result<Claims, InternalError> {
        let validation = Validation::new(Algorithm::HS256);

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.settings.jwt_secret().as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => {
                tracing::debug!("Rejected expired JWT");
                InternalError::from(CredentialError::ExpiredToken("jwt".to_string()))
            }
            _ => {
                tracing::warn!("Rejected invalid JWT: {}", e);
                InternalError::from(CredentialError::invalid_token(
                    "jwt",
                    "invalid signature or malformed",
                ))
            }
        })
    }
}

impl fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenProvider")
            .field("settings", &"<redacted>")
            .field("jwt_expiration_minutes", &self.settings.jwt_expiration_minutes())
            .finish()
    }
}
