use poem_openapi::Object;
use serde::{Deserialize, Serialize};

use crate::errors::InternalError;
use crate::types::internal::Validate;
use crate::types::internal::validation::{require_max_length, require_non_empty};

pub const MIN_PASSWORD_LENGTH: usize = 8;

fn validate_new_password(password: &str, password_confirm: &str) -> Result<(), InternalError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(InternalError::validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    if password != password_confirm {
        return Err(InternalError::validation("Passwords do not match"));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), InternalError> {
    require_non_empty("email", email)?;
    match email.trim().split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(InternalError::validation("email must be a valid email address")),
    }
}

/// Sign-up request
#[derive(Object, Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    #[oai(validator(min_length = 1, max_length = 100))]
    pub name: String,

    #[oai(validator(min_length = 3, max_length = 255))]
    pub email: String,

    /// At least 8 characters
    pub password: String,

    /// Must equal `password`
    pub password_confirm: String,

    /// Optional avatar file name or URL
    pub photo: Option<String>,
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), InternalError> {
        require_non_empty("name", &self.name)?;
        require_max_length("name", &self.name, 100)?;
        require_max_length("email", &self.email, 255)?;
        validate_email(&self.email)?;
        validate_new_password(&self.password, &self.password_confirm)
    }
}

/// Sign-in request
#[derive(Object, Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), InternalError> {
        require_non_empty("email", &self.email)?;
        require_non_empty("password", &self.password)
    }
}

/// Response carrying the access token issued at sign-in
#[derive(Object, Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    /// JWT access token for the Authorization header
    pub access_token: String,

    /// Token type (always "Bearer")
    pub token_type: String,

    /// Number of seconds until the access token expires
    pub expires_in: i64,
}

#[derive(Object, Debug, Clone, Serialize, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

impl Validate for ForgotPasswordRequest {
    fn validate(&self) -> Result<(), InternalError> {
        validate_email(&self.email)
    }
}

#[derive(Object, Debug, Clone, Serialize, Deserialize)]
pub struct ResetPasswordRequest {
    pub password: String,
    pub password_confirm: String,
}

impl Validate for ResetPasswordRequest {
    fn validate(&self) -> Result<(), InternalError> {
        validate_new_password(&self.password, &self.password_confirm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(email: &str, password: &str, confirm: &str) -> RegisterRequest {
        RegisterRequest {
            name: "Aiko Tanaka".to_string(),
            email: email.to_string(),
            password: password.to_string(),
            password_confirm: confirm.to_string(),
            photo: None,
        }
    }

    #[test]
    fn test_register_validation() {
        assert!(register("aiko@example.com", "password123", "password123").validate().is_ok());

        let short = register("aiko@example.com", "short", "short").validate().unwrap_err();
        assert_eq!(short.to_string(), "password must be at least 8 characters");

        let mismatch = register("aiko@example.com", "password123", "password124").validate().unwrap_err();
        assert_eq!(mismatch.to_string(), "Passwords do not match");

        assert!(register("not-an-email", "password123", "password123").validate().is_err());
    }

    #[test]
    fn test_reset_validation() {
        let request = ResetPasswordRequest {
            password: "newpassword".to_string(),
            password_confirm: "newpassword".to_string(),
        };
        assert!(request.validate().is_ok());
    }
}
