use crate::errors::internal::{CredentialError, DomainError, InternalError};
use poem_openapi::error::AuthorizationError;
use poem_openapi::{ApiResponse, Object, payload::Json};
use std::fmt;

/// Error body returned by every failing endpoint
#[derive(Object, Debug, Clone)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,
}

/// API error type shared by all endpoints
#[derive(ApiResponse, Debug)]
#[oai(bad_request_handler = "bad_request_handler")]
pub enum ApiError {
    /// Malformed or invalid input
    #[oai(status = 400)]
    BadRequest(Json<ErrorResponse>),

    /// Missing, invalid or expired credentials
    #[oai(status = 401)]
    Unauthorized(Json<ErrorResponse>),

    /// Caller lacks permission for the resource
    #[oai(status = 403)]
    Forbidden(Json<ErrorResponse>),

    /// Resource does not exist
    #[oai(status = 404)]
    NotFound(Json<ErrorResponse>),

    /// Lifecycle or uniqueness conflict
    #[oai(status = 409)]
    Conflict(Json<ErrorResponse>),

    /// Membership usage limit reached
    #[oai(status = 429)]
    TooManyRequests(Json<ErrorResponse>),

    /// Internal server error
    #[oai(status = 500)]
    InternalError(Json<ErrorResponse>),
}

/// Framework extraction failures; a missing bearer token is a 401, not a 400
fn bad_request_handler(err: poem::Error) -> ApiError {
    if err.is::<AuthorizationError>() {
        return ApiError::unauthorized("You are not logged in");
    }
    ApiError::bad_request(err.to_string())
}

fn body(message: impl Into<String>) -> Json<ErrorResponse> {
    Json(ErrorResponse {
        error: message.into(),
    })
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(body(message))
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(body(message))
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(body(message))
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(body(message))
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(body(message))
    }

    pub fn too_many_requests(message: impl Into<String>) -> Self {
        ApiError::TooManyRequests(body(message))
    }

    /// Generic 500; internal details are never exposed
    pub fn internal_server_error() -> Self {
        ApiError::InternalError(body("An internal error occurred"))
    }

    /// Convert InternalError to ApiError
    ///
    /// This is the explicit conversion point from internal errors to API errors.
    /// Infrastructure failures are logged and collapsed into a generic 500.
    pub fn from_internal_error(err: InternalError) -> Self {
        match &err {
            InternalError::Database(db_err) => {
                tracing::error!("Database error: {}", db_err);
                Self::internal_server_error()
            }
            InternalError::Parse { value_type, .. } => {
                tracing::error!("Parse error for {}: {}", value_type, err);
                Self::internal_server_error()
            }
            InternalError::Crypto { operation, .. } => {
                tracing::error!("Crypto error in {}: {}", operation, err);
                Self::internal_server_error()
            }
            InternalError::Notification(notification_err) => {
                tracing::error!("Notification error: {}", notification_err);
                Self::internal_server_error()
            }

            InternalError::Domain(domain_err) => match domain_err {
                DomainError::Validation(_) => Self::bad_request(err.to_string()),
                DomainError::NotFound { .. } => Self::not_found(err.to_string()),
                DomainError::Unauthorized(_) => Self::unauthorized(err.to_string()),
                DomainError::Forbidden(_) => {
                    tracing::warn!("Forbidden: {}", err);
                    Self::forbidden(err.to_string())
                }
                DomainError::Conflict(_)
                | DomainError::InvalidTransition { .. }
                | DomainError::ConcurrentModification { .. } => Self::conflict(err.to_string()),
                DomainError::UsageLimitExceeded { .. } => Self::too_many_requests(err.to_string()),
            },

            InternalError::Credential(credential_err) => match credential_err {
                CredentialError::InvalidCredentials
                | CredentialError::EmailNotVerified
                | CredentialError::AlreadyVerified => Self::bad_request(err.to_string()),
                CredentialError::DuplicateEmail(_) => {
                    Self::conflict("User with that email already exists")
                }
                CredentialError::InvalidToken { token_type, .. } if token_type == "jwt" => {
                    Self::unauthorized("Invalid or missing access token")
                }
                CredentialError::ExpiredToken(token_type) if token_type == "jwt" => {
                    Self::unauthorized("Access token has expired")
                }
                CredentialError::InvalidToken { .. } => {
                    Self::bad_request("Invalid or expired token")
                }
                CredentialError::ExpiredToken(_) => Self::bad_request("Invalid or expired token"),
                CredentialError::PasswordHashingFailed(_) => {
                    tracing::error!("Password hashing failed: {}", err);
                    Self::internal_server_error()
                }
            },
        }
    }

    /// Get the error message from the error variant
    pub fn message(&self) -> String {
        self.body().error.clone()
    }

    /// Get the HTTP status code from the error variant
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::TooManyRequests(_) => 429,
            ApiError::InternalError(_) => 500,
        }
    }

    fn body(&self) -> &ErrorResponse {
        match self {
            ApiError::BadRequest(json)
            | ApiError::Unauthorized(json)
            | ApiError::Forbidden(json)
            | ApiError::NotFound(json)
            | ApiError::Conflict(json)
            | ApiError::TooManyRequests(json)
            | ApiError::InternalError(json) => &json.0,
        }
    }
}

impl From<InternalError> for ApiError {
    fn from(err: InternalError) -> Self {
        Self::from_internal_error(err)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}
