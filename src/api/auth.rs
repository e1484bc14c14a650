use std::sync::Arc;

use poem::Request;
use poem_openapi::param::Path;
use poem_openapi::payload::Json;
use poem_openapi::{OpenApi, Tags};

use crate::api::helpers::{CreatedResult, DataResult, created, ok};
use crate::app_data::AppData;
use crate::coordinators::AuthCoordinator;
use crate::types::dto::auth::{
    ForgotPasswordRequest, LoginRequest, RegisterRequest, ResetPasswordRequest, TokenResponse,
};
use crate::types::dto::common::MessageResponse;
use crate::types::dto::user::UserResponse;
use crate::types::internal::RequestContext;

/// Authentication API endpoints
pub struct AuthApi {
    auth_coordinator: AuthCoordinator,
}

impl AuthApi {
    pub fn new(app_data: Arc<AppData>) -> Self {
        Self {
            auth_coordinator: AuthCoordinator::new(app_data),
        }
    }
}

/// API tags for authentication endpoints
#[derive(Tags)]
enum AuthTags {
    /// Sign-up, sign-in and password recovery
    Authentication,
}

#[OpenApi(prefix_path = "/auth")]
impl AuthApi {
    /// Create an account and send the verification email
    #[oai(path = "/register", method = "post", tag = "AuthTags::Authentication")]
    async fn register(&self, req: &Request, body: Json<RegisterRequest>) -> CreatedResult<UserResponse> {
        let ctx = RequestContext::for_api(req);
        let user = self.auth_coordinator.register(&ctx, body.0).await?;
        Ok(created(user))
    }

    /// Sign in with email and password to receive a bearer token
    #[oai(path = "/login", method = "post", tag = "AuthTags::Authentication")]
    async fn login(&self, req: &Request, body: Json<LoginRequest>) -> DataResult<TokenResponse> {
        let ctx = RequestContext::for_api(req);
        Ok(ok(self.auth_coordinator.login(&ctx, body.0).await?))
    }

    /// Confirm an email address with the code from the verification email
    #[oai(path = "/verifyemail/:code", method = "get", tag = "AuthTags::Authentication")]
    async fn verify_email(&self, req: &Request, code: Path<String>) -> DataResult<MessageResponse> {
        let ctx = RequestContext::for_api(req);
        Ok(ok(self.auth_coordinator.verify_email(&ctx, &code.0).await?))
    }

    /// Email a password reset link
    #[oai(path = "/forgotpassword", method = "post", tag = "AuthTags::Authentication")]
    async fn forgot_password(&self, req: &Request, body: Json<ForgotPasswordRequest>) -> DataResult<MessageResponse> {
        let ctx = RequestContext::for_api(req);
        Ok(ok(self.auth_coordinator.forgot_password(&ctx, body.0).await?))
    }

    /// Set a new password using a reset token
    #[oai(path = "/resetpassword/:token", method = "patch", tag = "AuthTags::Authentication")]
    async fn reset_password(
        &self,
        req: &Request,
        token: Path<String>,
        body: Json<ResetPasswordRequest>,
    ) -> DataResult<MessageResponse> {
        let ctx = RequestContext::for_api(req);
        Ok(ok(self.auth_coordinator.reset_password(&ctx, &token.0, body.0).await?))
    }
}
