use std::sync::Arc;

use chrono::{Duration, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::DatabaseConnection;

use crate::app_data::AppData;
use crate::config::{ApplicationSettings, begin_transaction, commit_transaction};
use crate::errors::InternalError;
use crate::errors::internal::CredentialError;
use crate::providers::{CryptoProvider, EmailData, EmailTemplate, Mailer, Recipient, TokenProvider};
use crate::stores::user_store::NewUser;
use crate::stores::{MembershipStore, UserStore};
use crate::types::db::user;
use crate::types::dto::auth::{
    ForgotPasswordRequest, LoginRequest, RegisterRequest, ResetPasswordRequest, TokenResponse,
};
use crate::types::dto::common::MessageResponse;
use crate::types::dto::user::UserResponse;
use crate::types::internal::{RequestContext, Role, RoleSet, Validate};

const RESET_TOKEN_TTL_MINUTES: i64 = 15;

/// Sign-up, sign-in, email verification and password reset workflows
pub struct AuthCoordinator {
    db: DatabaseConnection,
    settings: Arc<ApplicationSettings>,
    user_store: Arc<UserStore>,
    membership_store: Arc<MembershipStore>,
    token_provider: Arc<TokenProvider>,
    crypto_provider: CryptoProvider,
    mailer: Arc<dyn Mailer>,
}

fn first_name(name: &str) -> String {
    name.split_whitespace().next().unwrap_or(name).to_string()
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl AuthCoordinator {
    pub fn new(app_data: Arc<AppData>) -> Self {
        Self {
            db: app_data.db.clone(),
            settings: app_data.settings.clone(),
            user_store: app_data.user_store.clone(),
            membership_store: app_data.membership_store.clone(),
            token_provider: app_data.token_provider.clone(),
            crypto_provider: CryptoProvider::new(),
            mailer: app_data.mailer.clone(),
        }
    }

    /// Create an unverified account with the `user` role and a free membership
    ///
    /// The verification email goes out after the account is committed; a
    /// delivery failure is logged and does not undo the sign-up.
    pub async fn register(&self, ctx: &RequestContext, request: RegisterRequest) -> Result<UserResponse, InternalError> {
        request.validate()?;
        let email = normalize_email(&request.email);

        let password_hash = self.crypto_provider.hash_password(&request.password)?;
        let code = self.crypto_provider.generate_verification_code();
        let code_hash = self
            .crypto_provider
            .hmac_sha256_token(self.settings.token_secret(), &code)?;

        let txn = begin_transaction(&self.db).await?;
        let created = self
            .user_store
            .create(&txn, NewUser {
                name: request.name.trim().to_string(),
                email,
                password_hash,
                photo: request.photo,
                verification_code: Some(code_hash),
            })
            .await?;
        self.user_store.add_role(&txn, &created.id, Role::User).await?;
        let membership = self
            .membership_store
            .create_for_user(&txn, &created.id, self.settings.free_daily_usage_limit())
            .await?;
        commit_transaction(txn).await?;

        tracing::info!(request_id = %ctx.request_id, "Registered user {}", created.id);

        let data = EmailData {
            url: format!("{}/verifyemail/{}", self.settings.client_origin(), code),
            first_name: first_name(&created.name),
            subject: "Your account verification code".to_string(),
        };
        if let Err(e) = self
            .mailer
            .send_templated_email(&Self::recipient(&created), EmailTemplate::VerificationCode, &data)
            .await
        {
            tracing::error!("Failed to send verification email to {}: {}", created.email, e);
        }

        let roles: RoleSet = [Role::User].into_iter().collect();
        Ok(UserResponse::new(created, roles, Some(membership)))
    }

    /// Exchange email and password for an access token
    ///
    /// # Errors
    /// * `InvalidCredentials` - unknown email or wrong password (indistinguishable)
    /// * `EmailNotVerified` - the account has not been verified yet
    pub async fn login(&self, ctx: &RequestContext, request: LoginRequest) -> Result<TokenResponse, InternalError> {
        request.validate()?;

        let found = self
            .user_store
            .find_by_email(&self.db, &normalize_email(&request.email))
            .await?;
        let user = match found {
            Some(user) if self.crypto_provider.verify_password(&request.password, &user.password_hash) => user,
            _ => {
                tracing::warn!(request_id = %ctx.request_id, "Failed sign-in attempt");
                return Err(CredentialError::InvalidCredentials.into());
            }
        };

        if !user.verified {
            return Err(CredentialError::EmailNotVerified.into());
        }

        let access_token = self.token_provider.generate_jwt(&user.id)?;
        tracing::info!(request_id = %ctx.request_id, "User {} signed in", user.id);

        Ok(TokenResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.token_provider.expires_in(),
        })
    }

    pub async fn verify_email(&self, ctx: &RequestContext, code: &str) -> Result<MessageResponse, InternalError> {
        let code_hash = self
            .crypto_provider
            .hmac_sha256_token(self.settings.token_secret(), code)?;

        let user = self
            .user_store
            .find_by_verification_code(&self.db, &code_hash)
            .await?
            .ok_or_else(|| CredentialError::invalid_token("verification_code", "unknown code"))?;

        if user.verified {
            return Err(CredentialError::AlreadyVerified.into());
        }

        let user_id = user.id.clone();
        let mut model: user::ActiveModel = user.into();
        model.verified = Set(true);
        model.verification_code = Set(None);
        self.user_store.update(&self.db, model).await?;

        tracing::info!(request_id = %ctx.request_id, "User {} verified their email", user_id);
        Ok(MessageResponse::new("Email verified successfully"))
    }

    /// Issue a password reset link valid for 15 minutes
    ///
    /// Unknown and unverified emails get the same answer as known ones.
    pub async fn forgot_password(
        &self,
        ctx: &RequestContext,
        request: ForgotPasswordRequest,
    ) -> Result<MessageResponse, InternalError> {
        request.validate()?;
        let message = MessageResponse::new("You will receive a reset email if a user with that email exists");

        let Some(user) = self
            .user_store
            .find_by_email(&self.db, &normalize_email(&request.email))
            .await?
        else {
            tracing::debug!(request_id = %ctx.request_id, "Password reset requested for unknown email");
            return Ok(message);
        };

        if !user.verified {
            tracing::debug!(
                request_id = %ctx.request_id,
                "Password reset requested for unverified user {}",
                user.id
            );
            return Ok(message);
        }

        let token = self.crypto_provider.generate_reset_token();
        let token_hash = self
            .crypto_provider
            .hmac_sha256_token(self.settings.token_secret(), &token)?;
        let expires_at = (Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES)).timestamp();

        let recipient = Self::recipient(&user);
        let name = first_name(&user.name);
        let mut model: user::ActiveModel = user.into();
        model.password_reset_token = Set(Some(token_hash));
        model.password_reset_at = Set(Some(expires_at));
        let updated = self.user_store.update(&self.db, model).await?;

        let data = EmailData {
            url: format!("{}/resetpassword/{}", self.settings.client_origin(), token),
            first_name: name,
            subject: format!("Your password reset token (valid for {}min)", RESET_TOKEN_TTL_MINUTES),
        };
        self.mailer
            .send_templated_email(&recipient, EmailTemplate::ResetPassword, &data)
            .await?;

        tracing::info!(request_id = %ctx.request_id, "Password reset issued for user {}", updated.id);
        Ok(message)
    }

    pub async fn reset_password(
        &self,
        ctx: &RequestContext,
        token: &str,
        request: ResetPasswordRequest,
    ) -> Result<MessageResponse, InternalError> {
        request.validate()?;

        let token_hash = self
            .crypto_provider
            .hmac_sha256_token(self.settings.token_secret(), token)?;
        let user = self
            .user_store
            .find_by_reset_token(&self.db, &token_hash)
            .await?
            .ok_or_else(|| CredentialError::invalid_token("reset", "unknown token"))?;

        let now = Utc::now().timestamp();
        if user.password_reset_at.is_none_or(|expires_at| expires_at < now) {
            return Err(CredentialError::ExpiredToken("reset".to_string()).into());
        }

        let password_hash = self.crypto_provider.hash_password(&request.password)?;
        let user_id = user.id.clone();
        let mut model: user::ActiveModel = user.into();
        model.password_hash = Set(password_hash);
        model.password_reset_token = Set(None);
        model.password_reset_at = Set(None);
        self.user_store.update(&self.db, model).await?;

        tracing::info!(request_id = %ctx.request_id, "User {} reset their password", user_id);
        Ok(MessageResponse::new("Password data updated successfully"))
    }

    fn recipient(user: &user::Model) -> Recipient {
        Recipient {
            email: user.email.clone(),
            name: user.name.clone(),
        }
    }
}
