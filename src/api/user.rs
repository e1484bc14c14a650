use std::sync::Arc;

use poem::Request;
use poem_openapi::param::{Path, Query};
use poem_openapi::payload::Json;
use poem_openapi::{OpenApi, Tags};

use crate::api::BearerAuth;
use crate::api::helpers::{DataResult, authenticated_context, ok};
use crate::app_data::AppData;
use crate::coordinators::UserCoordinator;
use crate::providers::TokenProvider;
use crate::types::dto::common::MessageResponse;
use crate::types::dto::user::{GrantMembershipRequest, MembershipResponse, UserResponse};
use crate::types::internal::Role;

/// Profile, usage tracking and super admin user management
pub struct UserApi {
    user_coordinator: UserCoordinator,
    token_provider: Arc<TokenProvider>,
}

impl UserApi {
    pub fn new(app_data: Arc<AppData>) -> Self {
        Self {
            token_provider: app_data.token_provider.clone(),
            user_coordinator: UserCoordinator::new(app_data),
        }
    }
}

#[derive(Tags)]
enum UserTags {
    /// Current user and membership
    Users,
    /// Super admin user management
    Admin,
}

#[OpenApi]
impl UserApi {
    /// Current user with roles and membership
    #[oai(path = "/users/me", method = "get", tag = "UserTags::Users")]
    async fn me(&self, req: &Request, auth: BearerAuth) -> DataResult<UserResponse> {
        let ctx = authenticated_context(req, &auth, &self.token_provider)?;
        Ok(ok(self.user_coordinator.me(&ctx).await?))
    }

    /// Record one unit of membership usage; 429 once today's limit is reached
    #[oai(path = "/users/me/usage", method = "post", tag = "UserTags::Users")]
    async fn record_usage(&self, req: &Request, auth: BearerAuth) -> DataResult<MembershipResponse> {
        let ctx = authenticated_context(req, &auth, &self.token_provider)?;
        Ok(ok(self.user_coordinator.record_usage(&ctx).await?))
    }

    /// List users, optionally by verification state
    #[oai(path = "/users", method = "get", tag = "UserTags::Admin")]
    async fn list(
        &self,
        req: &Request,
        auth: BearerAuth,
        verified: Query<Option<bool>>,
    ) -> DataResult<Vec<UserResponse>> {
        let ctx = authenticated_context(req, &auth, &self.token_provider)?;
        Ok(ok(self.user_coordinator.list(&ctx, verified.0).await?))
    }

    #[oai(path = "/users/:user_id/roles/:role", method = "put", tag = "UserTags::Admin")]
    async fn add_role(
        &self,
        req: &Request,
        auth: BearerAuth,
        user_id: Path<String>,
        role: Path<Role>,
    ) -> DataResult<UserResponse> {
        let ctx = authenticated_context(req, &auth, &self.token_provider)?;
        Ok(ok(self.user_coordinator.add_role(&ctx, &user_id.0, role.0).await?))
    }

    #[oai(path = "/users/:user_id/roles/:role", method = "delete", tag = "UserTags::Admin")]
    async fn remove_role(
        &self,
        req: &Request,
        auth: BearerAuth,
        user_id: Path<String>,
        role: Path<Role>,
    ) -> DataResult<UserResponse> {
        let ctx = authenticated_context(req, &auth, &self.token_provider)?;
        Ok(ok(self.user_coordinator.remove_role(&ctx, &user_id.0, role.0).await?))
    }

    /// Grant or extend a monthly membership
    #[oai(path = "/users/:user_id/membership", method = "put", tag = "UserTags::Admin")]
    async fn grant_membership(
        &self,
        req: &Request,
        auth: BearerAuth,
        user_id: Path<String>,
        body: Json<GrantMembershipRequest>,
    ) -> DataResult<UserResponse> {
        let ctx = authenticated_context(req, &auth, &self.token_provider)?;
        Ok(ok(self.user_coordinator.grant_membership(&ctx, &user_id.0, body.0).await?))
    }

    #[oai(path = "/users/:user_id", method = "delete", tag = "UserTags::Admin")]
    async fn delete(&self, req: &Request, auth: BearerAuth, user_id: Path<String>) -> DataResult<MessageResponse> {
        let ctx = authenticated_context(req, &auth, &self.token_provider)?;
        Ok(ok(self.user_coordinator.delete(&ctx, &user_id.0).await?))
    }
}
