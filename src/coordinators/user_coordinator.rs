use std::sync::Arc;

use chrono::Utc;
use sea_orm::DatabaseConnection;

use crate::app_data::AppData;
use crate::config::{begin_transaction, commit_transaction};
use crate::errors::InternalError;
use crate::providers::{AuthorizationProvider, MembershipProvider};
use crate::stores::user_store::UserFilter;
use crate::stores::{MembershipStore, UserStore};
use crate::types::dto::common::MessageResponse;
use crate::types::dto::user::{GrantMembershipRequest, MembershipResponse, UserResponse};
use crate::types::internal::{RequestContext, Role, Validate};

/// Profile, membership usage and super admin user management
pub struct UserCoordinator {
    db: DatabaseConnection,
    user_store: Arc<UserStore>,
    membership_store: Arc<MembershipStore>,
    authorization_provider: AuthorizationProvider,
    membership_provider: MembershipProvider,
}

impl UserCoordinator {
    pub fn new(app_data: Arc<AppData>) -> Self {
        Self {
            db: app_data.db.clone(),
            user_store: app_data.user_store.clone(),
            membership_store: app_data.membership_store.clone(),
            authorization_provider: AuthorizationProvider::new(app_data.user_store.clone()),
            membership_provider: MembershipProvider::new(
                app_data.membership_store.clone(),
                app_data.settings.clone(),
            ),
        }
    }

    /// Current user with roles and an up-to-date membership
    pub async fn me(&self, ctx: &RequestContext) -> Result<UserResponse, InternalError> {
        let caller = self.authorization_provider.require_caller(&self.db, ctx).await?;
        let membership = self
            .membership_provider
            .current(&self.db, caller.id(), Utc::now())
            .await?;

        Ok(UserResponse::new(caller.user, caller.roles, Some(membership)))
    }

    /// Record one unit of usage against the caller's daily limit
    pub async fn record_usage(&self, ctx: &RequestContext) -> Result<MembershipResponse, InternalError> {
        let caller = self.authorization_provider.require_caller(&self.db, ctx).await?;
        let membership = self
            .membership_provider
            .record_usage(&self.db, caller.id(), Utc::now())
            .await?;

        Ok(membership.into())
    }

    pub async fn list(&self, ctx: &RequestContext, verified: Option<bool>) -> Result<Vec<UserResponse>, InternalError> {
        let caller = self.authorization_provider.require_caller(&self.db, ctx).await?;
        self.authorization_provider.ensure_super_admin(&caller)?;

        let users = self.user_store.query(&self.db, UserFilter { verified }).await?;
        let mut profiles = Vec::with_capacity(users.len());
        for user in users {
            let roles = self.user_store.get_roles(&self.db, &user.id).await?;
            profiles.push(UserResponse::new(user, roles, None));
        }
        Ok(profiles)
    }

    pub async fn add_role(&self, ctx: &RequestContext, user_id: &str, role: Role) -> Result<UserResponse, InternalError> {
        let txn = begin_transaction(&self.db).await?;
        let caller = self.authorization_provider.require_caller(&txn, ctx).await?;
        self.authorization_provider.ensure_super_admin(&caller)?;

        let target = self.user_store.get_by_id(&txn, user_id).await?;
        self.user_store.add_role(&txn, &target.id, role).await?;
        let roles = self.user_store.get_roles(&txn, &target.id).await?;
        let membership = self.membership_store.get_by_user_id(&txn, &target.id).await.ok();
        commit_transaction(txn).await?;

        Ok(UserResponse::new(target, roles, membership))
    }

    /// Revoke a role; the last remaining role cannot be removed
    pub async fn remove_role(&self, ctx: &RequestContext, user_id: &str, role: Role) -> Result<UserResponse, InternalError> {
        let txn = begin_transaction(&self.db).await?;
        let caller = self.authorization_provider.require_caller(&txn, ctx).await?;
        self.authorization_provider.ensure_super_admin(&caller)?;

        let target = self.user_store.get_by_id(&txn, user_id).await?;
        let mut roles = self.user_store.get_roles(&txn, &target.id).await?;
        if roles.remove(role) && roles.is_empty() {
            return Err(InternalError::conflict("A user must keep at least one role"));
        }
        self.user_store.remove_role(&txn, &target.id, role).await?;
        let membership = self.membership_store.get_by_user_id(&txn, &target.id).await.ok();
        commit_transaction(txn).await?;

        Ok(UserResponse::new(target, roles, membership))
    }

    pub async fn grant_membership(
        &self,
        ctx: &RequestContext,
        user_id: &str,
        request: GrantMembershipRequest,
    ) -> Result<UserResponse, InternalError> {
        request.validate()?;
        let caller = self.authorization_provider.require_caller(&self.db, ctx).await?;
        self.authorization_provider.ensure_super_admin(&caller)?;

        let target = self.user_store.get_by_id(&self.db, user_id).await?;
        let membership = self
            .membership_provider
            .grant_monthly(&self.db, &target.id, request.days, Utc::now())
            .await?;
        let roles = self.user_store.get_roles(&self.db, &target.id).await?;

        Ok(UserResponse::new(target, roles, Some(membership)))
    }

    pub async fn delete(&self, ctx: &RequestContext, user_id: &str) -> Result<MessageResponse, InternalError> {
        let caller = self.authorization_provider.require_caller(&self.db, ctx).await?;
        self.authorization_provider.ensure_super_admin(&caller)?;
        if caller.id() == user_id {
            return Err(InternalError::conflict("Super admins cannot delete their own account"));
        }

        self.user_store.soft_delete(&self.db, user_id).await?;
        tracing::info!(request_id = %ctx.request_id, "User {} deleted by {}", user_id, caller.id());
        Ok(MessageResponse::new("User deleted"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::internal::DomainError;
    use crate::test::utils::{create_test_user, setup_test_app_data};
    use crate::types::internal::MembershipTier;
    use crate::types::internal::auth::Claims;

    fn ctx_for(user_id: &str) -> RequestContext {
        RequestContext::for_cli("test").with_auth(Claims {
            sub: user_id.to_string(),
            exp: 0,
            iat: 0,
        })
    }

    #[tokio::test]
    async fn test_me_returns_roles_and_membership() {
        let (app_data, _mailer) = setup_test_app_data().await;
        let user = create_test_user(&app_data.db, "me@example.com").await;
        let coordinator = UserCoordinator::new(app_data);

        let me = coordinator.me(&ctx_for(&user.id)).await.unwrap();

        assert_eq!(me.email, "me@example.com");
        assert_eq!(me.roles, vec![Role::User]);
        assert_eq!(me.membership.unwrap().tier, MembershipTier::Free);
    }

    #[tokio::test]
    async fn test_usage_limit_maps_to_usage_error() {
        let (app_data, _mailer) = setup_test_app_data().await;
        let user = create_test_user(&app_data.db, "usage@example.com").await;
        let coordinator = UserCoordinator::new(app_data);
        let ctx = ctx_for(&user.id);

        for expected in 1..=10 {
            let membership = coordinator.record_usage(&ctx).await.unwrap();
            assert_eq!(membership.daily_usage_count, expected);
        }
        assert!(matches!(
            coordinator.record_usage(&ctx).await,
            Err(InternalError::Domain(DomainError::UsageLimitExceeded { limit: 10 }))
        ));
    }

    #[tokio::test]
    async fn test_role_management_requires_super_admin() {
        let (app_data, _mailer) = setup_test_app_data().await;
        let admin = create_test_user(&app_data.db, "admin@example.com").await;
        let target = create_test_user(&app_data.db, "target@example.com").await;
        app_data.user_store.add_role(&app_data.db, &admin.id, Role::SuperAdmin).await.unwrap();
        let coordinator = UserCoordinator::new(app_data);

        let denied = coordinator.add_role(&ctx_for(&target.id), &target.id, Role::SuperAdmin).await;
        assert!(matches!(denied, Err(InternalError::Domain(DomainError::Forbidden(_)))));

        let promoted = coordinator
            .add_role(&ctx_for(&admin.id), &target.id, Role::ShopOwner)
            .await
            .unwrap();
        assert_eq!(promoted.roles, vec![Role::User, Role::ShopOwner]);

        let demoted = coordinator
            .remove_role(&ctx_for(&admin.id), &target.id, Role::User)
            .await
            .unwrap();
        assert_eq!(demoted.roles, vec![Role::ShopOwner]);

        let last = coordinator
            .remove_role(&ctx_for(&admin.id), &target.id, Role::ShopOwner)
            .await;
        assert!(matches!(last, Err(InternalError::Domain(DomainError::Conflict(_)))));
    }

    #[tokio::test]
    async fn test_grant_membership() {
        let (app_data, _mailer) = setup_test_app_data().await;
        let admin = create_test_user(&app_data.db, "admin@example.com").await;
        let target = create_test_user(&app_data.db, "target@example.com").await;
        app_data.user_store.add_role(&app_data.db, &admin.id, Role::SuperAdmin).await.unwrap();
        let coordinator = UserCoordinator::new(app_data);

        let granted = coordinator
            .grant_membership(&ctx_for(&admin.id), &target.id, GrantMembershipRequest { days: 30 })
            .await
            .unwrap();

        let membership = granted.membership.unwrap();
        assert_eq!(membership.tier, MembershipTier::Monthly);
        assert_eq!(membership.daily_usage_limit, 100);
        assert!(membership.membership_expire_at.is_some());
    }

    #[tokio::test]
    async fn test_deleted_user_token_stops_working() {
        let (app_data, _mailer) = setup_test_app_data().await;
        let admin = create_test_user(&app_data.db, "admin@example.com").await;
        let target = create_test_user(&app_data.db, "target@example.com").await;
        app_data.user_store.add_role(&app_data.db, &admin.id, Role::SuperAdmin).await.unwrap();
        let coordinator = UserCoordinator::new(app_data);

        coordinator.delete(&ctx_for(&admin.id), &target.id).await.unwrap();

        assert!(matches!(
            coordinator.me(&ctx_for(&target.id)).await,
            Err(InternalError::Domain(DomainError::Unauthorized(_)))
        ));
        let listed = coordinator.list(&ctx_for(&admin.id), None).await.unwrap();
        assert_eq!(listed.len(), 1);
    }
}
