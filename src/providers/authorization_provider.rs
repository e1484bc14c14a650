use std::sync::Arc;

use sea_orm::ConnectionTrait;

use crate::errors::InternalError;
use crate::errors::internal::DomainError;
use crate::stores::UserStore;
use crate::types::db::{order, shop};
use crate::types::internal::{Caller, RequestContext, Role};

/// Resolves the caller behind a request and enforces ownership rules
///
/// Every check fails with `Forbidden` except `require_caller`, which fails
/// with `Unauthorized`.
pub struct AuthorizationProvider {
    user_store: Arc<UserStore>,
}

impl AuthorizationProvider {
    pub fn new(user_store: Arc<UserStore>) -> Self {
        Self { user_store }
    }

    /// Load the authenticated user and their roles
    ///
    /// A token whose user has since been deleted is treated as not logged in.
    pub async fn require_caller(
        &self,
        conn: &impl ConnectionTrait,
        ctx: &RequestContext,
    ) -> Result<Caller, InternalError> {
        let user_id = ctx.user_id()?;

        let user = self
            .user_store
            .get_by_id(conn, user_id)
            .await
            .map_err(|e| match e {
                InternalError::Domain(DomainError::NotFound { .. }) => {
                    InternalError::unauthorized("The user belonging to this token no longer exists")
                }
                other => other,
            })?;
        let roles = self.user_store.get_roles(conn, &user.id).await?;

        Ok(Caller { user, roles })
    }

    pub fn is_shop_owner_or_admin(&self, caller: &Caller, shop: &shop::Model) -> bool {
        caller.is_super_admin() || shop.owner_id == caller.id()
    }

    /// Shop mutations and product management
    pub fn ensure_shop_owner_or_admin(&self, caller: &Caller, shop: &shop::Model) -> Result<(), InternalError> {
        if self.is_shop_owner_or_admin(caller, shop) {
            return Ok(());
        }

        tracing::warn!("User {} denied management of shop {}", caller.id(), shop.id);
        Err(InternalError::forbidden("Only the shop owner can manage this shop"))
    }

    /// Orders and their payments are visible to the buyer, the shop owner and super admins
    pub fn ensure_order_visible(
        &self,
        caller: &Caller,
        order: &order::Model,
        shop: &shop::Model,
    ) -> Result<(), InternalError> {
        if order.user_id == caller.id() || self.is_shop_owner_or_admin(caller, shop) {
            return Ok(());
        }

        tracing::warn!("User {} denied access to order {}", caller.id(), order.id);
        Err(InternalError::forbidden("You do not have access to this order"))
    }

    /// Paying for an order is reserved to the buyer (or a super admin)
    pub fn ensure_order_buyer_or_admin(&self, caller: &Caller, order: &order::Model) -> Result<(), InternalError> {
        if caller.is_super_admin() || order.user_id == caller.id() {
            return Ok(());
        }

        tracing::warn!("User {} denied payment of order {}", caller.id(), order.id);
        Err(InternalError::forbidden("Only the buyer can pay for this order"))
    }

    pub fn ensure_super_admin(&self, caller: &Caller) -> Result<(), InternalError> {
        if caller.has_role(Role::SuperAdmin) {
            return Ok(());
        }

        tracing::warn!("User {} denied super admin operation", caller.id());
        Err(InternalError::forbidden("Super admin role required"))
    }
}
