use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::app_data::AppData;
use crate::config::{begin_transaction, commit_transaction};
use crate::errors::InternalError;
use crate::providers::AuthorizationProvider;
use crate::stores::shop_store::{NewShop, ShopChanges, ShopFilter};
use crate::stores::{ShopStore, UserStore};
use crate::types::dto::common::MessageResponse;
use crate::types::dto::shop::{CreateShopRequest, ShopResponse, UpdateShopRequest};
use crate::types::internal::{RequestContext, Role, Validate};

pub struct ShopCoordinator {
    db: DatabaseConnection,
    shop_store: Arc<ShopStore>,
    user_store: Arc<UserStore>,
    authorization_provider: AuthorizationProvider,
}

impl ShopCoordinator {
    pub fn new(app_data: Arc<AppData>) -> Self {
        Self {
            db: app_data.db.clone(),
            shop_store: app_data.shop_store.clone(),
            user_store: app_data.user_store.clone(),
            authorization_provider: AuthorizationProvider::new(app_data.user_store.clone()),
        }
    }

    /// Open a shop owned by the caller, granting `shop_owner` when missing
    pub async fn create(&self, ctx: &RequestContext, request: CreateShopRequest) -> Result<ShopResponse, InternalError> {
        request.validate()?;

        let txn = begin_transaction(&self.db).await?;
        let caller = self.authorization_provider.require_caller(&txn, ctx).await?;
        let shop = self
            .shop_store
            .create(&txn, NewShop {
                name: request.name.trim().to_string(),
                description: request.description.unwrap_or_default(),
                owner_id: caller.id().to_string(),
            })
            .await?;
        if !caller.has_role(Role::ShopOwner) {
            self.user_store.add_role(&txn, caller.id(), Role::ShopOwner).await?;
        }
        commit_transaction(txn).await?;

        tracing::info!(request_id = %ctx.request_id, "Shop {} opened by {}", shop.id, shop.owner_id);
        Ok(shop.into())
    }

    pub async fn list(&self, ctx: &RequestContext, owner_id: Option<String>) -> Result<Vec<ShopResponse>, InternalError> {
        self.authorization_provider.require_caller(&self.db, ctx).await?;

        let shops = self.shop_store.query(&self.db, ShopFilter { owner_id }).await?;
        Ok(shops.into_iter().map(ShopResponse::from).collect())
    }

    pub async fn get(&self, ctx: &RequestContext, shop_id: &str) -> Result<ShopResponse, InternalError> {
        self.authorization_provider.require_caller(&self.db, ctx).await?;
        Ok(self.shop_store.get_by_id(&self.db, shop_id).await?.into())
    }

    pub async fn update(
        &self,
        ctx: &RequestContext,
        shop_id: &str,
        request: UpdateShopRequest,
    ) -> Result<ShopResponse, InternalError> {
        request.validate()?;
        let caller = self.authorization_provider.require_caller(&self.db, ctx).await?;
        let shop = self.shop_store.get_by_id(&self.db, shop_id).await?;
        self.authorization_provider.ensure_shop_owner_or_admin(&caller, &shop)?;

        let updated = self
            .shop_store
            .update(&self.db, shop, ShopChanges {
                name: request.name.map(|name| name.trim().to_string()),
                description: request.description,
            })
            .await?;
        Ok(updated.into())
    }

    pub async fn delete(&self, ctx: &RequestContext, shop_id: &str) -> Result<MessageResponse, InternalError> {
        let caller = self.authorization_provider.require_caller(&self.db, ctx).await?;
        let shop = self.shop_store.get_by_id(&self.db, shop_id).await?;
        self.authorization_provider.ensure_shop_owner_or_admin(&caller, &shop)?;

        self.shop_store.soft_delete(&self.db, &shop.id).await?;
        tracing::info!(request_id = %ctx.request_id, "Shop {} deleted by {}", shop.id, caller.id());
        Ok(MessageResponse::new("Shop deleted"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::internal::DomainError;
    use crate::test::utils::{create_test_user, setup_test_app_data};
    use crate::types::internal::auth::Claims;

    fn ctx_for(user_id: &str) -> RequestContext {
        RequestContext::for_cli("test").with_auth(Claims {
            sub: user_id.to_string(),
            exp: 0,
            iat: 0,
        })
    }

    fn ramen_house() -> CreateShopRequest {
        CreateShopRequest {
            name: "Ramen House".to_string(),
            description: Some("Tonkotsu specialists".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_makes_caller_owner() {
        let (app_data, _mailer) = setup_test_app_data().await;
        let user = create_test_user(&app_data.db, "owner@example.com").await;
        let coordinator = ShopCoordinator::new(app_data.clone());
        let ctx = ctx_for(&user.id);

        let shop = coordinator.create(&ctx, ramen_house()).await.unwrap();
        assert_eq!(shop.owner_id, user.id);

        let fetched = coordinator.get(&ctx, &shop.id).await.unwrap();
        assert_eq!(fetched.name, "Ramen House");
        assert_eq!(fetched.description, "Tonkotsu specialists");

        let roles = app_data.user_store.get_roles(&app_data.db, &user.id).await.unwrap();
        assert!(roles.has(Role::ShopOwner));
    }

    #[tokio::test]
    async fn test_only_owner_updates_and_deletes() {
        let (app_data, _mailer) = setup_test_app_data().await;
        let owner = create_test_user(&app_data.db, "owner@example.com").await;
        let stranger = create_test_user(&app_data.db, "stranger@example.com").await;
        let coordinator = ShopCoordinator::new(app_data);
        let shop = coordinator.create(&ctx_for(&owner.id), ramen_house()).await.unwrap();

        let rename = UpdateShopRequest {
            name: Some("Hijacked".to_string()),
            description: None,
        };
        assert!(matches!(
            coordinator.update(&ctx_for(&stranger.id), &shop.id, rename.clone()).await,
            Err(InternalError::Domain(DomainError::Forbidden(_)))
        ));
        assert!(matches!(
            coordinator.delete(&ctx_for(&stranger.id), &shop.id).await,
            Err(InternalError::Domain(DomainError::Forbidden(_)))
        ));

        let renamed = coordinator.update(&ctx_for(&owner.id), &shop.id, rename).await.unwrap();
        assert_eq!(renamed.name, "Hijacked");
        assert_eq!(renamed.description, "Tonkotsu specialists");

        coordinator.delete(&ctx_for(&owner.id), &shop.id).await.unwrap();
        assert!(matches!(
            coordinator.get(&ctx_for(&owner.id), &shop.id).await,
            Err(InternalError::Domain(DomainError::NotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn test_anonymous_is_unauthorized() {
        let (app_data, _mailer) = setup_test_app_data().await;
        let coordinator = ShopCoordinator::new(app_data);

        let result = coordinator.create(&RequestContext::for_cli("test"), ramen_house()).await;
        assert!(matches!(result, Err(InternalError::Domain(DomainError::Unauthorized(_)))));
    }
}
