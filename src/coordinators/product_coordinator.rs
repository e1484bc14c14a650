use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::app_data::AppData;
use crate::errors::InternalError;
use crate::providers::AuthorizationProvider;
use crate::stores::product_store::{NewProduct, ProductChanges, ProductFilter};
use crate::stores::{ProductStore, ShopStore};
use crate::types::dto::common::MessageResponse;
use crate::types::dto::product::{
    CreateProductRequest, ProductResponse, UpdateProductRequest, UpdateStockRequest,
};
use crate::types::internal::{RequestContext, Validate};

/// Catalogue management under `/shops/{shop_id}/products`
pub struct ProductCoordinator {
    db: DatabaseConnection,
    shop_store: Arc<ShopStore>,
    product_store: Arc<ProductStore>,
    authorization_provider: AuthorizationProvider,
}

impl ProductCoordinator {
    pub fn new(app_data: Arc<AppData>) -> Self {
        Self {
            db: app_data.db.clone(),
            shop_store: app_data.shop_store.clone(),
            product_store: app_data.product_store.clone(),
            authorization_provider: AuthorizationProvider::new(app_data.user_store.clone()),
        }
    }

    pub async fn create(
        &self,
        ctx: &RequestContext,
        shop_id: &str,
        request: CreateProductRequest,
    ) -> Result<ProductResponse, InternalError> {
        request.validate()?;
        let caller = self.authorization_provider.require_caller(&self.db, ctx).await?;
        let shop = self.shop_store.get_by_id(&self.db, shop_id).await?;
        self.authorization_provider.ensure_shop_owner_or_admin(&caller, &shop)?;

        let product = self
            .product_store
            .create(&self.db, NewProduct {
                shop_id: shop.id,
                name: request.name.trim().to_string(),
                description: request.description.unwrap_or_default(),
                price: request.price,
                stock: request.stock,
            })
            .await?;

        tracing::info!(request_id = %ctx.request_id, "Product {} added to shop {}", product.id, product.shop_id);
        Ok(product.into())
    }

    pub async fn list(
        &self,
        ctx: &RequestContext,
        shop_id: &str,
        in_stock: Option<bool>,
    ) -> Result<Vec<ProductResponse>, InternalError> {
        self.authorization_provider.require_caller(&self.db, ctx).await?;
        let shop = self.shop_store.get_by_id(&self.db, shop_id).await?;

        let products = self
            .product_store
            .query(&self.db, ProductFilter {
                shop_id: Some(shop.id),
                in_stock,
            })
            .await?;
        Ok(products.into_iter().map(ProductResponse::from).collect())
    }

    pub async fn get(&self, ctx: &RequestContext, shop_id: &str, product_id: &str) -> Result<ProductResponse, InternalError> {
        self.authorization_provider.require_caller(&self.db, ctx).await?;
        let shop = self.shop_store.get_by_id(&self.db, shop_id).await?;

        Ok(self.product_store.get_in_shop(&self.db, &shop.id, product_id).await?.into())
    }

    pub async fn update(
        &self,
        ctx: &RequestContext,
        shop_id: &str,
        product_id: &str,
        request: UpdateProductRequest,
    ) -> Result<ProductResponse, InternalError> {
        request.validate()?;
        let caller = self.authorization_provider.require_caller(&self.db, ctx).await?;
        let shop = self.shop_store.get_by_id(&self.db, shop_id).await?;
        self.authorization_provider.ensure_shop_owner_or_admin(&caller, &shop)?;

        let product = self.product_store.get_in_shop(&self.db, &shop.id, product_id).await?;
        let updated = self
            .product_store
            .update(&self.db, product, ProductChanges {
                name: request.name.map(|name| name.trim().to_string()),
                description: request.description,
                price: request.price,
            })
            .await?;
        Ok(updated.into())
    }

    /// Overwrite the stock level; loses to a concurrent stock change
    pub async fn update_stock(
        &self,
        ctx: &RequestContext,
        shop_id: &str,
        product_id: &str,
        request: UpdateStockRequest,
    ) -> Result<ProductResponse, InternalError> {
        request.validate()?;
        let caller = self.authorization_provider.require_caller(&self.db, ctx).await?;
        let shop = self.shop_store.get_by_id(&self.db, shop_id).await?;
        self.authorization_provider.ensure_shop_owner_or_admin(&caller, &shop)?;

        let product = self.product_store.get_in_shop(&self.db, &shop.id, product_id).await?;
        let updated = self.product_store.set_stock(&self.db, &product, request.stock).await?;

        tracing::info!(
            request_id = %ctx.request_id,
            "Stock of product {} set from {} to {}",
            updated.id,
            product.stock,
            updated.stock
        );
        Ok(updated.into())
    }

    pub async fn delete(&self, ctx: &RequestContext, shop_id: &str, product_id: &str) -> Result<MessageResponse, InternalError> {
        let caller = self.authorization_provider.require_caller(&self.db, ctx).await?;
        let shop = self.shop_store.get_by_id(&self.db, shop_id).await?;
        self.authorization_provider.ensure_shop_owner_or_admin(&caller, &shop)?;

        let product = self.product_store.get_in_shop(&self.db, &shop.id, product_id).await?;
        self.product_store.soft_delete(&self.db, &product.id).await?;
        Ok(MessageResponse::new("Product deleted"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::internal::DomainError;
    use crate::test::utils::{create_test_shop, create_test_user, setup_test_app_data};
    use crate::types::internal::auth::Claims;

    fn ctx_for(user_id: &str) -> RequestContext {
        RequestContext::for_cli("test").with_auth(Claims {
            sub: user_id.to_string(),
            exp: 0,
            iat: 0,
        })
    }

    fn tonkotsu() -> CreateProductRequest {
        CreateProductRequest {
            name: "Tonkotsu".to_string(),
            description: None,
            price: 1200,
            stock: 10,
        }
    }

    #[tokio::test]
    async fn test_owner_manages_catalogue() {
        let (app_data, _mailer) = setup_test_app_data().await;
        let owner = create_test_user(&app_data.db, "owner@example.com").await;
        let shop = create_test_shop(&app_data.db, &owner.id, "Ramen House").await;
        let coordinator = ProductCoordinator::new(app_data);
        let ctx = ctx_for(&owner.id);

        let product = coordinator.create(&ctx, &shop.id, tonkotsu()).await.unwrap();
        let fetched = coordinator.get(&ctx, &shop.id, &product.id).await.unwrap();
        assert_eq!((fetched.price, fetched.stock), (1200, 10));

        let restocked = coordinator
            .update_stock(&ctx, &shop.id, &product.id, UpdateStockRequest { stock: 25 })
            .await
            .unwrap();
        assert_eq!(restocked.stock, 25);

        let repriced = coordinator
            .update(&ctx, &shop.id, &product.id, UpdateProductRequest {
                price: Some(1300),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(repriced.price, 1300);
        assert_eq!(repriced.stock, 25);

        coordinator.delete(&ctx, &shop.id, &product.id).await.unwrap();
        assert!(coordinator.list(&ctx, &shop.id, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_non_owner_cannot_add_products() {
        let (app_data, _mailer) = setup_test_app_data().await;
        let owner = create_test_user(&app_data.db, "owner@example.com").await;
        let stranger = create_test_user(&app_data.db, "stranger@example.com").await;
        let shop = create_test_shop(&app_data.db, &owner.id, "Ramen House").await;
        let coordinator = ProductCoordinator::new(app_data);

        let result = coordinator.create(&ctx_for(&stranger.id), &shop.id, tonkotsu()).await;
        assert!(matches!(result, Err(InternalError::Domain(DomainError::Forbidden(_)))));
    }

    #[tokio::test]
    async fn test_negative_stock_is_rejected() {
        let (app_data, _mailer) = setup_test_app_data().await;
        let owner = create_test_user(&app_data.db, "owner@example.com").await;
        let shop = create_test_shop(&app_data.db, &owner.id, "Ramen House").await;
        let coordinator = ProductCoordinator::new(app_data);
        let ctx = ctx_for(&owner.id);
        let product = coordinator.create(&ctx, &shop.id, tonkotsu()).await.unwrap();

        let result = coordinator
            .update_stock(&ctx, &shop.id, &product.id, UpdateStockRequest { stock: -1 })
            .await;
        assert!(matches!(result, Err(InternalError::Domain(DomainError::Validation(_)))));
    }
}
