use std::sync::Arc;

use poem::Request;
use poem_openapi::param::{Path, Query};
use poem_openapi::payload::Json;
use poem_openapi::{OpenApi, Tags};

use crate::api::BearerAuth;
use crate::api::helpers::{CreatedResult, DataResult, authenticated_context, created, ok};
use crate::app_data::AppData;
use crate::coordinators::ProductCoordinator;
use crate::providers::TokenProvider;
use crate::types::dto::common::MessageResponse;
use crate::types::dto::product::{
    CreateProductRequest, ProductResponse, UpdateProductRequest, UpdateStockRequest,
};

pub struct ProductApi {
    product_coordinator: ProductCoordinator,
    token_provider: Arc<TokenProvider>,
}

impl ProductApi {
    pub fn new(app_data: Arc<AppData>) -> Self {
        Self {
            token_provider: app_data.token_provider.clone(),
            product_coordinator: ProductCoordinator::new(app_data),
        }
    }
}

#[derive(Tags)]
enum ProductTags {
    /// Shop catalogue
    Products,
}

#[OpenApi]
impl ProductApi {
    #[oai(path = "/shops/:shop_id/products", method = "post", tag = "ProductTags::Products")]
    async fn create(
        &self,
        req: &Request,
        auth: BearerAuth,
        shop_id: Path<String>,
        body: Json<CreateProductRequest>,
    ) -> CreatedResult<ProductResponse> {
        let ctx = authenticated_context(req, &auth, &self.token_provider)?;
        Ok(created(self.product_coordinator.create(&ctx, &shop_id.0, body.0).await?))
    }

    /// Products of a shop; `in_stock=true` hides sold-out items
    #[oai(path = "/shops/:shop_id/products", method = "get", tag = "ProductTags::Products")]
    async fn list(
        &self,
        req: &Request,
        auth: BearerAuth,
        shop_id: Path<String>,
        in_stock: Query<Option<bool>>,
    ) -> DataResult<Vec<ProductResponse>> {
        let ctx = authenticated_context(req, &auth, &self.token_provider)?;
        Ok(ok(self.product_coordinator.list(&ctx, &shop_id.0, in_stock.0).await?))
    }

    #[oai(path = "/shops/:shop_id/products/:product_id", method = "get", tag = "ProductTags::Products")]
    async fn get(
        &self,
        req: &Request,
        auth: BearerAuth,
        shop_id: Path<String>,
        product_id: Path<String>,
    ) -> DataResult<ProductResponse> {
        let ctx = authenticated_context(req, &auth, &self.token_provider)?;
        Ok(ok(self.product_coordinator.get(&ctx, &shop_id.0, &product_id.0).await?))
    }

    #[oai(path = "/shops/:shop_id/products/:product_id", method = "put", tag = "ProductTags::Products")]
    async fn update(
        &self,
        req: &Request,
        auth: BearerAuth,
        shop_id: Path<String>,
        product_id: Path<String>,
        body: Json<UpdateProductRequest>,
    ) -> DataResult<ProductResponse> {
        let ctx = authenticated_context(req, &auth, &self.token_provider)?;
        Ok(ok(self
            .product_coordinator
            .update(&ctx, &shop_id.0, &product_id.0, body.0)
            .await?))
    }

    #[oai(path = "/shops/:shop_id/products/:product_id/stock", method = "patch", tag = "ProductTags::Products")]
    async fn update_stock(
        &self,
        req: &Request,
        auth: BearerAuth,
        shop_id: Path<String>,
        product_id: Path<String>,
        body: Json<UpdateStockRequest>,
    ) -> DataResult<ProductResponse> {
        let ctx = authenticated_context(req, &auth, &self.token_provider)?;
        Ok(ok(self
            .product_coordinator
            .update_stock(&ctx, &shop_id.0, &product_id.0, body.0)
            .await?))
    }

    #[oai(path = "/shops/:shop_id/products/:product_id", method = "delete", tag = "ProductTags::Products")]
    async fn delete(
        &self,
        req: &Request,
        auth: BearerAuth,
        shop_id: Path<String>,
        product_id: Path<String>,
    ) -> DataResult<MessageResponse> {
        let ctx = authenticated_context(req, &auth, &self.token_provider)?;
        Ok(ok(self.product_coordinator.delete(&ctx, &shop_id.0, &product_id.0).await?))
    }
}
