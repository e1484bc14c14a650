use std::sync::Arc;

use poem::Request;
use poem_openapi::param::{Path, Query};
use poem_openapi::payload::Json;
use poem_openapi::{OpenApi, Tags};

use crate::api::BearerAuth;
use crate::api::helpers::{CreatedResult, DataResult, authenticated_context, created, ok};
use crate::app_data::AppData;
use crate::coordinators::ShopCoordinator;
use crate::providers::TokenProvider;
use crate::types::dto::common::MessageResponse;
use crate::types::dto::shop::{CreateShopRequest, ShopResponse, UpdateShopRequest};

pub struct ShopApi {
    shop_coordinator: ShopCoordinator,
    token_provider: Arc<TokenProvider>,
}

impl ShopApi {
    pub fn new(app_data: Arc<AppData>) -> Self {
        Self {
            token_provider: app_data.token_provider.clone(),
            shop_coordinator: ShopCoordinator::new(app_data),
        }
    }
}

#[derive(Tags)]
enum ShopTags {
    /// Shop management
    Shops,
}

#[OpenApi]
impl ShopApi {
    /// Open a shop; the caller becomes its owner
    #[oai(path = "/shops", method = "post", tag = "ShopTags::Shops")]
    async fn create(&self, req: &Request, auth: BearerAuth, body: Json<CreateShopRequest>) -> CreatedResult<ShopResponse> {
        let ctx = authenticated_context(req, &auth, &self.token_provider)?;
        Ok(created(self.shop_coordinator.create(&ctx, body.0).await?))
    }

    #[oai(path = "/shops", method = "get", tag = "ShopTags::Shops")]
    async fn list(
        &self,
        req: &Request,
        auth: BearerAuth,
        owner_id: Query<Option<String>>,
    ) -> DataResult<Vec<ShopResponse>> {
        let ctx = authenticated_context(req, &auth, &self.token_provider)?;
        Ok(ok(self.shop_coordinator.list(&ctx, owner_id.0).await?))
    }

    #[oai(path = "/shops/:shop_id", method = "get", tag = "ShopTags::Shops")]
    async fn get(&self, req: &Request, auth: BearerAuth, shop_id: Path<String>) -> DataResult<ShopResponse> {
        let ctx = authenticated_context(req, &auth, &self.token_provider)?;
        Ok(ok(self.shop_coordinator.get(&ctx, &shop_id.0).await?))
    }

    #[oai(path = "/shops/:shop_id", method = "put", tag = "ShopTags::Shops")]
    async fn update(
        &self,
        req: &Request,
        auth: BearerAuth,
        shop_id: Path<String>,
        body: Json<UpdateShopRequest>,
    ) -> DataResult<ShopResponse> {
        let ctx = authenticated_context(req, &auth, &self.token_provider)?;
        Ok(ok(self.shop_coordinator.update(&ctx, &shop_id.0, body.0).await?))
    }

    #[oai(path = "/shops/:shop_id", method = "delete", tag = "ShopTags::Shops")]
    async fn delete(&self, req: &Request, auth: BearerAuth, shop_id: Path<String>) -> DataResult<MessageResponse> {
        let ctx = authenticated_context(req, &auth, &self.token_provider)?;
        Ok(ok(self.shop_coordinator.delete(&ctx, &shop_id.0).await?))
    }
}
