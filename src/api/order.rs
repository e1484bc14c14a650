use std::sync::Arc;

use poem::Request;
use poem_openapi::param::{Path, Query};
use poem_openapi::payload::Json;
use poem_openapi::{OpenApi, Tags};

use crate::api::BearerAuth;
use crate::api::helpers::{CreatedResult, DataResult, authenticated_context, created, ok};
use crate::app_data::AppData;
use crate::coordinators::{OrderCoordinator, PaymentCoordinator};
use crate::providers::TokenProvider;
use crate::types::dto::order::{CreateOrderRequest, OrderResponse, UpdateOrderStatusRequest};
use crate::types::dto::payment::PaymentResponse;
use crate::types::internal::OrderStatus;

pub struct OrderApi {
    order_coordinator: OrderCoordinator,
    payment_coordinator: PaymentCoordinator,
    token_provider: Arc<TokenProvider>,
}

impl OrderApi {
    pub fn new(app_data: Arc<AppData>) -> Self {
        Self {
            token_provider: app_data.token_provider.clone(),
            order_coordinator: OrderCoordinator::new(app_data.clone()),
            payment_coordinator: PaymentCoordinator::new(app_data),
        }
    }
}

#[derive(Tags)]
enum OrderTags {
    /// Orders placed at a shop
    Orders,
}

#[OpenApi]
impl OrderApi {
    /// Place an order; prices are taken from the catalogue and stock is reserved
    #[oai(path = "/shops/:shop_id/orders", method = "post", tag = "OrderTags::Orders")]
    async fn create(
        &self,
        req: &Request,
        auth: BearerAuth,
        shop_id: Path<String>,
        body: Json<CreateOrderRequest>,
    ) -> CreatedResult<OrderResponse> {
        let ctx = authenticated_context(req, &auth, &self.token_provider)?;
        Ok(created(self.order_coordinator.create(&ctx, &shop_id.0, body.0).await?))
    }

    /// Owners and super admins see every order of the shop, buyers only their own
    #[oai(path = "/shops/:shop_id/orders", method = "get", tag = "OrderTags::Orders")]
    async fn list(
        &self,
        req: &Request,
        auth: BearerAuth,
        shop_id: Path<String>,
        status: Query<Option<OrderStatus>>,
    ) -> DataResult<Vec<OrderResponse>> {
        let ctx = authenticated_context(req, &auth, &self.token_provider)?;
        Ok(ok(self.order_coordinator.list(&ctx, &shop_id.0, status.0).await?))
    }

    #[oai(path = "/shops/:shop_id/orders/:order_id", method = "get", tag = "OrderTags::Orders")]
    async fn get(
        &self,
        req: &Request,
        auth: BearerAuth,
        shop_id: Path<String>,
        order_id: Path<String>,
    ) -> DataResult<OrderResponse> {
        let ctx = authenticated_context(req, &auth, &self.token_provider)?;
        Ok(ok(self.order_coordinator.get(&ctx, &shop_id.0, &order_id.0).await?))
    }

    #[oai(path = "/shops/:shop_id/orders/:order_id/status", method = "patch", tag = "OrderTags::Orders")]
    async fn update_status(
        &self,
        req: &Request,
        auth: BearerAuth,
        shop_id: Path<String>,
        order_id: Path<String>,
        body: Json<UpdateOrderStatusRequest>,
    ) -> DataResult<OrderResponse> {
        let ctx = authenticated_context(req, &auth, &self.token_provider)?;
        Ok(ok(self
            .order_coordinator
            .update_status(&ctx, &shop_id.0, &order_id.0, body.0)
            .await?))
    }

    #[oai(path = "/shops/:shop_id/orders/:order_id/payments", method = "get", tag = "OrderTags::Orders")]
    async fn list_payments(
        &self,
        req: &Request,
        auth: BearerAuth,
        shop_id: Path<String>,
        order_id: Path<String>,
    ) -> DataResult<Vec<PaymentResponse>> {
        let ctx = authenticated_context(req, &auth, &self.token_provider)?;
        Ok(ok(self
            .payment_coordinator
            .list_for_shop_order(&ctx, &shop_id.0, &order_id.0)
            .await?))
    }
}
