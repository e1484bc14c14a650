use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::app_data::AppData;
use crate::config::{begin_transaction, commit_transaction};
use crate::errors::InternalError;
use crate::providers::{AuthorizationProvider, OrderProvider};
use crate::stores::order_store::OrderFilter;
use crate::stores::{OrderStore, ShopStore};
use crate::types::dto::order::{CreateOrderRequest, OrderResponse, UpdateOrderStatusRequest};
use crate::types::internal::{OrderStatus, RequestContext, Validate};

/// Orders placed against a shop, under `/shops/{shop_id}/orders`
pub struct OrderCoordinator {
    db: DatabaseConnection,
    shop_store: Arc<ShopStore>,
    order_store: Arc<OrderStore>,
    authorization_provider: AuthorizationProvider,
    order_provider: OrderProvider,
}

impl OrderCoordinator {
    pub fn new(app_data: Arc<AppData>) -> Self {
        Self {
            db: app_data.db.clone(),
            shop_store: app_data.shop_store.clone(),
            order_store: app_data.order_store.clone(),
            authorization_provider: AuthorizationProvider::new(app_data.user_store.clone()),
            order_provider: OrderProvider::new(
                app_data.product_store.clone(),
                app_data.order_store.clone(),
            ),
        }
    }

    /// Price, reserve stock and persist an order atomically
    ///
    /// Stock decrements and the order rows commit together; any failure
    /// leaves the catalogue untouched.
    pub async fn create(
        &self,
        ctx: &RequestContext,
        shop_id: &str,
        request: CreateOrderRequest,
    ) -> Result<OrderResponse, InternalError> {
        request.validate()?;

        let txn = begin_transaction(&self.db).await?;
        let caller = self.authorization_provider.require_caller(&txn, ctx).await?;
        let shop = self.shop_store.get_by_id(&txn, shop_id).await?;

        let plan = self
            .order_provider
            .plan(&txn, &shop.id, &request.lines(), request.total_price)
            .await?;
        let (order, items) = self.order_provider.place(&txn, caller.id(), plan).await?;
        commit_transaction(txn).await?;

        tracing::info!(
            request_id = %ctx.request_id,
            "Order {} created with {} items",
            order.id,
            items.len()
        );
        Ok(OrderResponse::new(order, items))
    }

    /// Shop owners and super admins see every order; buyers only their own
    pub async fn list(
        &self,
        ctx: &RequestContext,
        shop_id: &str,
        status: Option<OrderStatus>,
    ) -> Result<Vec<OrderResponse>, InternalError> {
        let caller = self.authorization_provider.require_caller(&self.db, ctx).await?;
        let shop = self.shop_store.get_by_id(&self.db, shop_id).await?;

        let user_id = if self.authorization_provider.is_shop_owner_or_admin(&caller, &shop) {
            None
        } else {
            Some(caller.id().to_string())
        };
        let orders = self
            .order_store
            .query(&self.db, OrderFilter {
                shop_id: Some(shop.id),
                user_id,
                status,
            })
            .await?;

        let mut responses = Vec::with_capacity(orders.len());
        for order in orders {
            let items = self.order_store.items_for(&self.db, &order.id).await?;
            responses.push(OrderResponse::new(order, items));
        }
        Ok(responses)
    }

    pub async fn get(&self, ctx: &RequestContext, shop_id: &str, order_id: &str) -> Result<OrderResponse, InternalError> {
        let caller = self.authorization_provider.require_caller(&self.db, ctx).await?;
        let shop = self.shop_store.get_by_id(&self.db, shop_id).await?;
        let order = self.order_store.get_in_shop(&self.db, &shop.id, order_id).await?;
        self.authorization_provider.ensure_order_visible(&caller, &order, &shop)?;

        let items = self.order_store.items_for(&self.db, &order.id).await?;
        Ok(OrderResponse::new(order, items))
    }

    /// Move an order along its lifecycle
    ///
    /// The shop owner (or a super admin) may apply any legal transition. The
    /// buyer may only cancel, and only while the order is still pending.
    pub async fn update_status(
        &self,
        ctx: &RequestContext,
        shop_id: &str,
        order_id: &str,
        request: UpdateOrderStatusRequest,
    ) -> Result<OrderResponse, InternalError> {
        let txn = begin_transaction(&self.db).await?;
        let caller = self.authorization_provider.require_caller(&txn, ctx).await?;
        let shop = self.shop_store.get_by_id(&txn, shop_id).await?;
        let order = self.order_store.get_in_shop(&txn, &shop.id, order_id).await?;
        self.authorization_provider.ensure_order_visible(&caller, &order, &shop)?;

        let buyer_cancel =
            request.status == OrderStatus::Cancelled && order.status == OrderStatus::Pending;
        if !buyer_cancel && !self.authorization_provider.is_shop_owner_or_admin(&caller, &shop) {
            tracing::warn!(
                request_id = %ctx.request_id,
                "Buyer {} attempted {} -> {} on order {}",
                caller.id(),
                order.status,
                request.status,
                order.id
            );
            return Err(InternalError::forbidden("Buyers can only cancel their own pending orders"));
        }

        let updated = self.order_provider.transition(&txn, &order, request.status).await?;
        let items = self.order_store.items_for(&txn, &updated.id).await?;
        commit_transaction(txn).await?;

        tracing::info!(
            request_id = %ctx.request_id,
            "Order {} status {} -> {} by {}",
            updated.id,
            order.status,
            updated.status,
            caller.id()
        );
        Ok(OrderResponse::new(updated, items))
    }
}
