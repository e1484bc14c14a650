use poem_openapi::Object;

use crate::errors::InternalError;
use crate::providers::OrderLine;
use crate::types::db::{order, order_item};
use crate::types::dto::common::format_timestamp;
use crate::types::internal::validation::{require_non_empty, require_non_negative, require_positive};
use crate::types::internal::{OrderStatus, Validate};

#[derive(Object, Debug, Clone)]
pub struct CreateOrderItemRequest {
    pub product_id: String,

    #[oai(validator(minimum(value = "1")))]
    pub quantity: i32,
}

/// Place an order; prices always come from the catalogue
#[derive(Object, Debug, Clone)]
pub struct CreateOrderRequest {
    #[oai(validator(min_items = 1))]
    pub items: Vec<CreateOrderItemRequest>,

    /// Optional client-side total; rejected when it differs from the computed one
    pub total_price: Option<i64>,
}

impl CreateOrderRequest {
    pub fn lines(&self) -> Vec<OrderLine> {
        self.items
            .iter()
            .map(|item| OrderLine {
                product_id: item.product_id.clone(),
                quantity: item.quantity,
            })
            .collect()
    }
}

impl Validate for CreateOrderRequest {
    fn validate(&self) -> Result<(), InternalError> {
        if self.items.is_empty() {
            return Err(InternalError::validation("items must not be empty"));
        }
        for item in &self.items {
            require_non_empty("product_id", &item.product_id)?;
            require_positive("quantity", i64::from(item.quantity))?;
        }
        if let Some(total_price) = self.total_price {
            require_non_negative("total_price", total_price)?;
        }
        Ok(())
    }
}

#[derive(Object, Debug, Clone)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Object, Debug, Clone)]
pub struct OrderItemResponse {
    pub id: String,
    pub product_id: String,
    pub product_name: String,
    pub product_price: i64,
    pub quantity: i32,
    pub total_price: i64,
}

impl From<order_item::Model> for OrderItemResponse {
    fn from(model: order_item::Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            product_name: model.product_name,
            product_price: model.product_price,
            quantity: model.quantity,
            total_price: model.total_price,
        }
    }
}

#[derive(Object, Debug, Clone)]
pub struct OrderResponse {
    pub id: String,
    pub user_id: String,
    pub shop_id: String,
    pub total_price: i64,
    pub status: OrderStatus,
    pub items: Vec<OrderItemResponse>,
    pub created_at: String,
    pub updated_at: String,
}

impl OrderResponse {
    pub fn new(order: order::Model, items: Vec<order_item::Model>) -> Self {
        Self {
            id: order.id,
            user_id: order.user_id,
            shop_id: order.shop_id,
            total_price: order.total_price,
            status: order.status,
            items: items.into_iter().map(OrderItemResponse::from).collect(),
            created_at: format_timestamp(order.created_at),
            updated_at: format_timestamp(order.updated_at),
        }
    }
}
