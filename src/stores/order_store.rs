use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
};
use uuid::Uuid;

use crate::errors::InternalError;
use crate::stores::SoftDelete;
use crate::types::db::{order, order_item};
use crate::types::internal::OrderStatus;

/// One line of an order, with the product snapshot already taken
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: String,
    pub product_name: String,
    pub product_price: i64,
    pub quantity: i32,
}

impl NewOrderItem {
    pub fn line_total(&self) -> i64 {
        self.product_price * i64::from(self.quantity)
    }
}

pub struct NewOrder {
    pub user_id: String,
    pub shop_id: String,
    pub total_price: i64,
    pub items: Vec<NewOrderItem>,
}

#[derive(Debug, Default)]
pub struct OrderFilter {
    pub shop_id: Option<String>,
    pub user_id: Option<String>,
    pub status: Option<OrderStatus>,
}

pub struct OrderStore {}

impl OrderStore {
    pub fn new() -> Self {
        Self {}
    }

    /// Insert an order in `pending` together with its line items
    ///
    /// Run inside a transaction so the order never exists without its items.
    pub async fn create(
        &self,
        conn: &impl ConnectionTrait,
        new_order: NewOrder,
    ) -> Result<(order::Model, Vec<order_item::Model>), InternalError> {
        let now = Utc::now().timestamp();
        let order_id = Uuid::new_v4().to_string();

        let created = order::ActiveModel {
            id: Set(order_id.clone()),
            user_id: Set(new_order.user_id),
            shop_id: Set(new_order.shop_id),
            total_price: Set(new_order.total_price),
            status: Set(OrderStatus::Pending),
            version: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        }
        .insert(conn)
        .await
        .map_err(|e| InternalError::database("insert_order", e))?;

        let mut items = Vec::with_capacity(new_order.items.len());
        for item in new_order.items {
            let line_total = item.line_total();
            let row = order_item::ActiveModel {
                id: Set(Uuid::new_v4().to_string()),
                order_id: Set(order_id.clone()),
                product_id: Set(item.product_id),
                product_name: Set(item.product_name),
                product_price: Set(item.product_price),
                quantity: Set(item.quantity),
                total_price: Set(line_total),
                created_at: Set(now),
                updated_at: Set(now),
                deleted_at: Set(None),
            }
            .insert(conn)
            .await
            .map_err(|e| InternalError::database("insert_order_item", e))?;
            items.push(row);
        }

        Ok((created, items))
    }

    pub async fn get_by_id(
        &self,
        conn: &impl ConnectionTrait,
        id: &str,
    ) -> Result<order::Model, InternalError> {
        order::Entity::find_live()
            .filter(order::Column::Id.eq(id))
            .one(conn)
            .await
            .map_err(|e| InternalError::database("get_order_by_id", e))?
            .ok_or_else(|| InternalError::not_found("Order", id))
    }

    /// Fetch an order that must belong to `shop_id`
    pub async fn get_in_shop(
        &self,
        conn: &impl ConnectionTrait,
        shop_id: &str,
        id: &str,
    ) -> Result<order::Model, InternalError> {
        order::Entity::find_live()
            .filter(order::Column::Id.eq(id))
            .filter(order::Column::ShopId.eq(shop_id))
            .one(conn)
            .await
            .map_err(|e| InternalError::database("get_order_in_shop", e))?
            .ok_or_else(|| InternalError::not_found("Order", id))
    }

    pub async fn items_for(
        &self,
        conn: &impl ConnectionTrait,
        order_id: &str,
    ) -> Result<Vec<order_item::Model>, InternalError> {
        order_item::Entity::find_live()
            .filter(order_item::Column::OrderId.eq(order_id))
            .order_by_asc(order_item::Column::CreatedAt)
            .all(conn)
            .await
            .map_err(|e| InternalError::database("get_order_items", e))
    }

    /// Move the order to `to`, guarded by the version of `existing`
    ///
    /// The caller is responsible for checking the transition is legal; this
    /// only guarantees nobody else moved the order in between.
    pub async fn transition_status(
        &self,
        conn: &impl ConnectionTrait,
        existing: &order::Model,
        to: OrderStatus,
    ) -> Result<order::Model, InternalError> {
        let result = order::Entity::update_many()
            .col_expr(order::Column::Status, Expr::value(to.as_str()))
            .col_expr(order::Column::Version, Expr::col(order::Column::Version).add(1))
            .col_expr(order::Column::UpdatedAt, Expr::value(Utc::now().timestamp()))
            .filter(order::Column::Id.eq(existing.id.as_str()))
            .filter(order::Column::Version.eq(existing.version))
            .filter(order::Column::DeletedAt.is_null())
            .exec(conn)
            .await
            .map_err(|e| InternalError::database("transition_order_status", e))?;

        if result.rows_affected != 1 {
            return Err(InternalError::concurrent_modification("Order", existing.id.as_str()));
        }

        tracing::debug!("Order {} moved {} -> {}", existing.id, existing.status, to);
        self.get_by_id(conn, &existing.id).await
    }

    pub async fn query(
        &self,
        conn: &impl ConnectionTrait,
        filter: OrderFilter,
    ) -> Result<Vec<order::Model>, InternalError> {
        let mut select = order::Entity::find_live();
        if let Some(shop_id) = filter.shop_id {
            select = select.filter(order::Column::ShopId.eq(shop_id));
        }
        if let Some(user_id) = filter.user_id {
            select = select.filter(order::Column::UserId.eq(user_id));
        }
        if let Some(status) = filter.status {
            select = select.filter(order::Column::Status.eq(status));
        }

        select
            .order_by_desc(order::Column::CreatedAt)
            .all(conn)
            .await
            .map_err(|e| InternalError::database("query_orders", e))
    }
}

impl Default for OrderStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::utils::{create_test_shop, create_test_user, setup_test_db};

    fn ramen_line(quantity: i32) -> NewOrderItem {
        NewOrderItem {
            product_id: "product-1".to_string(),
            product_name: "Tonkotsu".to_string(),
            product_price: 1200,
            quantity,
        }
    }

    async fn place_order(db: &sea_orm::DatabaseConnection) -> (order::Model, Vec<order_item::Model>) {
        let owner = create_test_user(db, "owner@example.com").await;
        let buyer = create_test_user(db, "buyer@example.com").await;
        let shop = create_test_shop(db, &owner.id, "Ramen House").await;
        let product = crate::stores::ProductStore::new()
            .create(db, crate::stores::product_store::NewProduct {
                shop_id: shop.id.clone(),
                name: "Tonkotsu".to_string(),
                description: String::new(),
                price: 1200,
                stock: 10,
            })
            .await
            .unwrap();

        let mut line = ramen_line(2);
        line.product_id = product.id;
        OrderStore::new()
            .create(db, NewOrder {
                user_id: buyer.id,
                shop_id: shop.id,
                total_price: line.line_total(),
                items: vec![line],
            })
            .await
            .unwrap()
    }

    #[test]
    fn test_line_total() {
        assert_eq!(ramen_line(2).line_total(), 2400);
    }

    #[tokio::test]
    async fn test_create_starts_pending_with_items() {
        let db = setup_test_db().await;
        let (order, items) = place_order(&db).await;

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_price, 2400);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].total_price, 2400);

        let stored = OrderStore::new().items_for(&db, &order.id).await.unwrap();
        assert_eq!(stored, items);
    }

    #[tokio::test]
    async fn test_transition_bumps_version() {
        let db = setup_test_db().await;
        let (order, _) = place_order(&db).await;
        let store = OrderStore::new();

        let paid = store.transition_status(&db, &order, OrderStatus::Paid).await.unwrap();
        assert_eq!(paid.status, OrderStatus::Paid);
        assert_eq!(paid.version, order.version + 1);
    }

    #[tokio::test]
    async fn test_stale_transition_is_rejected() {
        let db = setup_test_db().await;
        let (order, _) = place_order(&db).await;
        let store = OrderStore::new();

        store.transition_status(&db, &order, OrderStatus::Cancelled).await.unwrap();
        let stale = store.transition_status(&db, &order, OrderStatus::Paid).await;

        assert!(stale.is_err());
        assert_eq!(
            store.get_by_id(&db, &order.id).await.unwrap().status,
            OrderStatus::Cancelled
        );
    }

    #[tokio::test]
    async fn test_query_filters() {
        let db = setup_test_db().await;
        let (order, _) = place_order(&db).await;
        let store = OrderStore::new();

        let by_buyer = store
            .query(&db, OrderFilter {
                user_id: Some(order.user_id.clone()),
                ..Default::default()
            })
            .await
            .unwrap();
        let paid_only = store
            .query(&db, OrderFilter {
                shop_id: Some(order.shop_id.clone()),
                status: Some(OrderStatus::Paid),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(by_buyer.len(), 1);
        assert!(paid_only.is_empty());
    }

    #[tokio::test]
    async fn test_get_in_other_shop_is_not_found() {
        let db = setup_test_db().await;
        let (order, _) = place_order(&db).await;

        assert!(OrderStore::new().get_in_shop(&db, "elsewhere", &order.id).await.is_err());
    }
}
