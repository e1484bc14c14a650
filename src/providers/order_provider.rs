use std::sync::Arc;

use sea_orm::ConnectionTrait;

use crate::errors::InternalError;
use crate::stores::order_store::{NewOrder, NewOrderItem};
use crate::stores::{OrderStore, ProductStore};
use crate::types::db::{order, order_item, product};
use crate::types::internal::OrderStatus;

/// One requested line of a new order
#[derive(Debug, Clone)]
pub struct OrderLine {
    pub product_id: String,
    pub quantity: i32,
}

/// Priced and stock-checked order, ready to be placed
#[derive(Debug)]
pub struct OrderPlan {
    pub shop_id: String,
    pub total_price: i64,
    reservations: Vec<(product::Model, i32)>,
    items: Vec<NewOrderItem>,
}

impl OrderPlan {
    pub fn items(&self) -> &[NewOrderItem] {
        &self.items
    }
}

/// Order pricing, stock reservation and status changes
pub struct OrderProvider {
    product_store: Arc<ProductStore>,
    order_store: Arc<OrderStore>,
}

impl OrderProvider {
    pub fn new(product_store: Arc<ProductStore>, order_store: Arc<OrderStore>) -> Self {
        Self {
            product_store,
            order_store,
        }
    }

    /// Price the requested lines against the shop's current catalogue
    ///
    /// Lines naming the same product are merged. Each item snapshots the
    /// product name and price. When the client sent a total it must equal the
    /// computed one.
    ///
    /// # Errors
    /// * `Validation` - no lines, non-positive quantity, or total mismatch
    /// * `NotFound` - a product is missing or belongs to another shop
    /// * `Conflict` - not enough stock
    pub async fn plan(
        &self,
        conn: &impl ConnectionTrait,
        shop_id: &str,
        lines: &[OrderLine],
        expected_total: Option<i64>,
    ) -> Result<OrderPlan, InternalError> {
        if lines.is_empty() {
            return Err(InternalError::validation("items must not be empty"));
        }

        let mut merged: Vec<OrderLine> = Vec::with_capacity(lines.len());
        for line in lines {
            if line.quantity <= 0 {
                return Err(InternalError::validation("quantity must be greater than zero"));
            }
            match merged.iter_mut().find(|m| m.product_id == line.product_id) {
                Some(existing) => {
                    existing.quantity = existing
                        .quantity
                        .checked_add(line.quantity)
                        .ok_or_else(|| InternalError::validation("quantity is too large"))?;
                }
                None => merged.push(line.clone()),
            }
        }

        let mut reservations = Vec::with_capacity(merged.len());
        let mut items = Vec::with_capacity(merged.len());
        let mut total_price: i64 = 0;

        for line in merged {
            let product = self.product_store.get_in_shop(conn, shop_id, &line.product_id).await?;

            if product.stock < line.quantity {
                return Err(InternalError::conflict(format!(
                    "Insufficient stock for {}: requested {}, available {}",
                    product.name, line.quantity, product.stock
                )));
            }

            let item = NewOrderItem {
                product_id: product.id.clone(),
                product_name: product.name.clone(),
                product_price: product.price,
                quantity: line.quantity,
            };
            total_price = product
                .price
                .checked_mul(i64::from(line.quantity))
                .and_then(|line_total| total_price.checked_add(line_total))
                .ok_or_else(|| InternalError::validation("order total is too large"))?;

            items.push(item);
            reservations.push((product, line.quantity));
        }

        if let Some(expected) = expected_total {
            if expected != total_price {
                return Err(InternalError::validation(format!(
                    "total_price {} does not match the sum of item totals {}",
                    expected, total_price
                )));
            }
        }

        Ok(OrderPlan {
            shop_id: shop_id.to_string(),
            total_price,
            reservations,
            items,
        })
    }

    /// Reserve stock and persist the order for `user_id`
    ///
    /// Must run inside a transaction: a failed reservation leaves earlier
    /// decrements to be rolled back by the caller.
    pub async fn place(
        &self,
        conn: &impl ConnectionTrait,
        user_id: &str,
        plan: OrderPlan,
    ) -> Result<(order::Model, Vec<order_item::Model>), InternalError> {
        for (product, quantity) in &plan.reservations {
            self.product_store.decrement_stock(conn, product, *quantity).await?;
        }

        let (created, items) = self
            .order_store
            .create(conn, NewOrder {
                user_id: user_id.to_string(),
                shop_id: plan.shop_id,
                total_price: plan.total_price,
                items: plan.items,
            })
            .await?;

        tracing::info!(
            "Order {} placed by {} at shop {} for {}",
            created.id,
            user_id,
            created.shop_id,
            created.total_price
        );
        Ok((created, items))
    }

    pub fn ensure_transition(&self, existing: &order::Model, to: OrderStatus) -> Result<(), InternalError> {
        if existing.status.can_transition_to(to) {
            return Ok(());
        }

        Err(InternalError::invalid_transition(
            "order",
            existing.status.as_str(),
            to.as_str(),
        ))
    }

    /// Apply a legal status change; cancelling puts every item back in stock
    pub async fn transition(
        &self,
        conn: &impl ConnectionTrait,
        existing: &order::Model,
        to: OrderStatus,
    ) -> Result<order::Model, InternalError> {
        self.ensure_transition(existing, to)?;
        let updated = self.order_store.transition_status(conn, existing, to).await?;

        if to == OrderStatus::Cancelled {
            for item in self.order_store.items_for(conn, &existing.id).await? {
                self.product_store
                    .increment_stock(conn, &item.product_id, item.quantity)
                    .await?;
            }
            tracing::info!("Order {} cancelled, stock restored", existing.id);
        } else {
            tracing::info!("Order {} moved to {}", existing.id, to);
        }

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::internal::DomainError;
    use crate::stores::product_store::NewProduct;
    use crate::test::utils::{create_test_shop, create_test_user, setup_test_db};
    use sea_orm::DatabaseConnection;

    struct Fixture {
        db: DatabaseConnection,
        provider: OrderProvider,
        product_store: Arc<ProductStore>,
        shop_id: String,
        buyer_id: String,
        tonkotsu: product::Model,
        shoyu: product::Model,
    }

    async fn fixture() -> Fixture {
        let db = setup_test_db().await;
        let owner = create_test_user(&db, "owner@example.com").await;
        let buyer = create_test_user(&db, "buyer@example.com").await;
        let shop = create_test_shop(&db, &owner.id, "Ramen House").await;
        let product_store = Arc::new(ProductStore::new());

        let mut created = Vec::new();
        for (name, price, stock) in [("Tonkotsu", 1200, 10), ("Shoyu", 900, 1)] {
            created.push(
                product_store
                    .create(&db, NewProduct {
                        shop_id: shop.id.clone(),
                        name: name.to_string(),
                        description: String::new(),
                        price,
                        stock,
                    })
                    .await
                    .unwrap(),
            );
        }
        let shoyu = created.pop().unwrap();
        let tonkotsu = created.pop().unwrap();

        Fixture {
            provider: OrderProvider::new(product_store.clone(), Arc::new(OrderStore::new())),
            db,
            product_store,
            shop_id: shop.id,
            buyer_id: buyer.id,
            tonkotsu,
            shoyu,
        }
    }

    fn line(product: &product::Model, quantity: i32) -> OrderLine {
        OrderLine {
            product_id: product.id.clone(),
            quantity,
        }
    }

    #[tokio::test]
    async fn test_total_is_sum_of_line_totals() {
        let f = fixture().await;

        let plan = f
            .provider
            .plan(&f.db, &f.shop_id, &[line(&f.tonkotsu, 2), line(&f.shoyu, 1)], None)
            .await
            .unwrap();

        assert_eq!(plan.total_price, 2400 + 900);
        let summed: i64 = plan.items().iter().map(|item| item.line_total()).sum();
        assert_eq!(summed, plan.total_price);
    }

    #[tokio::test]
    async fn test_duplicate_lines_are_merged() {
        let f = fixture().await;

        let plan = f
            .provider
            .plan(&f.db, &f.shop_id, &[line(&f.tonkotsu, 1), line(&f.tonkotsu, 2)], Some(3600))
            .await
            .unwrap();

        assert_eq!(plan.items().len(), 1);
        assert_eq!(plan.items()[0].quantity, 3);
    }

    #[tokio::test]
    async fn test_rejects_bad_lines() {
        let f = fixture().await;

        let empty = f.provider.plan(&f.db, &f.shop_id, &[], None).await;
        assert!(matches!(empty, Err(InternalError::Domain(DomainError::Validation(_)))));

        let zero = f.provider.plan(&f.db, &f.shop_id, &[line(&f.tonkotsu, 0)], None).await;
        assert!(matches!(zero, Err(InternalError::Domain(DomainError::Validation(_)))));

        let wrong_total = f
            .provider
            .plan(&f.db, &f.shop_id, &[line(&f.tonkotsu, 2)], Some(2000))
            .await;
        assert!(matches!(wrong_total, Err(InternalError::Domain(DomainError::Validation(_)))));

        let other_shop = f.provider.plan(&f.db, "another-shop", &[line(&f.tonkotsu, 1)], None).await;
        assert!(matches!(other_shop, Err(InternalError::Domain(DomainError::NotFound { .. }))));

        let too_many = f.provider.plan(&f.db, &f.shop_id, &[line(&f.shoyu, 2)], None).await;
        assert!(matches!(too_many, Err(InternalError::Domain(DomainError::Conflict(_)))));
    }

    #[tokio::test]
    async fn test_place_then_cancel_restores_stock() {
        let f = fixture().await;
        let plan = f
            .provider
            .plan(&f.db, &f.shop_id, &[line(&f.tonkotsu, 2)], Some(2400))
            .await
            .unwrap();

        let (placed, items) = f.provider.place(&f.db, &f.buyer_id, plan).await.unwrap();
        assert_eq!(placed.status, OrderStatus::Pending);
        assert_eq!(placed.total_price, 2400);
        assert_eq!(items[0].product_price, 1200);
        assert_eq!(f.product_store.get_by_id(&f.db, &f.tonkotsu.id).await.unwrap().stock, 8);

        let cancelled = f
            .provider
            .transition(&f.db, &placed, OrderStatus::Cancelled)
            .await
            .unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(f.product_store.get_by_id(&f.db, &f.tonkotsu.id).await.unwrap().stock, 10);

        let paid = f.provider.transition(&f.db, &cancelled, OrderStatus::Paid).await;
        assert!(matches!(paid, Err(InternalError::Domain(DomainError::InvalidTransition { .. }))));
    }

    #[tokio::test]
    async fn test_skipping_ahead_is_rejected() {
        let f = fixture().await;
        let plan = f
            .provider
            .plan(&f.db, &f.shop_id, &[line(&f.tonkotsu, 1)], None)
            .await
            .unwrap();
        let (placed, _) = f.provider.place(&f.db, &f.buyer_id, plan).await.unwrap();

        let shipped = f.provider.transition(&f.db, &placed, OrderStatus::Shipping).await;
        assert!(shipped.is_err());

        let paid = f.provider.transition(&f.db, &placed, OrderStatus::Paid).await.unwrap();
        assert_eq!(paid.status, OrderStatus::Paid);
    }
}
