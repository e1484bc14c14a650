use std::sync::Arc;

use sea_orm::{ConnectionTrait, DatabaseConnection};

use crate::app_data::AppData;
use crate::config::{begin_transaction, commit_transaction};
use crate::errors::InternalError;
use crate::providers::{AuthorizationProvider, OrderProvider};
use crate::stores::payment_store::{NewPayment, PaymentFilter};
use crate::stores::{OrderStore, PaymentStore, ShopStore};
use crate::types::db::{order, shop};
use crate::types::dto::payment::{CreatePaymentRequest, PaymentResponse, UpdatePaymentStatusRequest};
use crate::types::internal::{Caller, OrderStatus, PaymentStatus, RequestContext, Validate};

/// Payments for an order, under `/orders/{order_id}/payments`
pub struct PaymentCoordinator {
    db: DatabaseConnection,
    shop_store: Arc<ShopStore>,
    order_store: Arc<OrderStore>,
    payment_store: Arc<PaymentStore>,
    authorization_provider: AuthorizationProvider,
    order_provider: OrderProvider,
}

impl PaymentCoordinator {
    pub fn new(app_data: Arc<AppData>) -> Self {
        Self {
            db: app_data.db.clone(),
            shop_store: app_data.shop_store.clone(),
            order_store: app_data.order_store.clone(),
            payment_store: app_data.payment_store.clone(),
            authorization_provider: AuthorizationProvider::new(app_data.user_store.clone()),
            order_provider: OrderProvider::new(
                app_data.product_store.clone(),
                app_data.order_store.clone(),
            ),
        }
    }

    async fn load_order(
        &self,
        conn: &impl ConnectionTrait,
        ctx: &RequestContext,
        order_id: &str,
    ) -> Result<(Caller, order::Model, shop::Model), InternalError> {
        let caller = self.authorization_provider.require_caller(conn, ctx).await?;
        let order = self.order_store.get_by_id(conn, order_id).await?;
        let shop = self.shop_store.get_by_id(conn, &order.shop_id).await?;
        self.authorization_provider.ensure_order_visible(&caller, &order, &shop)?;
        Ok((caller, order, shop))
    }

    /// Start paying for a pending order
    ///
    /// # Errors
    /// * `Forbidden` - caller is not the buyer
    /// * `Conflict` - order is not pending or already has an active payment
    /// * `Validation` - amount differs from the order total
    pub async fn create(
        &self,
        ctx: &RequestContext,
        order_id: &str,
        request: CreatePaymentRequest,
    ) -> Result<PaymentResponse, InternalError> {
        request.validate()?;

        let txn = begin_transaction(&self.db).await?;
        let (caller, order, _shop) = self.load_order(&txn, ctx, order_id).await?;
        self.authorization_provider.ensure_order_buyer_or_admin(&caller, &order)?;

        if order.status != OrderStatus::Pending {
            return Err(InternalError::conflict(format!(
                "Order {} is {} and cannot be paid",
                order.id, order.status
            )));
        }
        if request.amount != order.total_price {
            return Err(InternalError::validation(format!(
                "amount {} does not match order total {}",
                request.amount, order.total_price
            )));
        }
        if let Some(active) = self.payment_store.find_active_for_order(&txn, &order.id).await? {
            return Err(InternalError::conflict(format!(
                "Order {} already has a {} payment",
                order.id, active.status
            )));
        }

        let payment = self
            .payment_store
            .create(&txn, NewPayment {
                order_id: order.id,
                amount: request.amount,
                payment_method: request.payment_method.trim().to_string(),
            })
            .await?;
        commit_transaction(txn).await?;

        tracing::info!(
            request_id = %ctx.request_id,
            "Payment {} of {} opened for order {}",
            payment.id,
            payment.amount,
            payment.order_id
        );
        Ok(payment.into())
    }

    pub async fn list(&self, ctx: &RequestContext, order_id: &str) -> Result<Vec<PaymentResponse>, InternalError> {
        let (_caller, order, _shop) = self.load_order(&self.db, ctx, order_id).await?;

        let payments = self
            .payment_store
            .query(&self.db, PaymentFilter {
                order_id: Some(order.id),
                status: None,
            })
            .await?;
        Ok(payments.into_iter().map(PaymentResponse::from).collect())
    }

    /// Payments of an order addressed through its shop; the order must belong to `shop_id`
    pub async fn list_for_shop_order(
        &self,
        ctx: &RequestContext,
        shop_id: &str,
        order_id: &str,
    ) -> Result<Vec<PaymentResponse>, InternalError> {
        let caller = self.authorization_provider.require_caller(&self.db, ctx).await?;
        let shop = self.shop_store.get_by_id(&self.db, shop_id).await?;
        let order = self.order_store.get_in_shop(&self.db, &shop.id, order_id).await?;
        self.authorization_provider.ensure_order_visible(&caller, &order, &shop)?;

        let payments = self
            .payment_store
            .query(&self.db, PaymentFilter {
                order_id: Some(order.id),
                status: None,
            })
            .await?;
        Ok(payments.into_iter().map(PaymentResponse::from).collect())
    }

    pub async fn get(&self, ctx: &RequestContext, order_id: &str, payment_id: &str) -> Result<PaymentResponse, InternalError> {
        let (_caller, order, _shop) = self.load_order(&self.db, ctx, order_id).await?;
        Ok(self.payment_store.get_for_order(&self.db, &order.id, payment_id).await?.into())
    }

    /// Settle a pending payment; completion marks the order paid in the same transaction
    pub async fn update_status(
        &self,
        ctx: &RequestContext,
        order_id: &str,
        payment_id: &str,
        request: UpdatePaymentStatusRequest,
    ) -> Result<PaymentResponse, InternalError> {
        let txn = begin_transaction(&self.db).await?;
        let (caller, order, shop) = self.load_order(&txn, ctx, order_id).await?;
        self.authorization_provider.ensure_shop_owner_or_admin(&caller, &shop)?;

        let payment = self.payment_store.get_for_order(&txn, &order.id, payment_id).await?;
        if !payment.status.can_transition_to(request.status) {
            return Err(InternalError::invalid_transition(
                "payment",
                payment.status.as_str(),
                request.status.as_str(),
            ));
        }

        let updated = self
            .payment_store
            .transition_status(&txn, &payment, request.status)
            .await?;
        if updated.status == PaymentStatus::Completed {
            self.order_provider.transition(&txn, &order, OrderStatus::Paid).await?;
        }
        commit_transaction(txn).await?;

        tracing::info!(
            request_id = %ctx.request_id,
            "Payment {} for order {} marked {}",
            updated.id,
            order.id,
            updated.status
        );
        Ok(updated.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinators::OrderCoordinator;
    use crate::errors::internal::DomainError;
    use crate::test::utils::{create_test_order, create_test_user, setup_test_app_data};
    use crate::types::dto::order::UpdateOrderStatusRequest;
    use crate::types::internal::auth::Claims;

    fn ctx_for(user_id: &str) -> RequestContext {
        RequestContext::for_cli("test").with_auth(Claims {
            sub: user_id.to_string(),
            exp: 0,
            iat: 0,
        })
    }

    fn card(amount: i64) -> CreatePaymentRequest {
        CreatePaymentRequest {
            amount,
            payment_method: "card".to_string(),
        }
    }

    async fn owner_of(app_data: &AppData, order: &order::Model) -> String {
        app_data
            .shop_store
            .get_by_id(&app_data.db, &order.shop_id)
            .await
            .unwrap()
            .owner_id
    }

    #[tokio::test]
    async fn test_completed_payment_marks_order_paid() {
        let (app_data, _mailer) = setup_test_app_data().await;
        let order = create_test_order(&app_data.db).await;
        let owner_id = owner_of(&app_data, &order).await;
        let coordinator = PaymentCoordinator::new(app_data.clone());

        let payment = coordinator
            .create(&ctx_for(&order.user_id), &order.id, card(2400))
            .await
            .unwrap();
        assert_eq!(payment.status, PaymentStatus::Pending);

        let completed = coordinator
            .update_status(&ctx_for(&owner_id), &order.id, &payment.id, UpdatePaymentStatusRequest {
                status: PaymentStatus::Completed,
            })
            .await
            .unwrap();
        assert_eq!(completed.status, PaymentStatus::Completed);

        let paid = app_data.order_store.get_by_id(&app_data.db, &order.id).await.unwrap();
        assert_eq!(paid.status, OrderStatus::Paid);
    }

    #[tokio::test]
    async fn test_buyer_cannot_cancel_after_payment_completed() {
        let (app_data, _mailer) = setup_test_app_data().await;
        let order = create_test_order(&app_data.db).await;
        let owner_id = owner_of(&app_data, &order).await;
        let coordinator = PaymentCoordinator::new(app_data.clone());
        let orders = OrderCoordinator::new(app_data.clone());
        let buyer = ctx_for(&order.user_id);

        let payment = coordinator.create(&buyer, &order.id, card(2400)).await.unwrap();
        coordinator
            .update_status(&ctx_for(&owner_id), &order.id, &payment.id, UpdatePaymentStatusRequest {
                status: PaymentStatus::Completed,
            })
            .await
            .unwrap();

        let cancelled = orders
            .update_status(&buyer, &order.shop_id, &order.id, UpdateOrderStatusRequest {
                status: OrderStatus::Cancelled,
            })
            .await;
        assert!(matches!(cancelled, Err(InternalError::Domain(DomainError::Forbidden(_)))));

        let stored = app_data.order_store.get_by_id(&app_data.db, &order.id).await.unwrap();
        assert_eq!(stored.status, OrderStatus::Paid);
        let settled = coordinator.get(&buyer, &order.id, &payment.id).await.unwrap();
        assert_eq!(settled.status, PaymentStatus::Completed);
    }

    #[tokio::test]
    async fn test_wrong_amount_and_second_payment_rejected() {
        let (app_data, _mailer) = setup_test_app_data().await;
        let order = create_test_order(&app_data.db).await;
        let coordinator = PaymentCoordinator::new(app_data);
        let buyer = ctx_for(&order.user_id);

        assert!(matches!(
            coordinator.create(&buyer, &order.id, card(1000)).await,
            Err(InternalError::Domain(DomainError::Validation(_)))
        ));

        coordinator.create(&buyer, &order.id, card(2400)).await.unwrap();
        assert!(matches!(
            coordinator.create(&buyer, &order.id, card(2400)).await,
            Err(InternalError::Domain(DomainError::Conflict(_)))
        ));
        assert_eq!(coordinator.list(&buyer, &order.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_payment_allows_retry() {
        let (app_data, _mailer) = setup_test_app_data().await;
        let order = create_test_order(&app_data.db).await;
        let owner_id = owner_of(&app_data, &order).await;
        let coordinator = PaymentCoordinator::new(app_data);
        let buyer = ctx_for(&order.user_id);

        let first = coordinator.create(&buyer, &order.id, card(2400)).await.unwrap();
        coordinator
            .update_status(&ctx_for(&owner_id), &order.id, &first.id, UpdatePaymentStatusRequest {
                status: PaymentStatus::Failed,
            })
            .await
            .unwrap();

        let retry = coordinator.create(&buyer, &order.id, card(2400)).await.unwrap();
        assert_ne!(retry.id, first.id);

        let settled_again = coordinator
            .update_status(&ctx_for(&owner_id), &order.id, &first.id, UpdatePaymentStatusRequest {
                status: PaymentStatus::Completed,
            })
            .await;
        assert!(matches!(
            settled_again,
            Err(InternalError::Domain(DomainError::InvalidTransition { .. }))
        ));
    }

    #[tokio::test]
    async fn test_buyer_cannot_settle_and_strangers_cannot_see() {
        let (app_data, _mailer) = setup_test_app_data().await;
        let order = create_test_order(&app_data.db).await;
        let stranger = create_test_user(&app_data.db, "stranger@example.com").await;
        let coordinator = PaymentCoordinator::new(app_data);
        let buyer = ctx_for(&order.user_id);

        let payment = coordinator.create(&buyer, &order.id, card(2400)).await.unwrap();

        let self_settled = coordinator
            .update_status(&buyer, &order.id, &payment.id, UpdatePaymentStatusRequest {
                status: PaymentStatus::Completed,
            })
            .await;
        assert!(matches!(self_settled, Err(InternalError::Domain(DomainError::Forbidden(_)))));

        assert!(matches!(
            coordinator.list(&ctx_for(&stranger.id), &order.id).await,
            Err(InternalError::Domain(DomainError::Forbidden(_)))
        ));
    }
}
