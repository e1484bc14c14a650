use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
};
use uuid::Uuid;

use crate::errors::InternalError;
use crate::stores::SoftDelete;
use crate::types::db::payment;
use crate::types::internal::PaymentStatus;

pub struct NewPayment {
    pub order_id: String,
    pub amount: i64,
    pub payment_method: String,
}

#[derive(Debug, Default)]
pub struct PaymentFilter {
    pub order_id: Option<String>,
    pub status: Option<PaymentStatus>,
}

pub struct PaymentStore {}

impl PaymentStore {
    pub fn new() -> Self {
        Self {}
    }

    pub async fn create(
        &self,
        conn: &impl ConnectionTrait,
        new_payment: NewPayment,
    ) -> Result<payment::Model, InternalError> {
        let now = Utc::now().timestamp();
        payment::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            order_id: Set(new_payment.order_id),
            amount: Set(new_payment.amount),
            payment_method: Set(new_payment.payment_method),
            status: Set(PaymentStatus::Pending),
            version: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        }
        .insert(conn)
        .await
        .map_err(|e| InternalError::database("insert_payment", e))
    }

    pub async fn get_by_id(
        &self,
        conn: &impl ConnectionTrait,
        id: &str,
    ) -> Result<payment::Model, InternalError> {
        payment::Entity::find_live()
            .filter(payment::Column::Id.eq(id))
            .one(conn)
            .await
            .map_err(|e| InternalError::database("get_payment_by_id", e))?
            .ok_or_else(|| InternalError::not_found("Payment", id))
    }

    /// Fetch a payment that must belong to `order_id`
    pub async fn get_for_order(
        &self,
        conn: &impl ConnectionTrait,
        order_id: &str,
        id: &str,
    ) -> Result<payment::Model, InternalError> {
        payment::Entity::find_live()
            .filter(payment::Column::Id.eq(id))
            .filter(payment::Column::OrderId.eq(order_id))
            .one(conn)
            .await
            .map_err(|e| InternalError::database("get_payment_for_order", e))?
            .ok_or_else(|| InternalError::not_found("Payment", id))
    }

    /// A pending or completed payment blocks new payment attempts for the order
    pub async fn find_active_for_order(
        &self,
        conn: &impl ConnectionTrait,
        order_id: &str,
    ) -> Result<Option<payment::Model>, InternalError> {
        payment::Entity::find_live()
            .filter(payment::Column::OrderId.eq(order_id))
            .filter(
                payment::Column::Status.is_in([PaymentStatus::Pending, PaymentStatus::Completed]),
            )
            .one(conn)
            .await
            .map_err(|e| InternalError::database("find_active_payment", e))
    }

    pub async fn transition_status(
        &self,
        conn: &impl ConnectionTrait,
        existing: &payment::Model,
        to: PaymentStatus,
    ) -> Result<payment::Model, InternalError> {
        let result = payment::Entity::update_many()
            .col_expr(payment::Column::Status, Expr::value(to.as_str()))
            .col_expr(payment::Column::Version, Expr::col(payment::Column::Version).add(1))
            .col_expr(payment::Column::UpdatedAt, Expr::value(Utc::now().timestamp()))
            .filter(payment::Column::Id.eq(existing.id.as_str()))
            .filter(payment::Column::Version.eq(existing.version))
            .filter(payment::Column::DeletedAt.is_null())
            .exec(conn)
            .await
            .map_err(|e| InternalError::database("transition_payment_status", e))?;

        if result.rows_affected != 1 {
            return Err(InternalError::concurrent_modification("Payment", existing.id.as_str()));
        }

        self.get_by_id(conn, &existing.id).await
    }

    pub async fn query(
        &self,
        conn: &impl ConnectionTrait,
        filter: PaymentFilter,
    ) -> Result<Vec<payment::Model>, InternalError> {
        let mut select = payment::Entity::find_live();
        if let Some(order_id) = filter.order_id {
            select = select.filter(payment::Column::OrderId.eq(order_id));
        }
        if let Some(status) = filter.status {
            select = select.filter(payment::Column::Status.eq(status));
        }

        select
            .order_by_asc(payment::Column::CreatedAt)
            .all(conn)
            .await
            .map_err(|e| InternalError::database("query_payments", e))
    }
}

impl Default for PaymentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::utils::{create_test_order, setup_test_db};

    fn cash(order_id: &str, amount: i64) -> NewPayment {
        NewPayment {
            order_id: order_id.to_string(),
            amount,
            payment_method: "cash".to_string(),
        }
    }

    #[tokio::test]
    async fn test_active_payment_lookup() {
        let db = setup_test_db().await;
        let order = create_test_order(&db).await;
        let store = PaymentStore::new();

        assert!(store.find_active_for_order(&db, &order.id).await.unwrap().is_none());

        let payment = store.create(&db, cash(&order.id, order.total_price)).await.unwrap();
        let active = store.find_active_for_order(&db, &order.id).await.unwrap();
        assert_eq!(active.map(|p| p.id), Some(payment.id.clone()));

        store.transition_status(&db, &payment, PaymentStatus::Failed).await.unwrap();
        assert!(store.find_active_for_order(&db, &order.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stale_transition_is_rejected() {
        let db = setup_test_db().await;
        let order = create_test_order(&db).await;
        let store = PaymentStore::new();
        let payment = store.create(&db, cash(&order.id, order.total_price)).await.unwrap();

        let completed = store
            .transition_status(&db, &payment, PaymentStatus::Completed)
            .await
            .unwrap();
        assert_eq!(completed.status, PaymentStatus::Completed);
        assert_eq!(completed.version, 1);

        assert!(store.transition_status(&db, &payment, PaymentStatus::Failed).await.is_err());
    }

    #[tokio::test]
    async fn test_get_for_other_order_is_not_found() {
        let db = setup_test_db().await;
        let order = create_test_order(&db).await;
        let store = PaymentStore::new();
        let payment = store.create(&db, cash(&order.id, 100)).await.unwrap();

        assert!(store.get_for_order(&db, "another-order", &payment.id).await.is_err());
        let listed = store
            .query(&db, PaymentFilter {
                order_id: Some(order.id.clone()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
    }
}
