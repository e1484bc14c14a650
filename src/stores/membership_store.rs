use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveEnum, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::errors::InternalError;
use crate::stores::SoftDelete;
use crate::types::db::membership;
use crate::types::internal::{MembershipTier, UsageCounters};

pub struct MembershipStore {}

impl MembershipStore {
    pub fn new() -> Self {
        Self {}
    }

    /// Create the free-tier membership every user starts with
    pub async fn create_for_user(
        &self,
        conn: &impl ConnectionTrait,
        user_id: &str,
        daily_usage_limit: i32,
    ) -> Result<membership::Model, InternalError> {
        let now = Utc::now().timestamp();
        let model = membership::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            user_id: Set(user_id.to_string()),
            tier: Set(MembershipTier::Free),
            daily_usage_limit: Set(daily_usage_limit),
            daily_usage_count: Set(0),
            total_usage_count: Set(0),
            last_usage_date: Set(None),
            membership_expire_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        };

        model
            .insert(conn)
            .await
            .map_err(|e| InternalError::database("insert_membership", e))
    }

    pub async fn get_by_user_id(
        &self,
        conn: &impl ConnectionTrait,
        user_id: &str,
    ) -> Result<membership::Model, InternalError> {
        membership::Entity::find_live()
            .filter(membership::Column::UserId.eq(user_id))
            .one(conn)
            .await
            .map_err(|e| InternalError::database("get_membership_by_user_id", e))?
            .ok_or_else(|| InternalError::not_found("Membership", user_id))
    }

    /// Write evaluated counters back to the membership row
    ///
    /// The write only applies while the row still holds the counters of
    /// `existing`. Returns `None` when another writer changed it first.
    pub async fn save_counters(
        &self,
        conn: &impl ConnectionTrait,
        existing: &membership::Model,
        counters: &UsageCounters,
    ) -> Result<Option<membership::Model>, InternalError> {
        let result = membership::Entity::update_many()
            .col_expr(membership::Column::Tier, Expr::value(counters.tier.to_value()))
            .col_expr(membership::Column::DailyUsageLimit, Expr::value(counters.daily_usage_limit))
            .col_expr(membership::Column::DailyUsageCount, Expr::value(counters.daily_usage_count))
            .col_expr(membership::Column::TotalUsageCount, Expr::value(counters.total_usage_count))
            .col_expr(membership::Column::LastUsageDate, Expr::value(counters.last_usage_date))
            .col_expr(membership::Column::MembershipExpireAt, Expr::value(counters.membership_expire_at))
            .col_expr(membership::Column::UpdatedAt, Expr::value(Utc::now().timestamp()))
            .filter(membership::Column::Id.eq(existing.id.as_str()))
            .filter(membership::Column::Tier.eq(existing.tier.to_value()))
            .filter(membership::Column::DailyUsageCount.eq(existing.daily_usage_count))
            .filter(membership::Column::TotalUsageCount.eq(existing.total_usage_count))
            .exec(conn)
            .await
            .map_err(|e| InternalError::database("update_membership", e))?;

        if result.rows_affected != 1 {
            tracing::debug!("Membership {} changed concurrently, counters not saved", existing.id);
            return Ok(None);
        }

        self.get_by_user_id(conn, &existing.user_id).await.map(Some)
    }

    /// Add one usage in a single conditional update
    ///
    /// Returns false when the daily counter already reached the limit.
    pub async fn increment_usage(
        &self,
        conn: &impl ConnectionTrait,
        id: &str,
        used_at: i64,
    ) -> Result<bool, InternalError> {
        let result = membership::Entity::update_many()
            .col_expr(
                membership::Column::DailyUsageCount,
                Expr::col(membership::Column::DailyUsageCount).add(1),
            )
            .col_expr(
                membership::Column::TotalUsageCount,
                Expr::col(membership::Column::TotalUsageCount).add(1),
            )
            .col_expr(membership::Column::LastUsageDate, Expr::value(Some(used_at)))
            .col_expr(membership::Column::UpdatedAt, Expr::value(Utc::now().timestamp()))
            .filter(membership::Column::Id.eq(id))
            .filter(membership::Column::DeletedAt.is_null())
            .filter(
                Expr::col(membership::Column::DailyUsageCount)
                    .lt(Expr::col(membership::Column::DailyUsageLimit)),
            )
            .exec(conn)
            .await
            .map_err(|e| InternalError::database("increment_membership_usage", e))?;

        Ok(result.rows_affected == 1)
    }
}

impl Default for MembershipStore {
    fn default() -> Self {
        Self::new()
    }
}
