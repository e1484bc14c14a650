use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::ConnectionTrait;

use crate::config::ApplicationSettings;
use crate::errors::InternalError;
use crate::errors::internal::DomainError;
use crate::stores::MembershipStore;
use crate::types::db::membership;

/// Daily usage accounting on top of a user's membership
pub struct MembershipProvider {
    membership_store: Arc<MembershipStore>,
    settings: Arc<ApplicationSettings>,
}

impl MembershipProvider {
    pub fn new(membership_store: Arc<MembershipStore>, settings: Arc<ApplicationSettings>) -> Self {
        Self {
            membership_store,
            settings,
        }
    }

    /// Load the membership with expiry and daily reset applied (and persisted when they changed)
    pub async fn current(
        &self,
        conn: &impl ConnectionTrait,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<membership::Model, InternalError> {
        let existing = self.membership_store.get_by_user_id(conn, user_id).await?;
        let mut counters = existing.counters();

        let expired = counters.apply_expiry(now, self.settings.free_daily_usage_limit());
        let reset = counters.reset_if_new_day(now);
        if !expired && !reset {
            return Ok(existing);
        }

        if expired {
            tracing::info!("Monthly membership of user {} expired, reverted to free", user_id);
        }
        match self.membership_store.save_counters(conn, &existing, &counters).await? {
            Some(saved) => Ok(saved),
            // Another request already moved the row forward from what we read
            None => self.membership_store.get_by_user_id(conn, user_id).await,
        }
    }

    /// Consume one unit of daily usage
    ///
    /// Expiry and the daily reset are evaluated first. A denied request still
    /// persists those effects. The increment itself is a single conditional
    /// update, so concurrent requests never go past the daily limit.
    ///
    /// # Errors
    /// * `UsageLimitExceeded` - the daily counter already reached the limit
    pub async fn record_usage(
        &self,
        conn: &impl ConnectionTrait,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<membership::Model, InternalError> {
        let refreshed = self.current(conn, user_id, now).await?;

        let consumed = self
            .membership_store
            .increment_usage(conn, &refreshed.id, now.timestamp())
            .await?;
        if !consumed {
            tracing::warn!(
                "User {} reached the daily usage limit of {}",
                user_id,
                refreshed.daily_usage_limit
            );
            return Err(DomainError::UsageLimitExceeded {
                limit: refreshed.daily_usage_limit,
            }
            .into());
        }

        self.membership_store.get_by_user_id(conn, user_id).await
    }

    /// Put the user on the monthly tier for `days` days
    pub async fn grant_monthly(
        &self,
        conn: &impl ConnectionTrait,
        user_id: &str,
        days: u32,
        now: DateTime<Utc>,
    ) -> Result<membership::Model, InternalError> {
        let existing = self.membership_store.get_by_user_id(conn, user_id).await?;
        let mut counters = existing.counters();
        counters.grant_monthly(now, days, self.settings.monthly_daily_usage_limit());

        let granted = self
            .membership_store
            .save_counters(conn, &existing, &counters)
            .await?
            .ok_or_else(|| InternalError::concurrent_modification("Membership", existing.id.as_str()))?;

        tracing::info!("Granted {} days of monthly membership to user {}", days, user_id);
        Ok(granted)
    }
}
