use chrono::{DateTime, Duration, Utc};
use sea_orm::entity::prelude::*;

/// Membership tier
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, poem_openapi::Enum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[oai(rename_all = "snake_case")]
pub enum MembershipTier {
    #[sea_orm(string_value = "free")]
    Free,
    #[sea_orm(string_value = "monthly")]
    Monthly,
}

/// Usage counters of one membership, evaluated in memory before being persisted
#[derive(Debug, Clone, PartialEq)]
pub struct UsageCounters {
    pub tier: MembershipTier,
    pub daily_usage_limit: i32,
    pub daily_usage_count: i32,
    pub total_usage_count: i64,
    pub last_usage_date: Option<i64>,
    pub membership_expire_at: Option<i64>,
}

impl UsageCounters {
    /// Downgrade a monthly membership whose expiry lies in the past
    ///
    /// Returns true when the counters changed.
    pub fn apply_expiry(&mut self, now: DateTime<Utc>, free_daily_limit: i32) -> bool {
        let expired = self
            .membership_expire_at
            .is_some_and(|expire_at| expire_at < now.timestamp());

        if self.tier == MembershipTier::Monthly && expired {
            self.tier = MembershipTier::Free;
            self.daily_usage_limit = free_daily_limit;
            return true;
        }

        false
    }

    /// Zero the daily counter when the last usage happened on an earlier UTC day
    ///
    /// Returns true when the counters changed.
    pub fn reset_if_new_day(&mut self, now: DateTime<Utc>) -> bool {
        let Some(last_usage) = self.last_usage_date.and_then(|ts| DateTime::from_timestamp(ts, 0)) else {
            return false;
        };

        if last_usage.date_naive() < now.date_naive() && self.daily_usage_count != 0 {
            self.daily_usage_count = 0;
            return true;
        }

        false
    }

    /// Switch to the monthly tier for `days` days starting now
    pub fn grant_monthly(&mut self, now: DateTime<Utc>, days: u32, monthly_daily_limit: i32) {
        self.tier = MembershipTier::Monthly;
        self.daily_usage_limit = monthly_daily_limit;
        self.membership_expire_at = Some((now + Duration::days(i64::from(days))).timestamp());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn free_counters(count: i32, last_usage: Option<DateTime<Utc>>) -> UsageCounters {
        UsageCounters {
            tier: MembershipTier::Free,
            daily_usage_limit: 10,
            daily_usage_count: count,
            total_usage_count: i64::from(count),
            last_usage_date: last_usage.map(|t| t.timestamp()),
            membership_expire_at: None,
        }
    }

    fn at(hour: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_same_day_keeps_count() {
        let mut counters = free_counters(9, Some(at(8, 10)));

        assert!(!counters.reset_if_new_day(at(12, 10)));
        assert_eq!(counters.daily_usage_count, 9);
    }

    #[test]
    fn test_new_day_resets_before_evaluation() {
        let mut counters = free_counters(10, Some(at(23, 10)));

        assert!(counters.reset_if_new_day(at(0, 11)));
        assert_eq!(counters.daily_usage_count, 0);
        assert_eq!(counters.total_usage_count, 10);
    }

    #[test]
    fn test_no_reset_without_prior_usage() {
        let mut counters = free_counters(0, None);
        assert!(!counters.reset_if_new_day(at(12, 10)));
    }

    #[test]
    fn test_expired_monthly_reverts_to_free_limit() {
        let now = at(12, 10);
        let mut counters = free_counters(3, Some(at(8, 10)));
        counters.grant_monthly(at(12, 1), 5, 100);
        assert_eq!(counters.tier, MembershipTier::Monthly);
        assert_eq!(counters.daily_usage_limit, 100);

        assert!(counters.apply_expiry(now, 10));
        assert_eq!(counters.tier, MembershipTier::Free);
        assert_eq!(counters.daily_usage_limit, 10);
    }

    #[test]
    fn test_active_monthly_is_kept() {
        let now = at(12, 10);
        let mut counters = free_counters(0, None);
        counters.grant_monthly(now, 30, 100);

        assert!(!counters.apply_expiry(now, 10));
        assert_eq!(counters.tier, MembershipTier::Monthly);
    }

    #[test]
    fn test_expiry_second_is_still_monthly() {
        let mut counters = free_counters(0, None);
        counters.grant_monthly(at(12, 1), 1, 100);
        let expire_at = at(12, 2);

        assert!(!counters.apply_expiry(expire_at, 10));
        assert_eq!(counters.tier, MembershipTier::Monthly);

        assert!(counters.apply_expiry(expire_at + Duration::seconds(1), 10));
        assert_eq!(counters.tier, MembershipTier::Free);
    }
}
