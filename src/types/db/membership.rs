use sea_orm::entity::prelude::*;

use crate::types::internal::{MembershipTier, UsageCounters};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "memberships")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub user_id: String,
    pub tier: MembershipTier,
    pub daily_usage_limit: i32,
    pub daily_usage_count: i32,
    pub total_usage_count: i64,
    pub last_usage_date: Option<i64>,
    pub membership_expire_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}

impl Model {
    pub fn counters(&self) -> UsageCounters {
        UsageCounters {
            tier: self.tier,
            daily_usage_limit: self.daily_usage_limit,
            daily_usage_count: self.daily_usage_count,
            total_usage_count: self.total_usage_count,
            last_usage_date: self.last_usage_date,
            membership_expire_at: self.membership_expire_at,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
