use poem_openapi::Object;

use crate::errors::InternalError;
use crate::types::db::{membership, user};
use crate::types::dto::common::format_timestamp;
use crate::types::internal::{MembershipTier, Role, RoleSet, Validate};

/// Membership state as seen by its owner
#[derive(Object, Debug, Clone)]
pub struct MembershipResponse {
    pub tier: MembershipTier,
    pub daily_usage_limit: i32,
    pub daily_usage_count: i32,
    pub total_usage_count: i64,
    pub last_usage_date: Option<String>,
    pub membership_expire_at: Option<String>,
}

impl From<membership::Model> for MembershipResponse {
    fn from(model: membership::Model) -> Self {
        Self {
            tier: model.tier,
            daily_usage_limit: model.daily_usage_limit,
            daily_usage_count: model.daily_usage_count,
            total_usage_count: model.total_usage_count,
            last_usage_date: model.last_usage_date.map(format_timestamp),
            membership_expire_at: model.membership_expire_at.map(format_timestamp),
        }
    }
}

/// Public user profile; never carries the password hash or pending tokens
#[derive(Object, Debug, Clone)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub photo: String,
    pub provider: String,
    pub verified: bool,
    pub roles: Vec<Role>,
    pub membership: Option<MembershipResponse>,
    pub created_at: String,
    pub updated_at: String,
}

impl UserResponse {
    pub fn new(user: user::Model, roles: RoleSet, membership: Option<membership::Model>) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            photo: user.photo,
            provider: user.provider,
            verified: user.verified,
            roles: roles.to_vec(),
            membership: membership.map(MembershipResponse::from),
            created_at: format_timestamp(user.created_at),
            updated_at: format_timestamp(user.updated_at),
        }
    }
}

/// Grant a monthly membership for a number of days
#[derive(Object, Debug, Clone)]
pub struct GrantMembershipRequest {
    #[oai(validator(minimum(value = "1"), maximum(value = "366")))]
    pub days: u32,
}

impl Validate for GrantMembershipRequest {
    fn validate(&self) -> Result<(), InternalError> {
        if self.days == 0 {
            return Err(InternalError::validation("days must be greater than zero"));
        }
        Ok(())
    }
}
