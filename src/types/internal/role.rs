use std::fmt;
use std::str::FromStr;

use sea_orm::Iterable;
use sea_orm::entity::prelude::*;

/// Marketplace roles
///
/// Persisted one row per role in `user_roles`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, poem_openapi::Enum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[oai(rename_all = "snake_case")]
pub enum Role {
    #[sea_orm(string_value = "user")]
    User,
    #[sea_orm(string_value = "shop_owner")]
    ShopOwner,
    #[sea_orm(string_value = "super_admin")]
    SuperAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::ShopOwner => "shop_owner",
            Role::SuperAdmin => "super_admin",
        }
    }

    fn bit(self) -> u8 {
        match self {
            Role::User => 1 << 0,
            Role::ShopOwner => 1 << 1,
            Role::SuperAdmin => 1 << 2,
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Role::iter()
            .find(|role| role.as_str() == value)
            .ok_or_else(|| format!("unknown role '{}', expected one of: user, shop_owner, super_admin", value))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of roles held by a user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoleSet(u8);

impl RoleSet {
    pub fn new() -> Self {
        Self(0)
    }

    pub fn has(&self, role: Role) -> bool {
        self.0 & role.bit() != 0
    }

    /// Returns false when the role was already present
    pub fn insert(&mut self, role: Role) -> bool {
        let present = self.has(role);
        self.0 |= role.bit();
        !present
    }

    /// Returns false when the role was not present
    pub fn remove(&mut self, role: Role) -> bool {
        let present = self.has(role);
        self.0 &= !role.bit();
        present
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        Role::iter().filter(move |role| self.has(*role))
    }

    pub fn to_vec(&self) -> Vec<Role> {
        self.iter().collect()
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        let mut set = RoleSet::new();
        for role in iter {
            set.insert(role);
        }
        set
    }
}
