use crate::types::db::user;
use crate::types::internal::role::{Role, RoleSet};

/// Authenticated caller resolved from the request context
#[derive(Debug, Clone)]
pub struct Caller {
    pub user: user::Model,
    pub roles: RoleSet,
}

impl Caller {
    pub fn id(&self) -> &str {
        &self.user.id
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.has(role)
    }

    pub fn is_super_admin(&self) -> bool {
        self.roles.has(Role::SuperAdmin)
    }
}
