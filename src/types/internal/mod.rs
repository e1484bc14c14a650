// Internal types - domain values shared by stores, providers and coordinators
pub mod auth;
pub mod caller;
pub mod context;
pub mod membership;
pub mod role;
pub mod status;
pub mod validation;

pub use caller::Caller;
pub use context::RequestContext;
pub use membership::{MembershipTier, UsageCounters};
pub use role::{Role, RoleSet};
pub use status::{OrderStatus, PaymentStatus};
pub use validation::Validate;
