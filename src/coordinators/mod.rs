// Coordinators layer - Workflow orchestration
//
// Coordinators compose store and provider operations for specific API
// endpoints and own the transaction boundaries.

pub mod auth_coordinator;
pub mod order_coordinator;
pub mod payment_coordinator;
pub mod product_coordinator;
pub mod shop_coordinator;
pub mod user_coordinator;

pub use auth_coordinator::AuthCoordinator;
pub use order_coordinator::OrderCoordinator;
pub use payment_coordinator::PaymentCoordinator;
pub use product_coordinator::ProductCoordinator;
pub use shop_coordinator::ShopCoordinator;
pub use user_coordinator::UserCoordinator;
