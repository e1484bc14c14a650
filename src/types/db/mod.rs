// Database entities - SeaORM models
pub mod membership;
pub mod order;
pub mod order_item;
pub mod payment;
pub mod product;
pub mod shop;
pub mod user;
pub mod user_role;
