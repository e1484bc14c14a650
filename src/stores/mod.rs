// Stores layer - Data access and repository pattern
//
// Stores are stateless; every method takes the connection (or open
// transaction) it should run on.
pub mod membership_store;
pub mod order_store;
pub mod payment_store;
pub mod product_store;
pub mod shop_store;
pub mod user_store;

pub use membership_store::MembershipStore;
pub use order_store::OrderStore;
pub use payment_store::PaymentStore;
pub use product_store::ProductStore;
pub use shop_store::ShopStore;
pub use user_store::UserStore;

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Select};

use crate::types::db::{membership, order, order_item, payment, product, shop, user};

/// Entities deleted by stamping `deleted_at` instead of removing the row
pub trait SoftDelete: EntityTrait {
    fn deleted_at_column() -> Self::Column;

    /// `SELECT` restricted to rows that have not been tombstoned
    fn find_live() -> Select<Self> {
        Self::find().filter(Self::deleted_at_column().is_null())
    }
}

impl SoftDelete for user::Entity {
    fn deleted_at_column() -> Self::Column {
        user::Column::DeletedAt
    }
}

impl SoftDelete for membership::Entity {
    fn deleted_at_column() -> Self::Column {
        membership::Column::DeletedAt
    }
}

impl SoftDelete for shop::Entity {
    fn deleted_at_column() -> Self::Column {
        shop::Column::DeletedAt
    }
}

impl SoftDelete for product::Entity {
    fn deleted_at_column() -> Self::Column {
        product::Column::DeletedAt
    }
}

impl SoftDelete for order::Entity {
    fn deleted_at_column() -> Self::Column {
        order::Column::DeletedAt
    }
}

impl SoftDelete for order_item::Entity {
    fn deleted_at_column() -> Self::Column {
        order_item::Column::DeletedAt
    }
}

impl SoftDelete for payment::Entity {
    fn deleted_at_column() -> Self::Column {
        payment::Column::DeletedAt
    }
}
