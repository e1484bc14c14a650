use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::errors::InternalError;
use crate::stores::SoftDelete;
use crate::types::db::product;

pub struct NewProduct {
    pub shop_id: String,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub stock: i32,
}

/// Partial update; `None` leaves the column untouched
#[derive(Debug, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
}

#[derive(Debug, Default)]
pub struct ProductFilter {
    pub shop_id: Option<String>,
    pub in_stock: Option<bool>,
}

pub struct ProductStore {}

impl ProductStore {
    pub fn new() -> Self {
        Self {}
    }

    pub async fn create(
        &self,
        conn: &impl ConnectionTrait,
        new_product: NewProduct,
    ) -> Result<product::Model, InternalError> {
        let now = Utc::now().timestamp();
        let model = product::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            shop_id: Set(new_product.shop_id),
            name: Set(new_product.name),
            description: Set(new_product.description),
            price: Set(new_product.price),
            stock: Set(new_product.stock),
            version: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        };

        model
            .insert(conn)
            .await
            .map_err(|e| InternalError::database("insert_product", e))
    }

    pub async fn get_by_id(
        &self,
        conn: &impl ConnectionTrait,
        id: &str,
    ) -> Result<product::Model, InternalError> {
        product::Entity::find_live()
            .filter(product::Column::Id.eq(id))
            .one(conn)
            .await
            .map_err(|e| InternalError::database("get_product_by_id", e))?
            .ok_or_else(|| InternalError::not_found("Product", id))
    }

    /// Fetch a product that must belong to `shop_id`
    ///
    /// A product of another shop is reported as not found.
    pub async fn get_in_shop(
        &self,
        conn: &impl ConnectionTrait,
        shop_id: &str,
        id: &str,
    ) -> Result<product::Model, InternalError> {
        product::Entity::find_live()
            .filter(product::Column::Id.eq(id))
            .filter(product::Column::ShopId.eq(shop_id))
            .one(conn)
            .await
            .map_err(|e| InternalError::database("get_product_in_shop", e))?
            .ok_or_else(|| InternalError::not_found("Product", id))
    }

    pub async fn update(
        &self,
        conn: &impl ConnectionTrait,
        existing: product::Model,
        changes: ProductChanges,
    ) -> Result<product::Model, InternalError> {
        let mut model: product::ActiveModel = existing.into();
        if let Some(name) = changes.name {
            model.name = Set(name);
        }
        if let Some(description) = changes.description {
            model.description = Set(description);
        }
        if let Some(price) = changes.price {
            model.price = Set(price);
        }
        model.updated_at = Set(Utc::now().timestamp());

        model
            .update(conn)
            .await
            .map_err(|e| InternalError::database("update_product", e))
    }

    /// Overwrite the stock level, guarded by the version read earlier
    ///
    /// # Errors
    /// * `ConcurrentModification` - another writer changed the product since `existing` was read
    pub async fn set_stock(
        &self,
        conn: &impl ConnectionTrait,
        existing: &product::Model,
        stock: i32,
    ) -> Result<product::Model, InternalError> {
        let result = product::Entity::update_many()
            .col_expr(product::Column::Stock, Expr::value(stock))
            .col_expr(product::Column::Version, Expr::col(product::Column::Version).add(1))
            .col_expr(product::Column::UpdatedAt, Expr::value(Utc::now().timestamp()))
            .filter(product::Column::Id.eq(existing.id.as_str()))
            .filter(product::Column::Version.eq(existing.version))
            .filter(product::Column::DeletedAt.is_null())
            .exec(conn)
            .await
            .map_err(|e| InternalError::database("set_product_stock", e))?;

        if result.rows_affected != 1 {
            return Err(InternalError::concurrent_modification("Product", existing.id.as_str()));
        }

        self.get_by_id(conn, &existing.id).await
    }

    /// Take `quantity` units out of stock
    ///
    /// The update only applies when the version still matches and enough
    /// stock remains, so stock can never go negative.
    pub async fn decrement_stock(
        &self,
        conn: &impl ConnectionTrait,
        existing: &product::Model,
        quantity: i32,
    ) -> Result<(), InternalError> {
        let result = product::Entity::update_many()
            .col_expr(product::Column::Stock, Expr::col(product::Column::Stock).sub(quantity))
            .col_expr(product::Column::Version, Expr::col(product::Column::Version).add(1))
            .col_expr(product::Column::UpdatedAt, Expr::value(Utc::now().timestamp()))
            .filter(product::Column::Id.eq(existing.id.as_str()))
            .filter(product::Column::Version.eq(existing.version))
            .filter(product::Column::Stock.gte(quantity))
            .filter(product::Column::DeletedAt.is_null())
            .exec(conn)
            .await
            .map_err(|e| InternalError::database("decrement_product_stock", e))?;

        if result.rows_affected != 1 {
            return Err(InternalError::concurrent_modification("Product", existing.id.as_str()));
        }

        Ok(())
    }

    /// Put `quantity` units back into stock (order cancellation)
    ///
    /// Soft-deleted products are restocked as well so history stays consistent.
    /// Fails with a validation error when the stock would exceed `i32::MAX`.
    pub async fn increment_stock(
        &self,
        conn: &impl ConnectionTrait,
        id: &str,
        quantity: i32,
    ) -> Result<(), InternalError> {
        let result = product::Entity::update_many()
            .col_expr(product::Column::Stock, Expr::col(product::Column::Stock).add(quantity))
            .col_expr(product::Column::Version, Expr::col(product::Column::Version).add(1))
            .col_expr(product::Column::UpdatedAt, Expr::value(Utc::now().timestamp()))
            .filter(product::Column::Id.eq(id))
            .filter(product::Column::Stock.lte(i32::MAX.saturating_sub(quantity)))
            .exec(conn)
            .await
            .map_err(|e| InternalError::database("increment_product_stock", e))?;

        if result.rows_affected != 1 {
            return Err(InternalError::validation(format!(
                "restocking {} units would exceed the maximum stock of product {}",
                quantity, id
            )));
        }

        Ok(())
    }

    pub async fn soft_delete(&self, conn: &impl ConnectionTrait, id: &str) -> Result<(), InternalError> {
        let existing = self.get_by_id(conn, id).await?;
        let now = Utc::now().timestamp();

        let mut model: product::ActiveModel = existing.into();
        model.deleted_at = Set(Some(now));
        model.updated_at = Set(now);
        model
            .update(conn)
            .await
            .map_err(|e| InternalError::database("soft_delete_product", e))?;

        Ok(())
    }

    pub async fn query(
        &self,
        conn: &impl ConnectionTrait,
        filter: ProductFilter,
    ) -> Result<Vec<product::Model>, InternalError> {
        let mut select = product::Entity::find_live();
        if let Some(shop_id) = filter.shop_id {
            select = select.filter(product::Column::ShopId.eq(shop_id));
        }
        match filter.in_stock {
            Some(true) => select = select.filter(product::Column::Stock.gt(0)),
            Some(false) => select = select.filter(product::Column::Stock.eq(0)),
            None => {}
        }

        select
            .order_by_asc(product::Column::CreatedAt)
            .all(conn)
            .await
            .map_err(|e| InternalError::database("query_products", e))
    }
}

impl Default for ProductStore {
    fn default() -> Self {
        Self::new()
    }
}
