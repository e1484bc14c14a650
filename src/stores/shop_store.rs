use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::errors::InternalError;
use crate::stores::SoftDelete;
use crate::types::db::shop;

pub struct NewShop {
    pub name: String,
    pub description: String,
    pub owner_id: String,
}

/// Partial update; `None` leaves the column untouched
#[derive(Debug, Default)]
pub struct ShopChanges {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default)]
pub struct ShopFilter {
    pub owner_id: Option<String>,
}

pub struct ShopStore {}

impl ShopStore {
    pub fn new() -> Self {
        Self {}
    }

    pub async fn create(
        &self,
        conn: &impl ConnectionTrait,
        new_shop: NewShop,
    ) -> Result<shop::Model, InternalError> {
        let now = Utc::now().timestamp();
        let model = shop::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            name: Set(new_shop.name),
            description: Set(new_shop.description),
            owner_id: Set(new_shop.owner_id),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        };

        let created = model
            .insert(conn)
            .await
            .map_err(|e| InternalError::database("insert_shop", e))?;

        tracing::debug!("Created shop {} owned by {}", created.id, created.owner_id);
        Ok(created)
    }

    pub async fn get_by_id(
        &self,
        conn: &impl ConnectionTrait,
        id: &str,
    ) -> Result<shop::Model, InternalError> {
        shop::Entity::find_live()
            .filter(shop::Column::Id.eq(id))
            .one(conn)
            .await
            .map_err(|e| InternalError::database("get_shop_by_id", e))?
            .ok_or_else(|| InternalError::not_found("Shop", id))
    }

    pub async fn update(
        &self,
        conn: &impl ConnectionTrait,
        existing: shop::Model,
        changes: ShopChanges,
    ) -> Result<shop::Model, InternalError> {
        let mut model: shop::ActiveModel = existing.into();
        if let Some(name) = changes.name {
            model.name = Set(name);
        }
        if let Some(description) = changes.description {
            model.description = Set(description);
        }
        model.updated_at = Set(Utc::now().timestamp());

        model
            .update(conn)
            .await
            .map_err(|e| InternalError::database("update_shop", e))
    }

    pub async fn soft_delete(&self, conn: &impl ConnectionTrait, id: &str) -> Result<(), InternalError> {
        let existing = self.get_by_id(conn, id).await?;
        let now = Utc::now().timestamp();

        let mut model: shop::ActiveModel = existing.into();
        model.deleted_at = Set(Some(now));
        model.updated_at = Set(now);
        model
            .update(conn)
            .await
            .map_err(|e| InternalError::database("soft_delete_shop", e))?;

        tracing::debug!("Soft-deleted shop {}", id);
        Ok(())
    }

    pub async fn query(
        &self,
        conn: &impl ConnectionTrait,
        filter: ShopFilter,
    ) -> Result<Vec<shop::Model>, InternalError> {
        let mut select = shop::Entity::find_live();
        if let Some(owner_id) = filter.owner_id {
            select = select.filter(shop::Column::OwnerId.eq(owner_id));
        }

        select
            .order_by_asc(shop::Column::CreatedAt)
            .all(conn)
            .await
            .map_err(|e| InternalError::database("query_shops", e))
    }
}

impl Default for ShopStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::utils::{create_test_user, setup_test_db};

    #[tokio::test]
    async fn test_create_then_fetch_returns_same_fields() {
        let db = setup_test_db().await;
        let owner = create_test_user(&db, "owner@example.com").await;
        let store = ShopStore::new();

        let created = store
            .create(&db, NewShop {
                name: "Ramen House".to_string(),
                description: "Tonkotsu specialists".to_string(),
                owner_id: owner.id.clone(),
            })
            .await
            .unwrap();
        let fetched = store.get_by_id(&db, &created.id).await.unwrap();

        assert_eq!(fetched.name, "Ramen House");
        assert_eq!(fetched.description, "Tonkotsu specialists");
        assert_eq!(fetched.owner_id, owner.id);
    }

    #[tokio::test]
    async fn test_partial_update_keeps_untouched_fields() {
        let db = setup_test_db().await;
        let owner = create_test_user(&db, "owner@example.com").await;
        let store = ShopStore::new();
        let created = store
            .create(&db, NewShop {
                name: "Ramen House".to_string(),
                description: "Original".to_string(),
                owner_id: owner.id,
            })
            .await
            .unwrap();

        let updated = store
            .update(&db, created, ShopChanges {
                name: Some("Ramen Palace".to_string()),
                description: None,
            })
            .await
            .unwrap();

        assert_eq!(updated.name, "Ramen Palace");
        assert_eq!(updated.description, "Original");
    }

    #[tokio::test]
    async fn test_soft_deleted_shop_disappears_from_reads() {
        let db = setup_test_db().await;
        let owner = create_test_user(&db, "owner@example.com").await;
        let store = ShopStore::new();
        let created = store
            .create(&db, NewShop {
                name: "Closing Soon".to_string(),
                description: String::new(),
                owner_id: owner.id.clone(),
            })
            .await
            .unwrap();

        store.soft_delete(&db, &created.id).await.unwrap();

        assert!(store.get_by_id(&db, &created.id).await.is_err());
        let owned = store
            .query(&db, ShopFilter {
                owner_id: Some(owner.id),
            })
            .await
            .unwrap();
        assert!(owned.is_empty());
    }
}
