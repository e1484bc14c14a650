use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
};
use uuid::Uuid;

use crate::errors::InternalError;
use crate::errors::internal::CredentialError;
use crate::stores::SoftDelete;
use crate::types::db::{user, user_role};
use crate::types::internal::{Role, RoleSet};

/// Data needed to insert a user row
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub photo: Option<String>,
    pub verification_code: Option<String>,
}

/// Filter for `UserStore::query`
#[derive(Debug, Default)]
pub struct UserFilter {
    pub verified: Option<bool>,
}

pub struct UserStore {}

impl UserStore {
    pub fn new() -> Self {
        Self {}
    }

    /// Insert a new user
    ///
    /// # Errors
    /// * `CredentialError::DuplicateEmail` - a live or deleted user already owns the email
    pub async fn create(
        &self,
        conn: &impl ConnectionTrait,
        new_user: NewUser,
    ) -> Result<user::Model, InternalError> {
        let existing = user::Entity::find()
            .filter(user::Column::Email.eq(new_user.email.as_str()))
            .one(conn)
            .await
            .map_err(|e| InternalError::database("find_user_by_email", e))?;

        if existing.is_some() {
            return Err(CredentialError::DuplicateEmail(new_user.email).into());
        }

        let now = Utc::now().timestamp();
        let model = user::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            name: Set(new_user.name),
            email: Set(new_user.email.clone()),
            password_hash: Set(new_user.password_hash),
            provider: Set("local".to_string()),
            photo: Set(new_user.photo.unwrap_or_else(|| "default.png".to_string())),
            verified: Set(false),
            verification_code: Set(new_user.verification_code),
            password_reset_token: Set(None),
            password_reset_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        };

        model.insert(conn).await.map_err(|e| {
            if e.to_string().contains("UNIQUE") {
                InternalError::from(CredentialError::DuplicateEmail(new_user.email))
            } else {
                InternalError::database("insert_user", e)
            }
        })
    }

    pub async fn get_by_id(
        &self,
        conn: &impl ConnectionTrait,
        id: &str,
    ) -> Result<user::Model, InternalError> {
        user::Entity::find_live()
            .filter(user::Column::Id.eq(id))
            .one(conn)
            .await
            .map_err(|e| InternalError::database("get_user_by_id", e))?
            .ok_or_else(|| InternalError::not_found("User", id))
    }

    pub async fn find_by_email(
        &self,
        conn: &impl ConnectionTrait,
        email: &str,
    ) -> Result<Option<user::Model>, InternalError> {
        user::Entity::find_live()
            .filter(user::Column::Email.eq(email))
            .one(conn)
            .await
            .map_err(|e| InternalError::database("find_user_by_email", e))
    }

    pub async fn find_by_verification_code(
        &self,
        conn: &impl ConnectionTrait,
        code_hash: &str,
    ) -> Result<Option<user::Model>, InternalError> {
        user::Entity::find_live()
            .filter(user::Column::VerificationCode.eq(code_hash))
            .one(conn)
            .await
            .map_err(|e| InternalError::database("find_user_by_verification_code", e))
    }

    pub async fn find_by_reset_token(
        &self,
        conn: &impl ConnectionTrait,
        token_hash: &str,
    ) -> Result<Option<user::Model>, InternalError> {
        user::Entity::find_live()
            .filter(user::Column::PasswordResetToken.eq(token_hash))
            .one(conn)
            .await
            .map_err(|e| InternalError::database("find_user_by_reset_token", e))
    }

    /// Persist the changed fields of `model`, stamping `updated_at`
    pub async fn update(
        &self,
        conn: &impl ConnectionTrait,
        mut model: user::ActiveModel,
    ) -> Result<user::Model, InternalError> {
        model.updated_at = Set(Utc::now().timestamp());
        model
            .update(conn)
            .await
            .map_err(|e| InternalError::database("update_user", e))
    }

    pub async fn soft_delete(&self, conn: &impl ConnectionTrait, id: &str) -> Result<(), InternalError> {
        let existing = self.get_by_id(conn, id).await?;
        let now = Utc::now().timestamp();

        let mut model: user::ActiveModel = existing.into();
        model.deleted_at = Set(Some(now));
        model.updated_at = Set(now);
        model
            .update(conn)
            .await
            .map_err(|e| InternalError::database("soft_delete_user", e))?;

        Ok(())
    }

    pub async fn query(
        &self,
        conn: &impl ConnectionTrait,
        filter: UserFilter,
    ) -> Result<Vec<user::Model>, InternalError> {
        let mut select = user::Entity::find_live();
        if let Some(verified) = filter.verified {
            select = select.filter(user::Column::Verified.eq(verified));
        }

        select
            .order_by_asc(user::Column::CreatedAt)
            .all(conn)
            .await
            .map_err(|e| InternalError::database("query_users", e))
    }

    pub async fn get_roles(&self, conn: &impl ConnectionTrait, user_id: &str) -> Result<RoleSet, InternalError> {
        let rows = user_role::Entity::find()
            .filter(user_role::Column::UserId.eq(user_id))
            .all(conn)
            .await
            .map_err(|e| InternalError::database("get_user_roles", e))?;

        Ok(rows.into_iter().map(|row| row.role).collect())
    }

    /// Grant a role; returns false when the user already held it
    pub async fn add_role(
        &self,
        conn: &impl ConnectionTrait,
        user_id: &str,
        role: Role,
    ) -> Result<bool, InternalError> {
        if self.get_roles(conn, user_id).await?.has(role) {
            return Ok(false);
        }

        let row = user_role::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            user_id: Set(user_id.to_string()),
            role: Set(role),
            created_at: Set(Utc::now().timestamp()),
        };

        row.insert(conn)
            .await
            .map_err(|e| InternalError::database("add_user_role", e))?;

        tracing::info!("Granted role {} to user {}", role, user_id);
        Ok(true)
    }

    /// Revoke a role; returns false when the user did not hold it
    pub async fn remove_role(
        &self,
        conn: &impl ConnectionTrait,
        user_id: &str,
        role: Role,
    ) -> Result<bool, InternalError> {
        let result = user_role::Entity::delete_many()
            .filter(user_role::Column::UserId.eq(user_id))
            .filter(user_role::Column::Role.eq(role))
            .exec(conn)
            .await
            .map_err(|e| InternalError::database("remove_user_role", e))?;

        if result.rows_affected > 0 {
            tracing::info!("Revoked role {} from user {}", role, user_id);
        }
        Ok(result.rows_affected > 0)
    }
}

impl Default for UserStore {
    fn default() -> Self {
        Self::new()
    }
}
