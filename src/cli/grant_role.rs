use crate::app_data::AppData;
use crate::errors::InternalError;
use crate::types::internal::{RequestContext, Role};

/// Grant `role` to the account registered under `email`
///
/// Succeeds without changes when the account already holds the role.
pub async fn grant_role(app_data: &AppData, email: &str, role: Role) -> Result<(), InternalError> {
    let ctx = RequestContext::for_cli("grant_role");
    let email = email.trim().to_lowercase();

    let user = app_data
        .user_store
        .find_by_email(&app_data.db, &email)
        .await?
        .ok_or_else(|| InternalError::not_found("User", email.as_str()))?;

    let granted = app_data.user_store.add_role(&app_data.db, &user.id, role).await?;
    if granted {
        tracing::info!(request_id = %ctx.request_id, actor = %ctx.actor_id, "Granted {} to {}", role, user.id);
        println!("Granted role {} to {} ({})", role, user.email, user.id);
    } else {
        println!("{} ({}) already has role {}", user.email, user.id, role);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::internal::DomainError;
    use crate::test::utils::{create_test_user, setup_test_app_data};

    #[tokio::test]
    async fn test_grant_role_by_email() {
        let (app_data, _mailer) = setup_test_app_data().await;
        let user = create_test_user(&app_data.db, "admin@example.com").await;

        grant_role(&app_data, " Admin@Example.com ", Role::SuperAdmin).await.unwrap();
        grant_role(&app_data, "admin@example.com", Role::SuperAdmin).await.unwrap();

        let roles = app_data.user_store.get_roles(&app_data.db, &user.id).await.unwrap();
        assert!(roles.has(Role::SuperAdmin));
        assert!(roles.has(Role::User));
    }

    #[tokio::test]
    async fn test_unknown_email_is_not_found() {
        let (app_data, _mailer) = setup_test_app_data().await;

        let result = grant_role(&app_data, "ghost@example.com", Role::SuperAdmin).await;
        assert!(matches!(result, Err(InternalError::Domain(DomainError::NotFound { .. }))));
    }
}
