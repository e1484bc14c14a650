use thiserror::Error;

pub mod credential;
pub mod database;
pub mod domain;
pub mod notification;

pub use credential::CredentialError;
pub use database::DatabaseError;
pub use domain::DomainError;
pub use notification::NotificationError;

/// Internal error type for store, provider and coordinator operations
///
/// Infrastructure failures (database, parse, crypto) are shared by every layer;
/// domain failures carry the business meaning the API layer maps to status codes.
/// Not exposed via API - endpoints convert to `ApiError` explicitly.
#[derive(Error, Debug)]
pub enum InternalError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("Parse error: failed to parse {value_type}: {message}")]
    Parse {
        value_type: String,
        message: String,
    },

    #[error("Crypto error: {operation} failed: {message}")]
    Crypto {
        operation: String,
        message: String,
    },

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Notification(#[from] NotificationError),
}

impl InternalError {
    pub fn database(operation: &str, source: sea_orm::DbErr) -> InternalError {
        InternalError::Database(DatabaseError::Operation {
            operation: operation.to_string(),
            source,
        })
    }

    pub fn transaction_begin(source: sea_orm::DbErr) -> InternalError {
        InternalError::Database(DatabaseError::TransactionBegin { source })
    }

    pub fn transaction_commit(source: sea_orm::DbErr) -> InternalError {
        InternalError::Database(DatabaseError::TransactionCommit { source })
    }

    pub fn parse(value_type: impl Into<String>, message: impl Into<String>) -> InternalError {
        InternalError::Parse {
            value_type: value_type.into(),
            message: message.into(),
        }
    }

    pub fn crypto(operation: impl Into<String>, message: impl Into<String>) -> InternalError {
        InternalError::Crypto {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> InternalError {
        InternalError::Domain(DomainError::Validation(message.into()))
    }

    pub fn not_found(entity: &'static str, id: impl Into<String>) -> InternalError {
        InternalError::Domain(DomainError::NotFound {
            entity,
            id: id.into(),
        })
    }

    pub fn unauthorized(reason: impl Into<String>) -> InternalError {
        InternalError::Domain(DomainError::Unauthorized(reason.into()))
    }

    pub fn forbidden(reason: impl Into<String>) -> InternalError {
        InternalError::Domain(DomainError::Forbidden(reason.into()))
    }

    pub fn conflict(reason: impl Into<String>) -> InternalError {
        InternalError::Domain(DomainError::Conflict(reason.into()))
    }

    pub fn invalid_transition(
        entity: &'static str,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> InternalError {
        InternalError::Domain(DomainError::InvalidTransition {
            entity,
            from: from.into(),
            to: to.into(),
        })
    }

    pub fn concurrent_modification(entity: &'static str, id: impl Into<String>) -> InternalError {
        InternalError::Domain(DomainError::ConcurrentModification {
            entity,
            id: id.into(),
        })
    }
}
