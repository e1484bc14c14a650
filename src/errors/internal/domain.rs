use thiserror::Error;

/// Business rule violations raised by providers and coordinators
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("{0}")]
    Validation(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Invalid {entity} status transition from {from} to {to}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    #[error("{entity} {id} was modified concurrently, retry the request")]
    ConcurrentModification { entity: &'static str, id: String },

    #[error("Daily usage limit of {limit} reached")]
    UsageLimitExceeded { limit: i32 },
}
