use crate::errors::InternalError;

/// Input validation run before any persistence call
///
/// Fails with a validation error naming the first violated constraint.
pub trait Validate {
    fn validate(&self) -> Result<(), InternalError>;
}

pub fn require_non_empty(field: &str, value: &str) -> Result<(), InternalError> {
    if value.trim().is_empty() {
        return Err(InternalError::validation(format!("{} is required", field)));
    }
    Ok(())
}

/// Counts characters, not bytes
pub fn require_max_length(field: &str, value: &str, max: usize) -> Result<(), InternalError> {
    if value.chars().count() > max {
        return Err(InternalError::validation(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(())
}

pub fn require_non_negative(field: &str, value: i64) -> Result<(), InternalError> {
    if value < 0 {
        return Err(InternalError::validation(format!("{} must not be negative", field)));
    }
    Ok(())
}

pub fn require_positive(field: &str, value: i64) -> Result<(), InternalError> {
    if value <= 0 {
        return Err(InternalError::validation(format!("{} must be greater than zero", field)));
    }
    Ok(())
}
