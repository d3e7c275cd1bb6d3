use thiserror::Error;

/// A required field was missing or malformed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Explicit, per-type validation run before any I/O
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Fails when `value` is empty or only whitespace
pub fn require_non_blank(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be blank"));
    }
    Ok(())
}

/// Fails when `values` is empty or longer than `max`
pub fn require_len<T>(
    field: &'static str,
    values: &[T],
    max: usize,
) -> Result<(), ValidationError> {
    if values.is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }
    if values.len() > max {
        return Err(ValidationError::new(
            field,
            format!("at most {} entries allowed, got {}", max, values.len()),
        ));
    }
    Ok(())
}
