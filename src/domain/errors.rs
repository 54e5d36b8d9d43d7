use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Business rule violation: {0}")]
    BusinessRuleViolation(String),

    /// A status precondition no longer held when the write was attempted.
    #[error("Conflict: {0}")]
    Conflict(String),
}
