//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// references, conflicts). Infrastructure concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// A value failed validation (empty field, negative number, unknown enum value).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A record references another record that does not exist.
    #[error("dangling reference: {0}")]
    DanglingReference(String),

    /// An aggregate was requested over too few records.
    #[error("insufficient data: {what} needs at least {needed} record(s), found {found}")]
    InsufficientData {
        what: &'static str,
        needed: usize,
        found: usize,
    },

    /// A requested resource was not found (domain-level).
    #[error("not found: {0}")]
    NotFound(String),

    /// A conflict occurred (e.g. duplicate natural key).
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn dangling(msg: impl Into<String>) -> Self {
        Self::DanglingReference(msg.into())
    }

    pub fn insufficient(what: &'static str, needed: usize, found: usize) -> Self {
        Self::InsufficientData {
            what,
            needed,
            found,
        }
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}
