//! Error types for projection store operations.

use thiserror::Error;

/// Errors raised by store adapters.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The referenced row does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The backend itself failed (I/O, corruption, bad stored data).
    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn backend(message: impl Into<String>) -> Self {
        StoreError::Backend(message.into())
    }
}
