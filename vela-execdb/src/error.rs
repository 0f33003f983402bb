//! Storage layer errors

use thiserror::Error;

/// Errors that can occur in the storage layer
#[derive(Debug, Error)]
pub enum StoreError {
    /// Entity not found
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound {
        /// Type of entity (order, position, account)
        entity_type: String,
        /// Entity ID
        id: String,
    },

    /// Duplicate entity (the id is already cached)
    #[error("Duplicate entity: {entity_type} with id {id}")]
    Duplicate {
        /// Type of entity
        entity_type: String,
        /// Entity ID
        id: String,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Deserialization error (reading from a log)
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Persisted state contradicts itself (wrong creation event kind,
    /// empty log, unparseable index entry)
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    /// Backing store failure
    #[error("Backing store error: {0}")]
    Backend(String),

    /// Domain error passthrough
    #[error("Domain error: {0}")]
    Domain(#[from] vela_domain::DomainError),
}

impl StoreError {
    /// Create a not found error
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    /// Create a duplicate error
    pub fn duplicate(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::Duplicate {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }
}
