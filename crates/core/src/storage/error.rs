use thiserror::Error;

use crate::codec::CodecError;
use crate::models::ValidationError;

use super::StoreName;

/// Errors that can occur during repository operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error(transparent)]
    ValidationFailed(#[from] ValidationError),
    #[error("{entity_type} already exists: {key}")]
    AlreadyExists {
        entity_type: &'static str,
        key: String,
    },
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },
    #[error(
        "Cannot delete {} \"{label}\" because {count} {}(s) reference it",
        .store.noun(),
        .referencing.noun()
    )]
    ReferentialIntegrityViolation {
        store: StoreName,
        label: String,
        referencing: StoreName,
        count: u64,
    },
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Database upgrade blocked. Please close other sessions with this application open.")]
    SchemaBlocked,
    #[error("Database not initialized. Call initialize() first.")]
    NotInitialized,
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<CodecError> for RepositoryError {
    fn from(error: CodecError) -> Self {
        RepositoryError::Serialization(error.to_string())
    }
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;
