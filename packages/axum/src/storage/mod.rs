//! The persistence collaborator consumed by the [flows](crate::flows).
//!
//! A [`Storage`] holds the resource objects of one type. Flows do all
//! parsing and validation; storage only reads and writes objects.
//!
//! Cancellation is the caller's: dropping an operation's future abandons it.

pub mod memory;

use async_trait::async_trait;
use resdoc::{ErrorObject, ResourceObject};

/// Errors that storage operations can return.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No object with this id exists.
    #[error("no {resource_type} with id {id}")]
    NotFound { resource_type: String, id: String },

    /// An object with the same id already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    /// An unexpected failure in the backend.
    #[error("internal storage error: {0}")]
    Internal(String),
}

impl From<StorageError> for resdoc::Error {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound { resource_type, id } => {
                ErrorObject::not_found(&resource_type, &id).into()
            }
            StorageError::Conflict(msg) => ErrorObject::new(409, "Conflict", msg).into(),
            StorageError::Internal(msg) => ErrorObject::internal(format!("storage: {msg}")).into(),
        }
    }
}

/// Persistence for resource objects of a single type.
#[async_trait]
pub trait Storage: Send + Sync + 'static {
    /// Store a new object. An empty id is assigned by the backend.
    async fn create(&self, object: ResourceObject) -> Result<ResourceObject, StorageError>;

    async fn get(&self, id: &str) -> Result<ResourceObject, StorageError>;

    /// Every stored object, ordered by id: numeric ids by value, then any
    /// others lexically.
    async fn list(&self) -> Result<Vec<ResourceObject>, StorageError>;

    /// Replace the stored object with the same id.
    async fn update(&self, object: ResourceObject) -> Result<ResourceObject, StorageError>;

    async fn delete(&self, id: &str) -> Result<(), StorageError>;
}
