

use async_trait::async_trait;
use thiserror::Error;

use super::entity::EntityNode;


#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{entity_type} {id} not found")]
    NotFound { entity_type: String, id: String },
    #[error("Failed to delete {entity_type} {id}: {reason}")]
    DeletionFailed {
        entity_type: String,
        id: String,
        reason: String,
    },
    #[error("Transaction error: {0}")]
    Transaction(String),
    #[error("Backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found(entity_type: &str, id: &str) -> Self {
        Self::NotFound {
            entity_type: entity_type.to_string(),
            id: id.to_string(),
        }
    }

    pub fn deletion_failed(entity_type: &str, id: &str, reason: impl Into<String>) -> Self {
        Self::DeletionFailed {
            entity_type: entity_type.to_string(),
            id: id.to_string(),
            reason: reason.into(),
        }
    }
}


#[async_trait]
pub trait EntityGraphReader: Send + Sync {
    /// Returns the entity with every relation needed for cascade decisions
    /// already populated.
    async fn fetch_with_relations(
        &self,
        entity_type: &str,
        id: &str,
    ) -> Result<EntityNode, StoreError>;
}


#[async_trait]
pub trait EntityDeleter: Send + Sync {

    async fn delete_by_id(&self, entity_type: &str, id: &str) -> Result<(), StoreError>;
}


pub trait EntityStore: EntityGraphReader + EntityDeleter {}

impl<T: EntityGraphReader + EntityDeleter + ?Sized> EntityStore for T {}


/// Reads and deletes issued through a transaction are only made durable by
/// `commit`.
#[async_trait]
pub trait Transaction: EntityGraphReader + EntityDeleter {

    fn id(&self) -> &str;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}


#[async_trait]
pub trait TransactionCoordinator: Send + Sync {

    async fn begin(&self) -> Result<Box<dyn Transaction>, StoreError>;
}

