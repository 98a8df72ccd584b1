

pub mod entity;
pub mod memory;
pub mod store;

pub use entity::{EntityId, EntityKey, EntityNode, EntityParseError, EntityRef, FieldValue};
pub use memory::{InMemoryStore, StoreEvent};
pub use store::{
    EntityDeleter, EntityGraphReader, EntityStore, StoreError, Transaction, TransactionCoordinator,
};
