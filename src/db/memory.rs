use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::entity::{EntityKey, EntityNode, EntityParseError};
use crate::core::error::Result as CascadeResult;
use super::store::{EntityDeleter, EntityGraphReader, StoreError, Transaction, TransactionCoordinator};


#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreEvent {
    Begin(String),
    Fetch(EntityKey),
    Delete(EntityKey),
    Commit(String),
    Rollback(String),
}


#[derive(Default)]
struct Inner {
    entities: RwLock<HashMap<EntityKey, EntityNode>>,
    protected: RwLock<HashSet<EntityKey>>,
    journal: Mutex<Vec<StoreEvent>>,
}

impl Inner {
    fn record(&self, event: StoreEvent) {
        self.journal.lock().push(event);
    }
}


/// Entity store kept in process memory. Deletes are staged per transaction
/// and only applied on commit.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a fixture shaped as `{ "<entity type>": [<document>, ...] }`.
    pub fn from_json(fixture: &Value) -> Result<Self, EntityParseError> {
        let store = Self::new();
        let types = fixture.as_object().ok_or(EntityParseError::NotAnObject)?;
        for (entity_type, documents) in types {
            let documents = documents.as_array().ok_or(EntityParseError::NotAnObject)?;
            for document in documents {
                store.insert(entity_type, EntityNode::from_json(document)?);
            }
        }
        info!("Loaded {} entities into memory store", store.len());
        Ok(store)
    }

    /// Reads a JSON fixture file, see [`InMemoryStore::from_json`].
    pub fn load(path: impl AsRef<Path>) -> CascadeResult<Self> {
        let path = path.as_ref();
        info!("Reading entity fixture from {:?}", path);
        let raw = std::fs::read_to_string(path)?;
        let fixture: Value = serde_json::from_str(&raw)?;
        Ok(Self::from_json(&fixture)?)
    }

    pub fn insert(&self, entity_type: &str, node: EntityNode) {
        let key = EntityKey::new(entity_type, node.id.clone());
        self.inner.entities.write().insert(key, node);
    }

    /// Deleting a protected entity fails, like a restricting foreign key.
    pub fn protect(&self, entity_type: &str, id: &str) {
        self.inner.protected.write().insert(EntityKey::new(entity_type, id));
    }

    pub fn contains(&self, entity_type: &str, id: &str) -> bool {
        self.inner
            .entities
            .read()
            .contains_key(&EntityKey::new(entity_type, id))
    }

    pub fn len(&self) -> usize {
        self.inner.entities.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn journal(&self) -> Vec<StoreEvent> {
        self.inner.journal.lock().clone()
    }

    /// Delete calls in the order they were issued, committed or not.
    pub fn delete_calls(&self) -> Vec<EntityKey> {
        self.inner
            .journal
            .lock()
            .iter()
            .filter_map(|event| match event {
                StoreEvent::Delete(key) => Some(key.clone()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl TransactionCoordinator for InMemoryStore {
    async fn begin(&self) -> Result<Box<dyn Transaction>, StoreError> {
        let id = Uuid::new_v4().to_string();
        debug!("Beginning transaction {}", id);
        self.inner.record(StoreEvent::Begin(id.clone()));
        Ok(Box::new(MemoryTransaction {
            id,
            store: Arc::clone(&self.inner),
            pending: Mutex::new(Vec::new()),
        }))
    }
}


struct MemoryTransaction {
    id: String,
    store: Arc<Inner>,
    pending: Mutex<Vec<EntityKey>>,
}

impl MemoryTransaction {
    fn is_pending(&self, key: &EntityKey) -> bool {
        self.pending.lock().contains(key)
    }
}

#[async_trait]
impl EntityGraphReader for MemoryTransaction {
    async fn fetch_with_relations(
        &self,
        entity_type: &str,
        id: &str,
    ) -> Result<EntityNode, StoreError> {
        let key = EntityKey::new(entity_type, id);
        self.store.record(StoreEvent::Fetch(key.clone()));

        if self.is_pending(&key) {
            return Err(StoreError::not_found(entity_type, id));
        }
        self.store
            .entities
            .read()
            .get(&key)
            .cloned()
            .ok_or_else(|| StoreError::not_found(entity_type, id))
    }
}

#[async_trait]
impl EntityDeleter for MemoryTransaction {
    async fn delete_by_id(&self, entity_type: &str, id: &str) -> Result<(), StoreError> {
        let key = EntityKey::new(entity_type, id);
        self.store.record(StoreEvent::Delete(key.clone()));

        if self.store.protected.read().contains(&key) {
            warn!("Refusing to delete protected entity {}", key);
            return Err(StoreError::deletion_failed(entity_type, id, "entity is protected"));
        }
        if self.is_pending(&key) {
            return Err(StoreError::deletion_failed(entity_type, id, "already deleted"));
        }
        if !self.store.entities.read().contains_key(&key) {
            return Err(StoreError::deletion_failed(entity_type, id, "no such entity"));
        }

        debug!("Staged delete of {} in transaction {}", key, self.id);
        self.pending.lock().push(key);
        Ok(())
    }
}

#[async_trait]
impl Transaction for MemoryTransaction {
    fn id(&self) -> &str {
        &self.id
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let pending = std::mem::take(&mut *self.pending.lock());
        {
            let mut entities = self.store.entities.write();
            for key in &pending {
                entities.remove(key);
            }
        }
        self.store.record(StoreEvent::Commit(self.id.clone()));
        debug!("Committed transaction {} ({} deletes)", self.id, pending.len());
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        let discarded = self.pending.lock().len();
        self.store.record(StoreEvent::Rollback(self.id.clone()));
        debug!("Rolled back transaction {} ({} deletes discarded)", self.id, discarded);
        Ok(())
    }
}
