use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use tracing::{debug, error, info, warn};

use crate::db::{EntityKey, EntityNode, EntityStore, FieldValue};
use super::index::ConfigIndex;
use super::models::{
    CascadeFailure, CascadeReport, ConfigErrorPolicy, DeletionError, DeletionOutcome,
    EngineOptions,
};


/// Deletes the configured descendants of a root entity, deepest first.
///
/// Nested references are fetched with their own relations, cascaded, and
/// only then deleted. The root itself is never deleted here. All calls go
/// to the supplied store one at a time, so running the engine against a
/// transaction keeps the whole tree in a single atomic scope.
pub struct CascadeDeletionEngine {
    index: Arc<ConfigIndex>,
    options: EngineOptions,
}

impl CascadeDeletionEngine {
    pub fn new(index: Arc<ConfigIndex>) -> Self {
        Self::with_options(index, EngineOptions::default())
    }

    pub fn with_options(index: Arc<ConfigIndex>, options: EngineOptions) -> Self {
        Self { index, options }
    }

    pub fn index(&self) -> &ConfigIndex {
        &self.index
    }

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    pub async fn cascade_delete<S>(
        &self,
        store: &S,
        root: &EntityNode,
        root_type: &str,
    ) -> DeletionOutcome
    where
        S: EntityStore + ?Sized,
    {
        if !self.index.contains(root_type) {
            debug!("No cascade configured for {}, nothing to delete", root_type);
            return DeletionOutcome::Success(CascadeReport::empty());
        }

        info!("Cascading delete below {} {}", root_type, root.id);
        let mut traversal = Traversal {
            index: &self.index,
            options: self.options,
            store,
            errors: Vec::new(),
            deleted: Vec::new(),
        };
        // errors are collected on the traversal; Halt only stops it
        let _ = traversal.visit(root_type, root, 0).await;

        match CascadeFailure::from_errors(traversal.errors) {
            None => {
                info!(
                    "Cascade below {} {} deleted {} entities",
                    root_type,
                    root.id,
                    traversal.deleted.len()
                );
                DeletionOutcome::Success(CascadeReport::new(traversal.deleted))
            }
            Some(failure) => {
                warn!(
                    "Cascade below {} {} failed with {} error(s): {}",
                    root_type,
                    root.id,
                    failure.errors().len(),
                    failure.error()
                );
                DeletionOutcome::Failure(failure)
            }
        }
    }
}


struct Halt;


struct Traversal<'a, S: ?Sized> {
    index: &'a ConfigIndex,
    options: EngineOptions,
    store: &'a S,
    errors: Vec<DeletionError>,
    deleted: Vec<EntityKey>,
}

impl<'a, S> Traversal<'a, S>
where
    S: EntityStore + ?Sized,
{
    fn halt(&mut self, error: DeletionError) -> Halt {
        self.errors.push(error);
        Halt
    }

    fn visit<'t>(
        &'t mut self,
        entity_type: &'t str,
        node: &'t EntityNode,
        depth: usize,
    ) -> BoxFuture<'t, Result<(), Halt>> {
        async move {
            let index = self.index;
            let Some(config) = index.lookup(entity_type) else {
                return Ok(());
            };

            for (field, value) in node.fields() {
                if !value.is_cascade_candidate() {
                    continue;
                }

                if !config.fields.selects(field) {
                    error!("Malformed cascade config: {} field {} is not selected", entity_type, field);
                    let err = DeletionError::UnselectedField {
                        entity_type: entity_type.to_string(),
                        field: field.to_string(),
                    };
                    match self.options.config_error_policy {
                        ConfigErrorPolicy::Collect => {
                            self.errors.push(err);
                            continue;
                        }
                        ConfigErrorPolicy::Abort => return Err(self.halt(err)),
                    }
                }

                if let FieldValue::Embedded(_) = value {
                    error!("{} field {} is selected but holds objects without an id", entity_type, field);
                    return Err(self.halt(DeletionError::InvalidEntity {
                        entity_type: entity_type.to_string(),
                        field: field.to_string(),
                    }));
                }

                for reference in value.references() {
                    let child_type = reference
                        .entity_type
                        .as_deref()
                        .unwrap_or_else(|| config.related_type(field));
                    self.descend(child_type, &reference.id, depth + 1).await?;
                }
            }

            Ok(())
        }
        .boxed()
    }

    async fn descend(&mut self, entity_type: &str, id: &str, depth: usize) -> Result<(), Halt> {
        if depth > self.options.max_depth {
            error!("Cascade depth {} exceeded at {} {}", self.options.max_depth, entity_type, id);
            return Err(self.halt(DeletionError::DepthExceeded {
                entity_type: entity_type.to_string(),
                max_depth: self.options.max_depth,
            }));
        }

        debug!("Fetching {} {} (depth {})", entity_type, id, depth);
        let child = match self.store.fetch_with_relations(entity_type, id).await {
            Ok(child) => child,
            Err(e) => {
                error!("Failed to fetch {} {}: {}", entity_type, id, e);
                return Err(self.halt(e.into()));
            }
        };

        self.visit(entity_type, &child, depth).await?;

        if let Err(e) = self.store.delete_by_id(entity_type, id).await {
            error!("Failed to delete {} {}: {}", entity_type, id, e);
            return Err(self.halt(e.into()));
        }
        debug!("Deleted {} {}", entity_type, id);
        self.deleted.push(EntityKey::new(entity_type, id));
        Ok(())
    }
}
