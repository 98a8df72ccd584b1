use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use tracing::{debug, error, info, warn};

use crate::db::{EntityGraphReader, Transaction, TransactionCoordinator};
use super::engine::CascadeDeletionEngine;
use super::models::{CascadeReport, DeletionError, DeletionOutcome};


pub struct DeletionManager {
    engine: Arc<CascadeDeletionEngine>,
    coordinator: Arc<dyn TransactionCoordinator>,
}

impl DeletionManager {
    pub fn new(engine: CascadeDeletionEngine, coordinator: Arc<dyn TransactionCoordinator>) -> Self {
        info!("Initializing DeletionManager");
        Self {
            engine: Arc::new(engine),
            coordinator,
        }
    }

    pub fn engine(&self) -> &CascadeDeletionEngine {
        &self.engine
    }

    pub fn is_configured(&self, entity_type: &str) -> bool {
        self.engine.index().contains(entity_type)
    }

    /// Deletes everything configured below `entity_type`/`id` in one
    /// transaction. The entity itself is left for the caller to delete.
    pub async fn cascade_delete(&self, entity_type: &str, id: &str) -> DeletionOutcome {
        if !self.is_configured(entity_type) {
            debug!("{} has no cascade configuration, skipping transaction", entity_type);
            return DeletionOutcome::Success(CascadeReport::empty());
        }

        let engine = Arc::clone(&self.engine);
        let entity_type = entity_type.to_string();
        let id = id.to_string();

        self.run_in_transaction(move |tx| {
            async move {
                let root = match tx.fetch_with_relations(&entity_type, &id).await {
                    Ok(root) => root,
                    Err(e) => {
                        warn!("Could not load {} {} for cascade: {}", entity_type, id, e);
                        return DeletionOutcome::failure(e.into());
                    }
                };
                engine.cascade_delete(tx, &root, &entity_type).await
            }
            .boxed()
        })
        .await
    }

    /// Runs `work` inside a fresh transaction: commits on success, rolls back
    /// on failure. A panic inside `work` becomes a failure too.
    pub async fn run_in_transaction<F>(&self, work: F) -> DeletionOutcome
    where
        F: for<'t> FnOnce(&'t dyn Transaction) -> BoxFuture<'t, DeletionOutcome>,
    {
        let tx = match self.coordinator.begin().await {
            Ok(tx) => tx,
            Err(e) => {
                error!("Failed to begin transaction: {}", e);
                return DeletionOutcome::failure(DeletionError::Transaction(e.to_string()));
            }
        };
        debug!("Running cascade in transaction {}", tx.id());

        let outcome = AssertUnwindSafe(async { work(tx.as_ref()).await })
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                let message = panic_message(panic.as_ref());
                error!("Cascade work panicked in transaction {}: {}", tx.id(), message);
                DeletionOutcome::failure(DeletionError::Fault(message))
            });

        match outcome {
            DeletionOutcome::Success(report) => {
                let tx_id = tx.id().to_string();
                match tx.commit().await {
                    Ok(()) => {
                        info!("Committed transaction {} ({} deletes)", tx_id, report.deleted.len());
                        DeletionOutcome::Success(report)
                    }
                    Err(e) => {
                        error!("Failed to commit transaction {}: {}", tx_id, e);
                        DeletionOutcome::failure(DeletionError::Transaction(e.to_string()))
                    }
                }
            }
            DeletionOutcome::Failure(mut failure) => {
                let tx_id = tx.id().to_string();
                warn!("Rolling back transaction {}: {}", tx_id, failure.error());
                if let Err(e) = tx.rollback().await {
                    error!("Failed to roll back transaction {}: {}", tx_id, e);
                    failure.push(DeletionError::Transaction(e.to_string()));
                }
                DeletionOutcome::Failure(failure)
            }
        }
    }
}


fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}
