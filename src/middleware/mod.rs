pub mod response;
pub mod route;

pub use response::{ErrorBody, ErrorDetails, ErrorPayload, ErrorResponse};
pub use route::{parse_delete_target, DeleteTarget};

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::core::{CascadeSettings, Result};
use crate::db::TransactionCoordinator;
use crate::deletion::{CascadeDeletionEngine, CascadeReport, DeletionManager, DeletionOutcome};


#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum InterceptDecision {
    /// Not a cascade request; hand it on untouched.
    PassThrough,
    /// Descendants are gone; the parent delete may go ahead.
    Proceed { target: DeleteTarget, report: CascadeReport },
    Reject { target: DeleteTarget, response: ErrorResponse },
}


/// Sits in front of the parent delete handler and runs the cascade first.
pub struct CascadeInterceptor {
    manager: DeletionManager,
    api_prefix: String,
}

impl CascadeInterceptor {
    pub fn new(manager: DeletionManager, api_prefix: impl Into<String>) -> Self {
        Self {
            manager,
            api_prefix: api_prefix.into(),
        }
    }

    pub fn from_settings(
        settings: &CascadeSettings,
        coordinator: Arc<dyn TransactionCoordinator>,
    ) -> Result<Self> {
        let index = Arc::new(settings.build_index()?);
        let engine = CascadeDeletionEngine::with_options(index, settings.engine_options());
        Ok(Self::new(
            DeletionManager::new(engine, coordinator),
            settings.api_prefix.clone(),
        ))
    }

    pub fn manager(&self) -> &DeletionManager {
        &self.manager
    }

    pub async fn intercept(&self, method: &str, path: &str) -> InterceptDecision {
        let Some(target) = parse_delete_target(method, path, &self.api_prefix) else {
            return InterceptDecision::PassThrough;
        };
        if !self.manager.is_configured(&target.entity_type) {
            debug!("No cascade configured for {}, passing through", target.entity_type);
            return InterceptDecision::PassThrough;
        }

        info!("Cascade delete requested for {} {}", target.entity_type, target.id);
        match self.manager.cascade_delete(&target.entity_type, &target.id).await {
            DeletionOutcome::Success(report) => InterceptDecision::Proceed { target, report },
            DeletionOutcome::Failure(failure) => {
                warn!(
                    "Rejecting delete of {} {}: {}",
                    target.entity_type,
                    target.id,
                    failure.error()
                );
                InterceptDecision::Reject {
                    target,
                    response: ErrorResponse::from_failure(&failure),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{EntityKey, EntityNode, EntityRef, InMemoryStore};
    use crate::deletion::{DeletionConfig, ErrorKind, FieldSelector};

    fn interceptor(store: &InMemoryStore) -> CascadeInterceptor {
        let settings = CascadeSettings::new(vec![
            DeletionConfig::new("article", FieldSelector::set(["sections"]))
                .with_relation("sections", "section"),
            DeletionConfig::new("section", FieldSelector::Wildcard)
                .with_relation("images", "image"),
        ]);
        CascadeInterceptor::from_settings(&settings, Arc::new(store.clone())).unwrap()
    }

    fn seeded() -> InMemoryStore {
        let store = InMemoryStore::new();
        store.insert(
            "article",
            EntityNode::new("1").with_many("sections", vec![EntityRef::new("s1")]),
        );
        store.insert(
            "section",
            EntityNode::new("s1").with_many("images", vec![EntityRef::new("i1"), EntityRef::new("i2")]),
        );
        store.insert("image", EntityNode::new("i1"));
        store.insert("image", EntityNode::new("i2"));
        store
    }

    #[tokio::test]
    async fn test_proceeds_after_cascade() {
        let store = seeded();

        let decision = interceptor(&store).intercept("DELETE", "/api/articles/1").await;

        let (target, report) = match decision {
            InterceptDecision::Proceed { target, report } => (target, report),
            other => panic!("expected Proceed, got {other:?}"),
        };
        assert_eq!(target.entity_type, "article");
        assert_eq!(
            report.deleted,
            vec![
                EntityKey::new("image", "i1"),
                EntityKey::new("image", "i2"),
                EntityKey::new("section", "s1"),
            ]
        );
        assert!(store.contains("article", "1"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_passes_through_unrelated_requests() {
        let store = seeded();
        let interceptor = interceptor(&store);

        assert_eq!(interceptor.intercept("GET", "/api/articles/1").await, InterceptDecision::PassThrough);
        assert_eq!(interceptor.intercept("DELETE", "/api/images/i1").await, InterceptDecision::PassThrough);
        assert!(store.journal().is_empty());
    }

    #[tokio::test]
    async fn test_demo_fixture() {
        let dir = concat!(env!("CARGO_MANIFEST_DIR"), "/demos");
        let settings = CascadeSettings::load(format!("{dir}/settings.json")).unwrap();
        let store = InMemoryStore::load(format!("{dir}/entities.json")).unwrap();
        let interceptor = CascadeInterceptor::from_settings(&settings, Arc::new(store.clone())).unwrap();

        let decision = interceptor.intercept("DELETE", "/api/articles/1").await;

        assert!(matches!(decision, InterceptDecision::Proceed { .. }));
        assert!(store.contains("article", "1"));
        assert!(!store.contains("section", "10"));
        assert!(!store.contains("image", "100"));
        assert!(!store.contains("image", "101"));
    }

    #[tokio::test]
    async fn test_rejects_and_rolls_back() {
        let store = seeded();
        store.protect("section", "s1");

        let decision = interceptor(&store).intercept("DELETE", "/api/articles/1").await;

        let response = match decision {
            InterceptDecision::Reject { response, .. } => response,
            other => panic!("expected Reject, got {other:?}"),
        };
        assert_eq!(response.status, 500);
        assert_eq!(response.body.error.details.kind, ErrorKind::Deletion);
        assert_eq!(store.len(), 4);
    }
}
