

pub mod core;
pub mod db;
pub mod deletion;
pub mod middleware;


pub use crate::core::config::CascadeSettings;
pub use crate::core::error::{CascadeError, Result};
pub use db::{EntityNode, EntityRef, FieldValue, InMemoryStore, StoreError, TransactionCoordinator};
pub use deletion::{
    CascadeDeletionEngine, ConfigIndex, DeletionConfig, DeletionManager, DeletionOutcome,
    FieldSelector,
};
pub use middleware::{CascadeInterceptor, InterceptDecision};


pub const DEFAULT_API_PREFIX: &str = "/api/";


pub const DEFAULT_MAX_DEPTH: usize = 32;
