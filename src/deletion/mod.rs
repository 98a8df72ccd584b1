pub mod engine;
pub mod index;
pub mod manager;
pub mod models;
pub mod selector;


pub use engine::CascadeDeletionEngine;
pub use index::{ConfigError, ConfigIndex};
pub use manager::DeletionManager;
pub use models::{
    CascadeFailure, CascadeReport, ConfigErrorPolicy, DeletionError, DeletionOutcome,
    EngineOptions, ErrorKind,
};
pub use selector::{DeletionConfig, FieldSelector, WILDCARD};
