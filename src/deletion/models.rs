use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

use crate::db::{EntityKey, StoreError};
use crate::DEFAULT_MAX_DEPTH;


/// What the engine does after finding an object-valued field that the
/// entity type's selector does not cover.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ConfigErrorPolicy {
    /// Record the offending field and keep scanning.
    #[default]
    Collect,
    /// Stop the traversal at the first offending field.
    Abort,
}


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    pub config_error_policy: ConfigErrorPolicy,
    pub max_depth: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            config_error_policy: ConfigErrorPolicy::Collect,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}


#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum ErrorKind {
    Config,
    NotFound,
    Deletion,
    Transaction,
    Internal,
}


#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeletionError {
    #[error("Field {field} of {entity_type} is not covered by its cascade configuration")]
    UnselectedField { entity_type: String, field: String },
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
    #[error("Cascade below {entity_type} exceeds max depth {max_depth}")]
    DepthExceeded { entity_type: String, max_depth: usize },
    #[error("Field {field} of {entity_type} holds objects without an id")]
    InvalidEntity { entity_type: String, field: String },
    #[error("Unexpected fault: {0}")]
    Fault(String),
}

impl DeletionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnselectedField { .. } => ErrorKind::Config,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::DeletionFailed { .. } => ErrorKind::Deletion,
            Self::Transaction(_) => ErrorKind::Transaction,
            Self::DepthExceeded { .. } | Self::InvalidEntity { .. } | Self::Fault(_) => {
                ErrorKind::Internal
            }
        }
    }

    pub fn entity_type(&self) -> Option<&str> {
        match self {
            Self::UnselectedField { entity_type, .. }
            | Self::NotFound { entity_type, .. }
            | Self::DeletionFailed { entity_type, .. }
            | Self::DepthExceeded { entity_type, .. }
            | Self::InvalidEntity { entity_type, .. } => Some(entity_type),
            Self::Transaction(_) | Self::Fault(_) => None,
        }
    }

    pub fn field(&self) -> Option<&str> {
        match self {
            Self::UnselectedField { field, .. } => Some(field),
            _ => None,
        }
    }
}

impl From<StoreError> for DeletionError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity_type, id } => Self::NotFound { entity_type, id },
            StoreError::DeletionFailed {
                entity_type,
                id,
                reason,
            } => Self::DeletionFailed {
                entity_type,
                id,
                reason,
            },
            StoreError::Transaction(reason) => Self::Transaction(reason),
            StoreError::Backend(reason) => Self::Fault(reason),
        }
    }
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeReport {
    pub deleted: Vec<EntityKey>,
    pub completed_at: DateTime<Utc>,
}

impl CascadeReport {
    pub fn new(deleted: Vec<EntityKey>) -> Self {
        Self {
            deleted,
            completed_at: Utc::now(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }
}


/// Every error met during one cascade, in encounter order. Never empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CascadeFailure {
    errors: Vec<DeletionError>,
}

impl CascadeFailure {
    pub fn new(first: DeletionError) -> Self {
        Self {
            errors: vec![first],
        }
    }

    pub(crate) fn from_errors(errors: Vec<DeletionError>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self { errors })
        }
    }

    pub fn push(&mut self, error: DeletionError) {
        self.errors.push(error);
    }

    pub fn error(&self) -> &DeletionError {
        &self.errors[0]
    }

    pub fn errors(&self) -> &[DeletionError] {
        &self.errors
    }

    pub fn kind(&self) -> ErrorKind {
        self.error().kind()
    }

    /// Field named by the first configuration error, if there was one.
    pub fn offending_field(&self) -> Option<&str> {
        self.errors.iter().find_map(DeletionError::field)
    }
}


#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DeletionOutcome {
    Success(CascadeReport),
    Failure(CascadeFailure),
}

impl DeletionOutcome {
    pub fn failure(error: DeletionError) -> Self {
        Self::Failure(CascadeFailure::new(error))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn report(&self) -> Option<&CascadeReport> {
        match self {
            Self::Success(report) => Some(report),
            Self::Failure(_) => None,
        }
    }

    pub fn failure_ref(&self) -> Option<&CascadeFailure> {
        match self {
            Self::Success(_) => None,
            Self::Failure(failure) => Some(failure),
        }
    }
}
