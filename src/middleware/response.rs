use serde::Serialize;
use serde_json::Value;

use crate::deletion::{CascadeFailure, DeletionError, ErrorKind};


pub const INTERNAL_SERVER_ERROR: u16 = 500;


#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorDetails {
    pub kind: ErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
}


#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorPayload {
    pub status: u16,
    pub name: String,
    pub message: String,
    pub details: ErrorDetails,
}


#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub data: Value,
    pub error: ErrorPayload,
}


/// Server error for a failed cascade. Names the entity type and fields
/// involved, never the store's own error text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub body: ErrorBody,
}

impl ErrorResponse {
    pub fn from_failure(failure: &CascadeFailure) -> Self {
        let kind = failure.kind();
        let message = match kind {
            ErrorKind::Config => "Cascade delete configuration error",
            ErrorKind::NotFound => "Cascade delete target not found",
            ErrorKind::Deletion => "Cascade delete failed",
            ErrorKind::Transaction => "Cascade delete transaction failed",
            ErrorKind::Internal => "Cascade delete aborted",
        };
        let fields = failure
            .errors()
            .iter()
            .filter_map(DeletionError::field)
            .map(String::from)
            .collect();

        Self {
            status: INTERNAL_SERVER_ERROR,
            body: ErrorBody {
                data: Value::Null,
                error: ErrorPayload {
                    status: INTERNAL_SERVER_ERROR,
                    name: "CascadeDeleteError".to_string(),
                    message: message.to_string(),
                    details: ErrorDetails {
                        kind,
                        entity_type: failure.error().entity_type().map(String::from),
                        fields,
                    },
                },
            },
        }
    }
}
