

use thiserror::Error;

use crate::db::EntityParseError;
use crate::deletion::ConfigError;


#[derive(Error, Debug)]
pub enum CascadeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid entity document: {0}")]
    Entity(#[from] EntityParseError),

    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}


pub type Result<T> = std::result::Result<T, CascadeError>;
