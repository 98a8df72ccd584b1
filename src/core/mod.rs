

pub mod config;
pub mod error;

pub use config::CascadeSettings;
pub use error::{CascadeError, Result};
