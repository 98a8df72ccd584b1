

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::error::Result;
use crate::deletion::{ConfigErrorPolicy, ConfigIndex, DeletionConfig, EngineOptions};
use crate::{DEFAULT_API_PREFIX, DEFAULT_MAX_DEPTH};


#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CascadeSettings {

    pub api_prefix: String,


    pub config_error_policy: ConfigErrorPolicy,
    pub max_depth: usize,


    #[serde(alias = "applyTo", alias = "applyto")]
    pub apply_to: Vec<DeletionConfig>,
}

impl CascadeSettings {

    pub fn new(apply_to: Vec<DeletionConfig>) -> Self {
        Self {
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            config_error_policy: ConfigErrorPolicy::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            apply_to,
        }
    }

    /// Reads a settings file (any format the `config` crate recognizes by
    /// extension) and layers `CASCADE_*` environment variables on top.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Reading cascade settings from {:?}", path);

        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(config::Environment::with_prefix("CASCADE").try_parsing(true))
            .build()?;

        let settings: Self = settings.try_deserialize()?;
        if settings.apply_to.is_empty() {
            warn!("No cascade entries in {:?}; every delete will pass through", path);
        }
        debug!(
            "Loaded {} cascade entries (policy: {}, max_depth: {})",
            settings.apply_to.len(),
            settings.config_error_policy,
            settings.max_depth
        );
        Ok(settings)
    }


    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Self::default();

        if let Some(prefix) = var("CASCADE_API_PREFIX") {
            settings.api_prefix = prefix;
        }
        if let Some(policy) = var("CASCADE_CONFIG_ERROR_POLICY") {
            match policy.parse() {
                Ok(policy) => settings.config_error_policy = policy,
                Err(_) => warn!("Ignoring unknown CASCADE_CONFIG_ERROR_POLICY: {}", policy),
            }
        }
        if let Some(depth) = var("CASCADE_MAX_DEPTH").and_then(|d| d.parse().ok()) {
            settings.max_depth = depth;
        }
        if let Some(raw) = var("CASCADE_APPLY_TO") {
            match serde_json::from_str(&raw) {
                Ok(apply_to) => settings.apply_to = apply_to,
                Err(e) => warn!("Ignoring malformed CASCADE_APPLY_TO: {}", e),
            }
        }

        settings
    }


    pub fn build_index(&self) -> Result<ConfigIndex> {
        Ok(ConfigIndex::new(self.apply_to.clone())?)
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            config_error_policy: self.config_error_policy,
            max_depth: self.max_depth,
        }
    }
}

impl Default for CascadeSettings {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
