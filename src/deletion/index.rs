use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

use super::selector::{DeletionConfig, FieldSelector};


#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Duplicate cascade configuration for {0}")]
    DuplicateEntityType(String),
    #[error("Empty field list for {0}")]
    EmptyFieldSet(String),
    #[error("Cascade configuration entry without an entity type")]
    EmptyEntityType,
}


/// Cascade configuration keyed by entity type. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigIndex {
    configs: HashMap<String, DeletionConfig>,
}

impl ConfigIndex {
    pub fn new(records: impl IntoIterator<Item = DeletionConfig>) -> Result<Self, ConfigError> {
        let mut configs = HashMap::new();

        for record in records {
            if record.entity_type.is_empty() {
                return Err(ConfigError::EmptyEntityType);
            }
            if matches!(&record.fields, FieldSelector::FieldSet(names) if names.is_empty()) {
                return Err(ConfigError::EmptyFieldSet(record.entity_type));
            }
            if configs.contains_key(&record.entity_type) {
                return Err(ConfigError::DuplicateEntityType(record.entity_type));
            }
            configs.insert(record.entity_type.clone(), record);
        }

        debug!("Built cascade config index with {} entity types", configs.len());
        Ok(Self { configs })
    }

    pub fn lookup(&self, entity_type: &str) -> Option<&DeletionConfig> {
        self.configs.get(entity_type)
    }

    pub fn contains(&self, entity_type: &str) -> bool {
        self.configs.contains_key(entity_type)
    }

    /// Entity type of the records held by `field` on a `parent_type` entity.
    pub fn related_type<'a>(&'a self, parent_type: &str, field: &'a str) -> &'a str {
        self.lookup(parent_type)
            .map(|config| config.related_type(field))
            .unwrap_or(field)
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<DeletionConfig> {
        vec![
            DeletionConfig::new("article", FieldSelector::set(["sections"])),
            DeletionConfig::new("section", FieldSelector::Wildcard).with_relation("author", "user"),
        ]
    }

    #[test]
    fn test_lookup() {
        let index = ConfigIndex::new(records()).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(
            index.lookup("section").map(|c| &c.fields),
            Some(&FieldSelector::Wildcard)
        );
        assert!(index.lookup("image").is_none());
        assert_eq!(index.related_type("section", "author"), "user");
        assert_eq!(index.related_type("article", "sections"), "sections");
        assert_eq!(index.related_type("image", "thumbnails"), "thumbnails");
    }

    #[test]
    fn test_rejects_duplicates() {
        let mut records = records();
        records.push(DeletionConfig::new("article", FieldSelector::Wildcard));
        assert_eq!(
            ConfigIndex::new(records),
            Err(ConfigError::DuplicateEntityType("article".to_string()))
        );
    }

    #[test]
    fn test_rejects_empty_field_set_and_type() {
        let empty = DeletionConfig::new("article", FieldSelector::set(Vec::<String>::new()));
        assert_eq!(
            ConfigIndex::new([empty]),
            Err(ConfigError::EmptyFieldSet("article".to_string()))
        );

        let nameless = DeletionConfig::new("", FieldSelector::Wildcard);
        assert_eq!(ConfigIndex::new([nameless]), Err(ConfigError::EmptyEntityType));
    }

    #[test]
    fn test_load_order_does_not_matter() {
        let forward = ConfigIndex::new(records()).unwrap();
        let mut reversed = records();
        reversed.reverse();
        let reversed = ConfigIndex::new(reversed).unwrap();

        assert_eq!(forward, reversed);
        for entity_type in ["article", "section", "image"] {
            assert_eq!(forward.lookup(entity_type), reversed.lookup(entity_type));
        }
    }
}
