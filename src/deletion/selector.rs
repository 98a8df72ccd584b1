use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};


pub const WILDCARD: &str = "*";


#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
enum RawSelector {
    One(String),
    Many(Vec<String>),
}

/// Which object-valued fields of an entity type take part in a cascade.
///
/// In configuration it is written as `"*"`, a bare field name, or an array
/// of field names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawSelector", into = "RawSelector")]
pub enum FieldSelector {
    Wildcard,
    SingleField(String),
    FieldSet(BTreeSet<String>),
}

impl FieldSelector {
    pub fn single(name: impl Into<String>) -> Self {
        Self::SingleField(name.into())
    }

    pub fn set<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::FieldSet(names.into_iter().map(Into::into).collect())
    }

    pub fn selects(&self, field: &str) -> bool {
        match self {
            Self::Wildcard => true,
            Self::SingleField(name) => name == field,
            Self::FieldSet(names) => names.contains(field),
        }
    }
}

impl From<RawSelector> for FieldSelector {
    fn from(raw: RawSelector) -> Self {
        match raw {
            RawSelector::One(name) if name == WILDCARD => Self::Wildcard,
            RawSelector::One(name) => Self::SingleField(name),
            RawSelector::Many(names) => Self::FieldSet(names.into_iter().collect()),
        }
    }
}

impl From<FieldSelector> for RawSelector {
    fn from(selector: FieldSelector) -> Self {
        match selector {
            FieldSelector::Wildcard => Self::One(WILDCARD.to_string()),
            FieldSelector::SingleField(name) => Self::One(name),
            FieldSelector::FieldSet(names) => Self::Many(names.into_iter().collect()),
        }
    }
}


#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionConfig {
    #[serde(alias = "entityType", alias = "contentType")]
    pub entity_type: String,
    pub fields: FieldSelector,
    /// Related entity type per field, for fields not named after their type.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub relations: BTreeMap<String, String>,
}

impl DeletionConfig {
    pub fn new(entity_type: impl Into<String>, fields: FieldSelector) -> Self {
        Self {
            entity_type: entity_type.into(),
            fields,
            relations: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_relation(mut self, field: impl Into<String>, related_type: impl Into<String>) -> Self {
        self.relations.insert(field.into(), related_type.into());
        self
    }

    pub fn related_type<'a>(&'a self, field: &'a str) -> &'a str {
        self.relations.get(field).map(String::as_str).unwrap_or(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_selector_from_config_values() {
        let wildcard: FieldSelector = serde_json::from_value(json!("*")).unwrap();
        assert_eq!(wildcard, FieldSelector::Wildcard);

        let single: FieldSelector = serde_json::from_value(json!("comments")).unwrap();
        assert_eq!(single, FieldSelector::single("comments"));

        let set: FieldSelector = serde_json::from_value(json!(["comments", "sections"])).unwrap();
        assert_eq!(set, FieldSelector::set(["sections", "comments"]));

        assert_eq!(serde_json::to_value(&wildcard).unwrap(), json!("*"));
        assert!(serde_json::from_value::<FieldSelector>(json!(3)).is_err());
    }

    #[test]
    fn test_selects() {
        assert!(FieldSelector::Wildcard.selects("anything"));
        assert!(FieldSelector::single("comments").selects("comments"));
        assert!(!FieldSelector::single("comments").selects("tags"));
        assert!(FieldSelector::set(["comments", "tags"]).selects("tags"));
        assert!(!FieldSelector::set(["comments"]).selects("tags"));
    }

    #[test]
    fn test_related_type_defaults_to_field_name() {
        let config = DeletionConfig::new("article", FieldSelector::Wildcard)
            .with_relation("cover", "image");
        assert_eq!(config.related_type("cover"), "image");
        assert_eq!(config.related_type("sections"), "sections");
    }

    #[test]
    fn test_config_record_aliases() {
        let config: DeletionConfig = serde_json::from_value(json!({
            "contentType": "article",
            "fields": "sections",
            "relations": { "sections": "section" }
        }))
        .unwrap();
        assert_eq!(config.entity_type, "article");
        assert_eq!(config.related_type("sections"), "section");
    }
}
