use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;


pub type EntityId = String;


#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EntityParseError {
    #[error("Entity document must be a JSON object")]
    NotAnObject,
    #[error("Missing or invalid id on {0}")]
    MissingId(String),
    #[error("Field {0} mixes objects and scalars")]
    MixedSequence(String),
}


#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityKey {
    pub entity_type: String,
    pub id: EntityId,
}

impl EntityKey {
    pub fn new(entity_type: impl Into<String>, id: impl Into<EntityId>) -> Self {
        Self {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }
}

impl std::fmt::Display for EntityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.entity_type, self.id)
    }
}


/// A reference to a nested entity. The type is optional: readers that know
/// it set it, otherwise it is resolved from the parent's configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRef {
    pub id: EntityId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
}

impl EntityRef {
    pub fn new(id: impl Into<EntityId>) -> Self {
        Self {
            id: id.into(),
            entity_type: None,
        }
    }

    pub fn typed(entity_type: impl Into<String>, id: impl Into<EntityId>) -> Self {
        Self {
            id: id.into(),
            entity_type: Some(entity_type.into()),
        }
    }
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Null,
    Scalar(Value),
    One(EntityRef),
    Many(Vec<EntityRef>),
    /// Object data with no `id` to follow, such as a free-form JSON field.
    Embedded(Value),
}

impl FieldValue {
    /// Object-valued fields and non-empty sequences of objects.
    pub fn is_cascade_candidate(&self) -> bool {
        match self {
            Self::One(_) | Self::Embedded(_) => true,
            Self::Many(refs) => !refs.is_empty(),
            Self::Null | Self::Scalar(_) => false,
        }
    }

    pub fn references(&self) -> &[EntityRef] {
        match self {
            Self::One(r) => std::slice::from_ref(r),
            Self::Many(refs) => refs,
            Self::Null | Self::Scalar(_) | Self::Embedded(_) => &[],
        }
    }
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityNode {
    pub id: EntityId,
    fields: Vec<(String, FieldValue)>,
}

impl EntityNode {
    pub fn new(id: impl Into<EntityId>) -> Self {
        Self {
            id: id.into(),
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.set(name, value);
        self
    }

    #[must_use]
    pub fn with_scalar(self, name: impl Into<String>, value: Value) -> Self {
        self.with_field(name, FieldValue::Scalar(value))
    }

    #[must_use]
    pub fn with_one(self, name: impl Into<String>, reference: EntityRef) -> Self {
        self.with_field(name, FieldValue::One(reference))
    }

    #[must_use]
    pub fn with_many(self, name: impl Into<String>, references: Vec<EntityRef>) -> Self {
        self.with_field(name, FieldValue::Many(references))
    }

    /// Replaces the value in place when the field exists, keeping its position.
    pub fn set(&mut self, name: impl Into<String>, value: FieldValue) {
        let name = name.into();
        match self.fields.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Builds a node from a populated document such as a REST layer returns it.
    pub fn from_json(document: &Value) -> Result<Self, EntityParseError> {
        let object = document.as_object().ok_or(EntityParseError::NotAnObject)?;
        let id = object
            .get("id")
            .and_then(id_from_json)
            .ok_or_else(|| EntityParseError::MissingId("entity".to_string()))?;

        let mut node = Self::new(id);
        for (key, value) in object {
            if key == "id" {
                continue;
            }
            node.fields.push((key.clone(), field_from_json(key, value)?));
        }
        Ok(node)
    }
}


fn id_from_json(value: &Value) -> Option<EntityId> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.is_u64() || n.is_i64() => Some(n.to_string()),
        _ => None,
    }
}

fn ref_from_json(value: &Value) -> Option<EntityRef> {
    value.get("id").and_then(id_from_json).map(EntityRef::new)
}

fn field_from_json(field: &str, value: &Value) -> Result<FieldValue, EntityParseError> {
    match value {
        Value::Null => Ok(FieldValue::Null),
        Value::Object(_) => Ok(ref_from_json(value)
            .map(FieldValue::One)
            .unwrap_or_else(|| FieldValue::Embedded(value.clone()))),
        Value::Array(items) if items.is_empty() => Ok(FieldValue::Many(Vec::new())),
        Value::Array(items) => {
            let objects = items.iter().filter(|item| item.is_object()).count();
            if objects == 0 {
                Ok(FieldValue::Scalar(value.clone()))
            } else if objects == items.len() {
                Ok(items
                    .iter()
                    .map(ref_from_json)
                    .collect::<Option<Vec<_>>>()
                    .map(FieldValue::Many)
                    .unwrap_or_else(|| FieldValue::Embedded(value.clone())))
            } else {
                Err(EntityParseError::MixedSequence(field.to_string()))
            }
        }
        other => Ok(FieldValue::Scalar(other.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_shapes() {
        let node = EntityNode::from_json(&json!({
            "id": 7,
            "title": "Hello",
            "cover": { "id": 3, "url": "/a.png" },
            "sections": [{ "id": "s1" }, { "id": "s2" }],
            "tags": ["a", "b"],
            "comments": [],
            "deletedAt": null
        }))
        .unwrap();

        assert_eq!(node.id, "7");
        let names: Vec<_> = node.fields().map(|(name, _)| name).collect();
        assert_eq!(
            names,
            vec!["title", "cover", "sections", "tags", "comments", "deletedAt"]
        );
        assert!(matches!(node.get("title"), Some(FieldValue::Scalar(_))));
        assert_eq!(node.get("cover"), Some(&FieldValue::One(EntityRef::new("3"))));
        assert_eq!(
            node.get("sections").unwrap().references(),
            &[EntityRef::new("s1"), EntityRef::new("s2")]
        );
        assert!(matches!(node.get("tags"), Some(FieldValue::Scalar(_))));
        assert_eq!(node.get("comments"), Some(&FieldValue::Many(Vec::new())));
        assert_eq!(node.get("deletedAt"), Some(&FieldValue::Null));
    }

    #[test]
    fn test_from_json_rejects_bad_documents() {
        assert_eq!(
            EntityNode::from_json(&json!([1, 2])),
            Err(EntityParseError::NotAnObject)
        );
        assert_eq!(
            EntityNode::from_json(&json!({ "title": "no id" })),
            Err(EntityParseError::MissingId("entity".to_string()))
        );
        assert_eq!(
            EntityNode::from_json(&json!({ "id": 1, "mixed": [{ "id": 2 }, 3] })),
            Err(EntityParseError::MixedSequence("mixed".to_string()))
        );
    }

    #[test]
    fn test_objects_without_id_are_embedded() {
        let node = EntityNode::from_json(&json!({
            "id": 1,
            "metadata": { "seo": { "title": "x" } },
            "blocks": [{ "id": 5 }, { "kind": "quote" }]
        }))
        .unwrap();

        let metadata = node.get("metadata").unwrap();
        assert_eq!(metadata, &FieldValue::Embedded(json!({ "seo": { "title": "x" } })));
        assert!(metadata.is_cascade_candidate());
        assert!(metadata.references().is_empty());
        assert!(matches!(node.get("blocks"), Some(FieldValue::Embedded(_))));
    }

    #[test]
    fn test_candidates() {
        assert!(FieldValue::One(EntityRef::new("1")).is_cascade_candidate());
        assert!(FieldValue::Many(vec![EntityRef::new("1")]).is_cascade_candidate());
        assert!(!FieldValue::Many(Vec::new()).is_cascade_candidate());
        assert!(!FieldValue::Null.is_cascade_candidate());
        assert!(!FieldValue::Scalar(json!(1)).is_cascade_candidate());
        assert!(FieldValue::Embedded(json!({})).is_cascade_candidate());
    }

    #[test]
    fn test_set_keeps_field_position() {
        let mut node = EntityNode::new("1")
            .with_scalar("a", json!(1))
            .with_scalar("b", json!(2));
        node.set("a", FieldValue::Null);

        let names: Vec<_> = node.fields().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(node.get("a"), Some(&FieldValue::Null));
    }
}
