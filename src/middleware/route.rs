use serde::{Deserialize, Serialize};


#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteTarget {
    pub entity_type: String,
    pub id: String,
}


/// Matches `DELETE {api_prefix}{collection}/{id}` and nothing deeper. The
/// entity type is the collection name without its plural `s`.
pub fn parse_delete_target(method: &str, path: &str, api_prefix: &str) -> Option<DeleteTarget> {
    if !method.eq_ignore_ascii_case("DELETE") {
        return None;
    }

    let path = path.split(['?', '#']).next().unwrap_or(path);
    let prefix = api_prefix.trim_end_matches('/');
    let rest = path.strip_prefix(prefix)?.strip_prefix('/')?;

    let mut segments = rest.split('/');
    let collection = segments.next().filter(|s| !s.is_empty())?;
    let id = segments.next().filter(|s| !s.is_empty())?;
    if segments.next().is_some() {
        return None;
    }

    Some(DeleteTarget {
        entity_type: singular(collection).to_string(),
        id: id.to_string(),
    })
}


fn singular(collection: &str) -> &str {
    collection.strip_suffix('s').unwrap_or(collection)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(entity_type: &str, id: &str) -> Option<DeleteTarget> {
        Some(DeleteTarget {
            entity_type: entity_type.to_string(),
            id: id.to_string(),
        })
    }

    #[test]
    fn test_matches_delete_by_id() {
        assert_eq!(parse_delete_target("DELETE", "/api/articles/5", "/api/"), target("article", "5"));
        assert_eq!(parse_delete_target("delete", "/api/articles/5?locale=en", "/api/"), target("article", "5"));
        assert_eq!(parse_delete_target("DELETE", "/rest/comments/9", "/rest"), target("comment", "9"));
        assert_eq!(parse_delete_target("DELETE", "/api/media/9", "/api/"), target("media", "9"));
    }

    #[test]
    fn test_ignores_other_requests() {
        assert_eq!(parse_delete_target("GET", "/api/articles/5", "/api/"), None);
        assert_eq!(parse_delete_target("DELETE", "/api/articles", "/api/"), None);
        assert_eq!(parse_delete_target("DELETE", "/api/articles/", "/api/"), None);
        assert_eq!(parse_delete_target("DELETE", "/api/articles/5/comments", "/api/"), None);
        assert_eq!(parse_delete_target("DELETE", "/admin/articles/5", "/api/"), None);
        assert_eq!(parse_delete_target("DELETE", "/apix/articles/5", "/api/"), None);
    }
}
