//! Category model

use serde::{Deserialize, Serialize};

/// Name of the always-present fallback category
pub const FALLBACK_CATEGORY: &str = "Uncategorized";

/// Subcategory every category can fall back to
pub const DEFAULT_SUBCATEGORY: &str = "Default";

/// Category entity
///
/// `name` is unique case-insensitively across the category set.
/// `subcategories` is maintained as a deduplicated, sorted set on every
/// mutation (see [`normalize_subcategories`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// Document id (lives in the store path, not in the document)
    #[serde(skip)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub subcategories: Vec<String>,
}

impl Category {
    /// The fallback bucket as it is (re)created remotely
    pub fn fallback() -> Self {
        Self {
            id: String::new(),
            name: FALLBACK_CATEGORY.to_string(),
            subcategories: vec![DEFAULT_SUBCATEGORY.to_string()],
        }
    }

    /// Whether this is the undeletable fallback category
    pub fn is_fallback(&self) -> bool {
        self.name == FALLBACK_CATEGORY
    }

    pub fn has_subcategory(&self, name: &str) -> bool {
        self.subcategories.iter().any(|s| s == name)
    }
}

/// Create-category payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryDraft {
    pub name: String,
    #[serde(default)]
    pub subcategories: Vec<String>,
}

/// Normalize a subcategory list: drop blanks, dedup, sort, never empty
///
/// A category whose list would become empty gets `"Default"` (re)inserted.
pub fn normalize_subcategories(mut subcategories: Vec<String>) -> Vec<String> {
    subcategories.retain(|s| !s.trim().is_empty());
    subcategories.sort();
    subcategories.dedup();
    if subcategories.is_empty() {
        subcategories.push(DEFAULT_SUBCATEGORY.to_string());
    }
    subcategories
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_dedups_and_sorts() {
        let subs = normalize_subcategories(vec![
            "Winter".to_string(),
            "Default".to_string(),
            "Winter".to_string(),
            "  ".to_string(),
        ]);
        assert_eq!(subs, ["Default", "Winter"]);
    }

    #[test]
    fn test_normalize_never_empty() {
        assert_eq!(normalize_subcategories(vec![]), [DEFAULT_SUBCATEGORY]);
    }

    #[test]
    fn test_fallback_shape() {
        let fallback = Category::fallback();
        assert!(fallback.is_fallback());
        assert!(fallback.has_subcategory(DEFAULT_SUBCATEGORY));
    }

    #[test]
    fn test_document_omits_id() {
        let category = Category {
            id: "cat-1".to_string(),
            name: "Shoes".to_string(),
            subcategories: vec![DEFAULT_SUBCATEGORY.to_string()],
        };
        let json = serde_json::to_value(&category).unwrap();
        assert!(json.get("id").is_none());
    }
}
