use serde::{Deserialize, Serialize};

/// A node in the category tree as served by `/categories/tree/`.
///
/// `path` is the materialized path (`/Work/Deep Focus`) maintained by the
/// backend; descendant lookups are prefix matches on it.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub parent: Option<i64>,
    pub path: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub children: Vec<Category>,
}

/// Flatten a category tree into depth-first order, parents before children.
pub fn flatten(categories: &[Category]) -> Vec<&Category> {
    let mut result = Vec::new();
    for category in categories {
        result.push(category);
        result.extend(flatten(&category.children));
    }
    result
}

/// Find a category anywhere in the tree by id.
pub fn find_by_id(categories: &[Category], id: i64) -> Option<&Category> {
    for category in categories {
        if category.id == id {
            return Some(category);
        }
        if let Some(found) = find_by_id(&category.children, id) {
            return Some(found);
        }
    }
    None
}
