use serde::{Deserialize, Serialize};

use super::Tag;

/// A task belonging to a category.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Task {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: i64,
    #[serde(default)]
    pub category_name: String,
    #[serde(default)]
    pub default_tags: Vec<Tag>,
}
