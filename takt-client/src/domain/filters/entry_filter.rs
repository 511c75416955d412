use time::Date;

use super::TaktFilter;

/// Query filter for `/entries/`: optional category (with or without its
/// descendants), optional tag name, optional date range.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryFilter {
    pub category: Option<i64>,
    pub include_descendants: bool,
    pub tag: Option<String>,
    pub from: Option<Date>,
    pub to: Option<Date>,
}

impl EntryFilter {
    pub fn for_category(category: i64, include_descendants: bool) -> Self {
        Self {
            category: Some(category),
            include_descendants,
            ..Self::default()
        }
    }

    pub fn with_range(mut self, from: Date, to: Date) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }
}

impl TaktFilter for EntryFilter {
    fn as_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(category) = self.category {
            pairs.push(("category", category.to_string()));
            if self.include_descendants {
                pairs.push(("include_descendants", "true".to_string()));
            }
        }
        if let Some(tag) = &self.tag {
            pairs.push(("tag", tag.clone()));
        }
        if let Some(from) = self.from {
            pairs.push(("from", from.to_string()));
        }
        if let Some(to) = self.to {
            pairs.push(("to", to.to_string()));
        }
        pairs
    }
}
