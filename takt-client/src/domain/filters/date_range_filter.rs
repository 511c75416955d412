use time::Date;

use super::TaktFilter;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DateRangeFilter {
    pub from: Date,
    pub to: Date,
}

impl DateRangeFilter {
    pub fn new(from: Date, to: Date) -> Self {
        Self { from, to }
    }
}

impl TaktFilter for DateRangeFilter {
    fn as_query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![("from", self.from.to_string()), ("to", self.to.to_string())]
    }
}
