mod date_range_filter;
mod entry_filter;

pub use date_range_filter::DateRangeFilter;
pub use entry_filter::EntryFilter;

pub trait TaktFilter {
    fn as_query_pairs(&self) -> Vec<(&'static str, String)>;
}
