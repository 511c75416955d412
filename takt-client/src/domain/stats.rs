use serde::{Deserialize, Serialize};

/// Aggregate statistics for a category (descendants included), as served
/// by `/categories/{id}/stats/`. Durations are integer seconds except the
/// averages, which the backend reports as floats. Consumed, never mutated.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct CategoryStats {
    pub total_entries: u64,
    pub avg_duration: f64,
    pub min_duration: i64,
    #[serde(default)]
    pub max_duration: i64,
    pub total_time: i64,
    #[serde(default)]
    pub recent_avg: f64,
}

/// Period aggregate from `/entries/stats_summary/`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StatsSummary {
    pub total_seconds: i64,
    pub total_entries: u64,
    pub avg_session_seconds: f64,
    #[serde(default)]
    pub total_seconds_by_category: Vec<CategoryBreakdown>,
    #[serde(default)]
    pub total_seconds_by_tag: Vec<TagBreakdown>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CategoryBreakdown {
    #[serde(rename = "category__path")]
    pub category_path: String,
    pub total_seconds: i64,
    pub entry_count: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TagBreakdown {
    #[serde(rename = "tags__name")]
    pub tag_name: String,
    pub total_seconds: i64,
    pub entry_count: u64,
}

/// One row of `/entries/top_tasks/`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TopTask {
    #[serde(rename = "task__name")]
    pub task_name: String,
    #[serde(rename = "task__category__path")]
    pub category_path: String,
    pub total_seconds: i64,
    pub entry_count: u64,
}
