use serde::Serialize;
use time::OffsetDateTime;

/// Body for `POST /entries/start_timer/`.
#[derive(Debug, Clone, Serialize)]
pub struct StartTimerRequest {
    pub category_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<i64>,
    pub tag_ids: Vec<i64>,
    pub note: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StopTimerRequest {
    pub entry_id: i64,
}

/// Body for creating or updating an entry. Durations are computed
/// server-side from the instants.
#[derive(Debug, Clone, Serialize)]
pub struct UpsertEntryRequest {
    pub category: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<i64>,
    #[serde(with = "time::serde::rfc3339")]
    pub start_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub end_at: Option<OffsetDateTime>,
    pub note: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewCategory {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewTask {
    pub name: String,
    pub category: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
}
