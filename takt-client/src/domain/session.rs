use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::Tag;

/// One timed interval of tracked activity, running or finalized.
///
/// The backend is the system of record for the persisted copy; the engine
/// owns the in-memory state of the running session. `is_running` mirrors
/// `end_at.is_none()` and at most one session is running at a time.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Session {
    pub id: i64,
    pub category: i64,
    pub category_name: String,
    #[serde(default)]
    pub task: Option<i64>,
    #[serde(default)]
    pub task_name: Option<String>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub note: String,
    #[serde(with = "time::serde::rfc3339")]
    pub start_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option", default)]
    pub end_at: Option<OffsetDateTime>,
    #[serde(default)]
    pub duration_seconds: i64,
    #[serde(default)]
    pub is_running: bool,
}
