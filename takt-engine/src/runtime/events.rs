use takt_client::domain::{CategoryStats, Session, Task};
use takt_client::dto::StartTimerRequest;
use time::Date;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::sequencer::RequestToken;

/// UI intents and async completions, processed one at a time by the
/// dispatcher. Making completions ordinary events is what turns the
/// "most recent intent wins" rule into a structural property instead of
/// token checks scattered through callbacks.
#[derive(Debug, Clone)]
pub enum AppEvent {
    Start(StartTimerRequest),
    Stop,
    Tick,
    FilterChanged {
        category: Option<i64>,
        include_descendants: bool,
    },
    ResponseArrived {
        token: RequestToken,
        payload: ScopePayload,
    },
    SaveEntryEdit(EntryEdit),
    ConfirmOverlongEdit,
    CancelOverlongEdit,
    DeleteSession {
        entry_id: i64,
    },
    Refresh,
    Shutdown,
}

/// Payload of a completed read, tagged by scope.
#[derive(Debug, Clone)]
pub enum ScopePayload {
    Tasks(Vec<Task>),
    Sessions(Vec<Session>),
    CategoryStats(CategoryStats),
}

/// A manually edited entry as typed: clock-of-day values on a reference
/// date. The dispatcher resolves these through the duration resolver
/// before anything is persisted.
#[derive(Debug, Clone)]
pub struct EntryEdit {
    pub entry_id: i64,
    pub date: Date,
    pub start_clock: String,
    pub end_clock: Option<String>,
    pub category: i64,
    pub task: Option<i64>,
    pub note: String,
}

pub type EventTx = UnboundedSender<AppEvent>;
pub type EventRx = UnboundedReceiver<AppEvent>;

pub fn channel() -> (EventTx, EventRx) {
    mpsc::unbounded_channel()
}
