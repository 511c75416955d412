use takt_client::domain::{Category, CategoryStats, EntryFilter, Session, Tag, Task};
use takt_client::dto::UpsertEntryRequest;
use time::OffsetDateTime;

use crate::clock::SessionClock;
use crate::config::TaktConfig;
use crate::duration::DurationResolver;
use crate::pace::{classify, Pace, PaceThresholds};
use crate::runtime::Debouncer;
use crate::sequencer::RequestSequencer;

/// An edit whose resolved duration exceeded the long-session cutoff,
/// parked until the user explicitly confirms or cancels it.
#[derive(Debug, Clone)]
pub struct PendingEdit {
    pub entry_id: i64,
    pub request: UpsertEntryRequest,
    pub seconds: i64,
}

/// The owned application state. Every field is mutated exclusively
/// through the event dispatcher; there is no ambient or global state,
/// and no locking: the engine runs on one logical thread of control.
pub struct App {
    pub running: bool,

    /// The running session, if any, and its wall-clock anchor.
    pub session: Option<Session>,
    pub clock: SessionClock,
    pub elapsed_seconds: i64,
    /// Live pace against `session_stats`; `None` until stats arrive.
    pub pace: Option<Pace>,
    /// Historical stats for the running session's category.
    pub session_stats: Option<CategoryStats>,

    // Fetched collections
    pub sessions: Vec<Session>,
    pub categories: Vec<Category>,
    pub tasks: Vec<Task>,
    pub tags: Vec<Tag>,

    /// Active session-list filter; changes to it are debounced.
    pub filter: EntryFilter,
    pub sequencer: RequestSequencer,
    pub filter_debounce: Debouncer<EntryFilter>,

    pub status_message: Option<String>,
    pub pending_overlong: Option<PendingEdit>,

    // Policy from config
    pub resolver: DurationResolver,
    pub thresholds: PaceThresholds,
}

impl App {
    pub fn new(cfg: &TaktConfig) -> Self {
        Self {
            running: true,
            session: None,
            clock: SessionClock::new(),
            elapsed_seconds: 0,
            pace: None,
            session_stats: None,
            sessions: Vec::new(),
            categories: Vec::new(),
            tasks: Vec::new(),
            tags: Vec::new(),
            filter: EntryFilter::default(),
            sequencer: RequestSequencer::new(),
            filter_debounce: Debouncer::new(cfg.filter_debounce()),
            status_message: None,
            pending_overlong: None,
            resolver: cfg.duration_resolver(),
            thresholds: cfg.pace_thresholds(),
        }
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn set_status(&mut self, message: String) {
        self.status_message = Some(message);
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
    }

    /// Adopt a session the backend reports as running: anchor the clock
    /// at its start instant and reset the pace readout until fresh stats
    /// arrive for its category.
    pub fn start_session(&mut self, session: Session) {
        self.clock.start(session.start_at);
        self.elapsed_seconds = 0;
        self.pace = None;
        self.session_stats = None;
        self.session = Some(session);
    }

    /// Drop the running session. Safe to call when nothing is running.
    pub fn clear_session(&mut self) {
        self.clock.stop();
        self.session = None;
        self.elapsed_seconds = 0;
        self.pace = None;
        self.session_stats = None;
    }

    pub fn session_id(&self) -> Option<i64> {
        self.session.as_ref().map(|s| s.id)
    }

    /// Recompute elapsed time from the clock anchor and reclassify pace.
    pub fn tick(&mut self, now: OffsetDateTime) {
        self.elapsed_seconds = self.clock.tick(now);
        self.pace = match (&self.session, &self.session_stats) {
            (Some(_), Some(stats)) => {
                Some(classify(self.elapsed_seconds, stats, &self.thresholds))
            }
            _ => None,
        };
    }

    /// Replace the session list, newest start first.
    pub fn apply_sessions(&mut self, mut sessions: Vec<Session>) {
        sessions.sort_by(|a, b| b.start_at.cmp(&a.start_at));
        self.sessions = sessions;
    }

    pub fn apply_tasks(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
    }

    pub fn apply_tags(&mut self, tags: Vec<Tag>) {
        self.tags = tags;
    }

    pub fn apply_categories(&mut self, categories: Vec<Category>) {
        self.categories = categories;
    }

    pub fn apply_session_stats(&mut self, stats: CategoryStats) {
        self.session_stats = Some(stats);
    }
}

/// Format whole seconds as HH:MM:SS. Hours grow past 24 rather than
/// wrapping.
pub fn format_duration(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}
