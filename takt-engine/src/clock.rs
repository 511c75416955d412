use time::OffsetDateTime;

/// Wall-clock anchored session clock.
///
/// Elapsed time is recomputed from the absolute start instant on every
/// tick instead of adding interval increments, so elapsed time stays
/// accurate after missed ticks: the system sleeping and waking, a
/// suspended process, or a stalled scheduler never make it drift.
#[derive(Debug, Clone, Default)]
pub struct SessionClock {
    anchor: Option<OffsetDateTime>,
}

impl SessionClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Anchor the clock at the given start instant. An anchor in the
    /// future (server clock skew) is clamped to the current wall clock so
    /// elapsed time starts at zero instead of going negative.
    pub fn start(&mut self, anchor: OffsetDateTime) {
        let now = OffsetDateTime::now_utc();
        self.anchor = Some(anchor.min(now));
    }

    /// Clear the anchor. Stopping an already-stopped clock is a no-op.
    pub fn stop(&mut self) {
        self.anchor = None;
    }

    pub fn is_running(&self) -> bool {
        self.anchor.is_some()
    }

    /// Whole seconds elapsed between the anchor and `now`, floored at
    /// zero. Returns 0 when the clock is stopped.
    pub fn tick(&self, now: OffsetDateTime) -> i64 {
        match self.anchor {
            Some(anchor) => (now - anchor).whole_seconds().max(0),
            None => 0,
        }
    }
}
