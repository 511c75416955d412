use thiserror::Error;
use time::{Date, Duration, OffsetDateTime, Time};

#[derive(Error, Debug, PartialEq)]
pub enum IntervalError {
    #[error("end {end} precedes start {start}")]
    EndBeforeStart {
        start: OffsetDateTime,
        end: OffsetDateTime,
    },
    #[error("invalid clock value: {input:?} (expected HH:MM)")]
    InvalidClock { input: String },
}

/// A resolved interval duration in whole seconds.
///
/// `overlong` is a soft warning, not a failure: the duration exceeded the
/// configured long-session cutoff and the caller should require explicit
/// confirmation before persisting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    pub seconds: i64,
    pub overlong: bool,
}

/// Computes exact integer-second durations between a start and a possibly
/// absent end point, resolving day-boundary ambiguity for clock-of-day
/// inputs. All arithmetic happens on absolute instants; once instants are
/// built there is no calendar math left to be skewed by DST transitions.
#[derive(Debug, Clone, Copy)]
pub struct DurationResolver {
    long_session_cutoff: Duration,
}

impl Default for DurationResolver {
    fn default() -> Self {
        Self {
            long_session_cutoff: Duration::hours(24),
        }
    }
}

impl DurationResolver {
    pub fn new(long_session_cutoff: Duration) -> Self {
        Self {
            long_session_cutoff,
        }
    }

    /// Duration between two absolute instants. `None` end means the
    /// session is still running and no duration is produced; the caller
    /// uses the session clock instead.
    pub fn resolve_absolute(
        &self,
        start: OffsetDateTime,
        end: Option<OffsetDateTime>,
    ) -> Result<Option<Resolved>, IntervalError> {
        let Some(end) = end else {
            return Ok(None);
        };
        if end < start {
            return Err(IntervalError::EndBeforeStart { start, end });
        }
        let seconds = (end - start).whole_seconds();
        Ok(Some(Resolved {
            seconds,
            overlong: (end - start) > self.long_session_cutoff,
        }))
    }

    /// Duration between two `HH:MM` clock values on a reference date.
    ///
    /// When the end clock is at or before the start clock the end instant
    /// is advanced to the following calendar day before the duration is
    /// computed, modeling a session that crosses midnight.
    pub fn resolve_time_of_day(
        &self,
        reference_date: Date,
        start_clock: &str,
        end_clock: Option<&str>,
    ) -> Result<Option<Resolved>, IntervalError> {
        let start_time = parse_clock(start_clock)?;
        let start = OffsetDateTime::new_utc(reference_date, start_time);

        let Some(end_clock) = end_clock else {
            return Ok(None);
        };
        let end_time = parse_clock(end_clock)?;
        let mut end = OffsetDateTime::new_utc(reference_date, end_time);
        if end <= start {
            end += Duration::days(1);
        }

        self.resolve_absolute(start, Some(end))
    }
}

/// Strict `HH:MM` parsing; single-digit hours are accepted, minutes must
/// be two digits.
pub fn parse_clock(input: &str) -> Result<Time, IntervalError> {
    let invalid = || IntervalError::InvalidClock {
        input: input.to_string(),
    };

    let (hours, minutes) = input.split_once(':').ok_or_else(invalid)?;
    if hours.is_empty() || hours.len() > 2 || minutes.len() != 2 {
        return Err(invalid());
    }
    let hours: u8 = hours.parse().map_err(|_| invalid())?;
    let minutes: u8 = minutes.parse().map_err(|_| invalid())?;
    Time::from_hms(hours, minutes, 0).map_err(|_| invalid())
}
