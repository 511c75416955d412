use serde::{Deserialize, Serialize};
use takt_client::domain::CategoryStats;

/// Pace of a live session relative to the category's history, ordered
/// fastest to slowest. Serialized snake_case for the display layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pace {
    /// No history to compare against.
    First,
    /// Faster than the best recorded time.
    Record,
    Fast,
    Normal,
    Slow,
    VerySlow,
}

impl std::fmt::Display for Pace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Pace::First => "first",
            Pace::Record => "record",
            Pace::Fast => "fast",
            Pace::Normal => "normal",
            Pace::Slow => "slow",
            Pace::VerySlow => "very_slow",
        };
        f.write_str(label)
    }
}

/// Multipliers applied to the category's average duration to draw the
/// fast/normal/slow boundaries. Policy constants, kept configurable so
/// they can be tuned without touching the classification flow.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaceThresholds {
    pub fast: f64,
    pub normal: f64,
    pub slow: f64,
}

impl Default for PaceThresholds {
    fn default() -> Self {
        Self {
            fast: 0.8,
            normal: 1.2,
            slow: 1.5,
        }
    }
}

/// Classify a live elapsed duration against historical statistics.
/// Pure function; rules are evaluated in order, first match wins.
pub fn classify(elapsed_seconds: i64, stats: &CategoryStats, thresholds: &PaceThresholds) -> Pace {
    if stats.total_entries == 0 {
        return Pace::First;
    }
    if elapsed_seconds < stats.min_duration {
        return Pace::Record;
    }

    let avg = stats.avg_duration;
    if avg <= 0.0 {
        // Degenerate history: every average-relative band is empty.
        return if elapsed_seconds > 0 {
            Pace::VerySlow
        } else {
            Pace::Normal
        };
    }

    let elapsed = elapsed_seconds as f64;
    if elapsed < avg * thresholds.fast {
        Pace::Fast
    } else if elapsed < avg * thresholds.normal {
        Pace::Normal
    } else if elapsed < avg * thresholds.slow {
        Pace::Slow
    } else {
        Pace::VerySlow
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(min: i64, avg: f64, entries: u64) -> CategoryStats {
        CategoryStats {
            total_entries: entries,
            avg_duration: avg,
            min_duration: min,
            max_duration: 0,
            total_time: 0,
            recent_avg: 0.0,
        }
    }

    #[test]
    fn bands_against_min_100_avg_200() {
        let stats = stats(100, 200.0, 5);
        let thresholds = PaceThresholds::default();

        assert_eq!(classify(99, &stats, &thresholds), Pace::Record);
        assert_eq!(classify(150, &stats, &thresholds), Pace::Fast);
        assert_eq!(classify(220, &stats, &thresholds), Pace::Normal);
        assert_eq!(classify(280, &stats, &thresholds), Pace::Slow);
        assert_eq!(classify(400, &stats, &thresholds), Pace::VerySlow);
    }

    #[test]
    fn band_boundaries_are_exclusive_upper() {
        let stats = stats(100, 200.0, 5);
        let thresholds = PaceThresholds::default();

        // 200 * 0.8 = 160 falls out of fast, into normal.
        assert_eq!(classify(160, &stats, &thresholds), Pace::Normal);
        assert_eq!(classify(240, &stats, &thresholds), Pace::Slow);
        assert_eq!(classify(300, &stats, &thresholds), Pace::VerySlow);
    }

    #[test]
    fn no_history_is_always_first() {
        let empty = stats(0, 0.0, 0);
        let thresholds = PaceThresholds::default();
        assert_eq!(classify(0, &empty, &thresholds), Pace::First);
        assert_eq!(classify(100_000, &empty, &thresholds), Pace::First);

        // Other statistics values are irrelevant when there are no entries.
        let odd = stats(500, 900.0, 0);
        assert_eq!(classify(50, &odd, &thresholds), Pace::First);
    }

    #[test]
    fn degenerate_zero_average_with_history() {
        let degenerate = stats(0, 0.0, 3);
        let thresholds = PaceThresholds::default();
        assert_eq!(classify(0, &degenerate, &thresholds), Pace::Normal);
        assert_eq!(classify(1, &degenerate, &thresholds), Pace::VerySlow);
    }

    #[test]
    fn record_still_wins_over_degenerate_average() {
        let degenerate = stats(60, 0.0, 3);
        let thresholds = PaceThresholds::default();
        assert_eq!(classify(30, &degenerate, &thresholds), Pace::Record);
    }

    #[test]
    fn custom_thresholds_move_the_bands() {
        let stats = stats(100, 200.0, 5);
        let loose = PaceThresholds {
            fast: 1.0,
            normal: 2.0,
            slow: 3.0,
        };
        assert_eq!(classify(220, &stats, &loose), Pace::Normal);
        assert_eq!(classify(450, &stats, &loose), Pace::Slow);
    }

    #[test]
    fn serializes_snake_case_for_the_display_layer() {
        assert_eq!(serde_json::to_string(&Pace::VerySlow).unwrap(), "\"very_slow\"");
        assert_eq!(Pace::VerySlow.to_string(), "very_slow");
        assert_eq!(Pace::Record.to_string(), "record");
    }
}
