//! Review-sentiment trend from monthly histogram buckets.

use chrono::{Days, Months, NaiveDate};
use serde::Serialize;

use steamsync_core::HistogramEntry;

use crate::parse::month_start;

/// Percent change (either direction) that counts as a real movement.
pub const TREND_THRESHOLD_PERCENT: f64 = 2.0;

/// Default size of the "recent" window in days.
pub const DEFAULT_RECENT_DAYS: u64 = 30;

/// Months before the recent window that make up the comparison window.
const PREVIOUS_WINDOW_MONTHS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

impl TrendDirection {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TrendDirection::Up => "up",
            TrendDirection::Down => "down",
            TrendDirection::Stable => "stable",
        }
    }
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendAnalysis {
    pub current_ratio: f64,
    pub previous_ratio: f64,
    /// Relative change from previous to current, in percent.
    pub change_percent: f64,
    pub direction: TrendDirection,
}

/// Classifies a percent change against [`TREND_THRESHOLD_PERCENT`].
#[must_use]
pub fn classify_change(change_percent: f64) -> TrendDirection {
    if change_percent > TREND_THRESHOLD_PERCENT {
        TrendDirection::Up
    } else if change_percent < -TREND_THRESHOLD_PERCENT {
        TrendDirection::Down
    } else {
        TrendDirection::Stable
    }
}

/// Compares the positive-review ratio of the recent window against the
/// months just before it.
///
/// The recent window holds buckets whose month overlaps the last
/// `recent_days` days before `today`. The previous window holds up to three
/// months immediately before that. Returns `None` with fewer than two
/// entries, when either window is empty, or when either window has no votes.
#[must_use]
pub fn analyze_trend(
    entries: &[HistogramEntry],
    recent_days: u64,
    today: NaiveDate,
) -> Option<TrendAnalysis> {
    if entries.len() < 2 {
        return None;
    }

    let recent_start = month_start(today.checked_sub_days(Days::new(recent_days))?);
    let previous_start = recent_start.checked_sub_months(Months::new(PREVIOUS_WINDOW_MONTHS))?;

    let (recent, previous): (Vec<&HistogramEntry>, Vec<&HistogramEntry>) = entries
        .iter()
        .filter(|e| e.month_start >= previous_start && e.month_start <= today)
        .partition(|e| e.month_start >= recent_start);

    if recent.is_empty() || previous.is_empty() {
        return None;
    }

    let current_ratio = window_ratio(&recent)?;
    let previous_ratio = window_ratio(&previous)?;
    let change_percent = if previous_ratio > 0.0 {
        (current_ratio - previous_ratio) / previous_ratio * 100.0
    } else if current_ratio > 0.0 {
        100.0
    } else {
        0.0
    };

    Some(TrendAnalysis {
        current_ratio,
        previous_ratio,
        change_percent,
        direction: classify_change(change_percent),
    })
}

#[allow(clippy::cast_precision_loss)]
fn window_ratio(window: &[&HistogramEntry]) -> Option<f64> {
    let up: i64 = window.iter().map(|e| i64::from(e.recommendations_up)).sum();
    let total: i64 = window.iter().map(|e| e.total()).sum();
    (total > 0).then(|| up as f64 / total as f64)
}
