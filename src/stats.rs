use chrono::{Datelike, Duration, NaiveDate};
use std::collections::BTreeMap;

use crate::models::{DerivedPoint, SummaryStats};

/// Mean PR over rows with `date > latest - days`. The latest date itself is
/// always inside the window. An empty window is NaN, not zero.
pub fn trailing_average(points: &[DerivedPoint], latest: NaiveDate, days: i64) -> f64 {
    let cutoff = latest - Duration::days(days);
    let mut sum = 0.0;
    let mut count = 0usize;
    for point in points {
        if point.date > cutoff {
            sum += point.pr;
            count += 1;
        }
    }
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

/// Trailing 7/30/60-day PR averages plus per-year counts of days where PR
/// beat the budget. A year appears iff it has at least one row; a year with
/// rows but no exceedances is reported as zero.
pub fn summarize(points: &[DerivedPoint]) -> SummaryStats {
    let latest = points.iter().map(|p| p.date).max();

    let (avg_7_day, avg_30_day, avg_60_day) = match latest {
        Some(latest) => (
            trailing_average(points, latest, 7),
            trailing_average(points, latest, 30),
            trailing_average(points, latest, 60),
        ),
        None => (f64::NAN, f64::NAN, f64::NAN),
    };

    let mut above_budget_by_year: BTreeMap<i32, usize> = BTreeMap::new();
    for point in points {
        let entry = above_budget_by_year.entry(point.date.year()).or_insert(0);
        if point.pr > point.budget {
            *entry += 1;
        }
    }

    SummaryStats {
        avg_7_day,
        avg_30_day,
        avg_60_day,
        above_budget_by_year,
    }
}
