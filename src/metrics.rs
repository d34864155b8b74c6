use chrono::NaiveDate;

use crate::models::{DailyObservation, DegradationModel, DerivedPoint};

pub const ROLLING_WINDOW: usize = 30;
const DAYS_PER_YEAR: f64 = 365.25;

/// Keep only observations inside the inclusive `[start, end]` date range.
/// Applied before any derivation, so the series start and the rolling
/// window see only the filtered subset.
pub fn filter_date_range(
    mut observations: Vec<DailyObservation>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Vec<DailyObservation> {
    if let Some(start) = start {
        observations.retain(|o| o.date >= start);
    }
    if let Some(end) = end {
        observations.retain(|o| o.date <= end);
    }
    observations
}

/// Centered rolling mean by row position. Row `i` averages the window
/// `[i - window/2, i + window - 1 - window/2]`; rows whose window would run
/// off either edge are None. Calendar gaps are not filled, the window
/// counts rows.
pub fn centered_rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let mut out = vec![None; n];
    if window == 0 || n < window {
        return out;
    }

    let lookback = window / 2;
    let lookahead = window - 1 - lookback;

    let mut sum: f64 = values[..window].iter().sum();
    out[lookback] = Some(sum / window as f64);
    for i in (lookback + 1)..(n - lookahead) {
        let start = i - lookback;
        sum += values[start + window - 1] - values[start - 1];
        out[i] = Some(sum / window as f64);
    }
    out
}

/// Sort the series ascending by date and derive the analysis columns:
/// rolling PR mean, elapsed days/years from the series start, and the
/// degradation budget for each date.
pub fn derive_series(
    mut observations: Vec<DailyObservation>,
    model: &DegradationModel,
) -> Vec<DerivedPoint> {
    observations.sort_by_key(|o| o.date);

    let Some(first) = observations.first() else {
        return Vec::new();
    };
    let d0 = first.date;

    let pr_values: Vec<f64> = observations.iter().map(|o| o.pr).collect();
    let rolling = centered_rolling_mean(&pr_values, ROLLING_WINDOW);

    observations
        .iter()
        .zip(rolling)
        .map(|(o, pr_30ma)| {
            let days_from_start = (o.date - d0).num_days();
            let years_from_start = days_from_start as f64 / DAYS_PER_YEAR;
            DerivedPoint {
                date: o.date,
                ghi: o.ghi,
                pr: o.pr,
                pr_30ma,
                days_from_start,
                years_from_start,
                budget: model.budget_at(years_from_start),
            }
        })
        .collect()
}
