use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One merged daily measurement: the plant's performance ratio and the
/// irradiance recorded for the same calendar date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyObservation {
    pub date: NaiveDate,
    /// Global horizontal irradiance, kWh/m²/day.
    pub ghi: f64,
    /// Performance ratio, percent.
    pub pr: f64,
}

/// A daily observation extended with the derived analysis columns.
#[derive(Debug, Clone, Copy)]
pub struct DerivedPoint {
    pub date: NaiveDate,
    pub ghi: f64,
    pub pr: f64,
    /// Centered 30-row rolling mean of PR. None where the window would run
    /// off either end of the series.
    pub pr_30ma: Option<f64>,
    pub days_from_start: i64,
    pub years_from_start: f64,
    /// Degradation-adjusted performance budget for this date.
    pub budget: f64,
}

/// Irradiance intensity bands. Boundary values resolve downward through
/// successive less-than tests, so exactly 2.0 is Moderate and 6.0 is Intense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GhiBand {
    Low,
    Moderate,
    High,
    Intense,
}

impl GhiBand {
    pub const ALL: [GhiBand; 4] = [
        GhiBand::Low,
        GhiBand::Moderate,
        GhiBand::High,
        GhiBand::Intense,
    ];

    pub fn classify(ghi: f64) -> Self {
        if ghi < 2.0 {
            GhiBand::Low
        } else if ghi < 4.0 {
            GhiBand::Moderate
        } else if ghi < 6.0 {
            GhiBand::High
        } else {
            GhiBand::Intense
        }
    }

    pub fn range_label(&self) -> &'static str {
        match self {
            GhiBand::Low => "<2",
            GhiBand::Moderate => "2-4",
            GhiBand::High => "4-6",
            GhiBand::Intense => ">6",
        }
    }
}

/// Expected performance decay: a plant guaranteed to start at
/// `start_budget` percent and lose `annual_degradation` of that per year.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DegradationModel {
    pub start_budget: f64,
    pub annual_degradation: f64,
}

impl Default for DegradationModel {
    fn default() -> Self {
        Self {
            start_budget: 73.9,
            annual_degradation: 0.008,
        }
    }
}

impl DegradationModel {
    pub fn budget_at(&self, years: f64) -> f64 {
        self.start_budget * (1.0 - self.annual_degradation).powf(years)
    }
}

/// Trailing-window PR averages and per-year budget exceedance counts.
/// Averages over an empty window are NaN, never zero. Years with no rows
/// are absent from the map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryStats {
    pub avg_7_day: f64,
    pub avg_30_day: f64,
    pub avg_60_day: f64,
    pub above_budget_by_year: BTreeMap<i32, usize>,
}
