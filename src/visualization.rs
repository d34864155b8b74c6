use anyhow::Result;
use chrono::{Duration, NaiveDate};
use log::warn;
use plotters::prelude::*;
use std::path::{Path, PathBuf};

use crate::models::{DerivedPoint, GhiBand, SummaryStats};

// Print-quality raster output.
const CHART_WIDTH: u32 = 1800;
const CHART_HEIGHT: u32 = 1200;

const NAVY: RGBColor = RGBColor(0, 0, 128);
const LIGHT_BLUE: RGBColor = RGBColor(173, 216, 230);
const ORANGE: RGBColor = RGBColor(255, 165, 0);
const BROWN: RGBColor = RGBColor(165, 42, 42);

pub struct PerformanceVisualizer {
    output_path: PathBuf,
}

impl PerformanceVisualizer {
    pub fn new(output_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(output_dir)?;
        Ok(Self {
            output_path: output_dir.join("solar_performance_analysis.png"),
        })
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    fn band_color(band: GhiBand) -> RGBColor {
        match band {
            GhiBand::Low => NAVY,
            GhiBand::Moderate => LIGHT_BLUE,
            GhiBand::High => ORANGE,
            GhiBand::Intense => BROWN,
        }
    }

    /// Render the performance chart: one scatter series per populated GHI
    /// band, the rolling-average line, the dashed budget line, and the
    /// summary statistics box. Expects the series sorted ascending by date.
    pub fn render(&self, points: &[DerivedPoint], stats: &SummaryStats) -> Result<()> {
        if points.is_empty() {
            warn!("no merged rows to plot, skipping chart");
            return Ok(());
        }

        let min_date = points[0].date;
        let mut max_date = points[points.len() - 1].date;
        if max_date == min_date {
            max_date += Duration::days(1);
        }

        let y_low = points
            .iter()
            .flat_map(|p| [p.pr, p.budget])
            .fold(f64::INFINITY, f64::min);
        let y_high = points
            .iter()
            .flat_map(|p| [p.pr, p.budget])
            .fold(f64::NEG_INFINITY, f64::max);

        let root =
            BitMapBackend::new(&self.output_path, (CHART_WIDTH, CHART_HEIGHT)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(
                "Solar PV Plant Performance Analysis",
                ("sans-serif", 40).into_font(),
            )
            .margin(15)
            .x_label_area_size(60)
            .y_label_area_size(80)
            .build_cartesian_2d(min_date..max_date, (y_low - 5.0)..(y_high + 5.0))?;

        chart
            .configure_mesh()
            .x_desc("Date")
            .y_desc("Performance Ratio (%)")
            .draw()?;

        for band in GhiBand::ALL {
            let series: Vec<(NaiveDate, f64)> = points
                .iter()
                .filter(|p| GhiBand::classify(p.ghi) == band)
                .map(|p| (p.date, p.pr))
                .collect();
            if series.is_empty() {
                continue;
            }

            let color = Self::band_color(band);
            chart
                .draw_series(
                    series
                        .iter()
                        .map(|(date, pr)| Circle::new((*date, *pr), 3, color.mix(0.6).filled())),
                )?
                .label(format!("GHI: {}", band.range_label()))
                .legend(move |(x, y)| Circle::new((x + 5, y), 3, color.filled()));
        }

        let moving_avg: Vec<(NaiveDate, f64)> = points
            .iter()
            .filter_map(|p| p.pr_30ma.map(|avg| (p.date, avg)))
            .collect();
        if !moving_avg.is_empty() {
            chart
                .draw_series(LineSeries::new(moving_avg, RED.stroke_width(2)))?
                .label("30-day Moving Average")
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 12, y)], RED.stroke_width(2)));
        }

        chart
            .draw_series(DashedLineSeries::new(
                points.iter().map(|p| (p.date, p.budget)),
                8,
                5,
                GREEN.stroke_width(2),
            ))?
            .label("Budget Line")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 12, y)], GREEN.stroke_width(2)));

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;

        let text_style = ("sans-serif", 24).into_font().color(&BLACK);
        for (i, line) in stats_lines(stats).iter().enumerate() {
            root.draw(&Text::new(
                line.clone(),
                (50, 100 + 28 * i as i32),
                text_style.clone(),
            ))?;
        }

        root.present()?;
        Ok(())
    }
}

fn stats_lines(stats: &SummaryStats) -> Vec<String> {
    let mut lines = vec![
        "Statistics:".to_string(),
        format!("7-day avg: {:.1}%", stats.avg_7_day),
        format!("30-day avg: {:.1}%", stats.avg_30_day),
        format!("60-day avg: {:.1}%", stats.avg_60_day),
        String::new(),
        "Points above budget:".to_string(),
    ];
    for (year, count) in &stats.above_budget_by_year {
        lines.push(format!("{}: {}", year, count));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::derive_series;
    use crate::models::{DailyObservation, DegradationModel};
    use chrono::Duration;
    use std::collections::BTreeMap;

    fn sample_points(len: i64) -> Vec<DerivedPoint> {
        let base = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let observations = (0..len)
            .map(|i| DailyObservation {
                date: base + Duration::days(i),
                ghi: 1.0 + (i % 7) as f64,
                pr: 70.0 + (i % 5) as f64,
            })
            .collect();
        derive_series(observations, &DegradationModel::default())
    }

    #[test]
    fn test_render_writes_chart_file() {
        let tmp = tempfile::tempdir().unwrap();
        let visualizer = PerformanceVisualizer::new(tmp.path()).unwrap();

        let points = sample_points(90);
        let stats = crate::stats::summarize(&points);
        visualizer.render(&points, &stats).unwrap();

        let metadata = std::fs::metadata(visualizer.output_path()).unwrap();
        assert!(metadata.len() > 0);
    }

    #[test]
    fn test_render_single_point_does_not_panic() {
        let tmp = tempfile::tempdir().unwrap();
        let visualizer = PerformanceVisualizer::new(tmp.path()).unwrap();

        let points = sample_points(1);
        let stats = crate::stats::summarize(&points);
        visualizer.render(&points, &stats).unwrap();
    }

    #[test]
    fn test_render_empty_series_is_a_no_op() {
        let tmp = tempfile::tempdir().unwrap();
        let visualizer = PerformanceVisualizer::new(tmp.path()).unwrap();

        let stats = SummaryStats {
            avg_7_day: f64::NAN,
            avg_30_day: f64::NAN,
            avg_60_day: f64::NAN,
            above_budget_by_year: BTreeMap::new(),
        };
        visualizer.render(&[], &stats).unwrap();
        assert!(!visualizer.output_path().exists());
    }

    #[test]
    fn test_stats_lines_sorted_by_year() {
        let mut above = BTreeMap::new();
        above.insert(2021, 12);
        above.insert(2019, 150);
        above.insert(2020, 88);

        let stats = SummaryStats {
            avg_7_day: 73.25,
            avg_30_day: 72.0,
            avg_60_day: f64::NAN,
            above_budget_by_year: above,
        };

        let lines = stats_lines(&stats);
        assert_eq!(lines[1], "7-day avg: 73.2%");
        assert_eq!(lines[3], "60-day avg: NaN%");
        assert_eq!(lines[6..], ["2019: 150", "2020: 88", "2021: 12"]);
    }
}
