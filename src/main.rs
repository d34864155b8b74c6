use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use log::info;
use std::path::PathBuf;

use solar_analyzer::{
    merger, metrics, stats, DataLoader, DegradationModel, PerformanceVisualizer, SummaryStats,
};

#[derive(Parser)]
#[command(name = "solar_analyzer")]
#[command(about = "Merge daily PR/GHI measurements and chart plant performance against a degradation budget")]
struct Args {
    /// Directory tree containing PR CSV files (one subdirectory level deep)
    #[arg(long)]
    pr_path: PathBuf,

    /// Directory tree containing GHI CSV files (one subdirectory level deep)
    #[arg(long)]
    ghi_path: PathBuf,

    /// Directory for the merged CSV and the chart image
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Restrict statistics and chart to dates >= this (YYYY-MM-DD).
    /// The merged CSV always covers the full join.
    #[arg(long)]
    start_date: Option<String>,

    /// Restrict statistics and chart to dates <= this (YYYY-MM-DD)
    #[arg(long)]
    end_date: Option<String>,

    /// Console statistics format
    #[arg(long, value_enum, default_value = "summary")]
    stats: StatsFormat,
}

#[derive(Clone, ValueEnum)]
enum StatsFormat {
    Summary,
    Json,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let start_date = args
        .start_date
        .as_deref()
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()?;
    let end_date = args
        .end_date
        .as_deref()
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()?;

    println!("🌞 Solar PV Performance Analyzer");
    println!("{}", "=".repeat(60));

    println!("\n=== DATA PROCESSING ===");
    println!("1. Reading all PR files...");
    let pr = DataLoader::new(&args.pr_path, "PR").load()?;
    println!("   Total PR records: {}", pr.height());

    println!("2. Reading all GHI files...");
    let ghi = DataLoader::new(&args.ghi_path, "GHI").load()?;
    println!("   Total GHI records: {}", ghi.height());

    println!("3. Merging PR and GHI data...");
    let pr = merger::normalize_dates(pr, "PR")?;
    let ghi = merger::normalize_dates(ghi, "GHI")?;
    let merged = merger::merge(pr, ghi)?;
    println!("   Merged records: {}", merged.height());

    std::fs::create_dir_all(&args.output_dir)?;
    let csv_path = args.output_dir.join("processed_solar_data.csv");
    merger::save_merged_csv(&merged, &csv_path)?;
    println!("\n💾 Merged data saved to {}", csv_path.display());

    println!("\n=== ANALYSIS ===");
    let observations = merger::to_observations(&merged)?;
    let observations = metrics::filter_date_range(observations, start_date, end_date);
    info!("{} observations after date filtering", observations.len());

    let model = DegradationModel::default();
    let points = metrics::derive_series(observations, &model);
    let summary = stats::summarize(&points);

    match args.stats {
        StatsFormat::Summary => print_summary(&summary),
        StatsFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
    }

    let visualizer = PerformanceVisualizer::new(&args.output_dir)?;
    visualizer.render(&points, &summary)?;

    println!("\n📈 Chart saved to {}", visualizer.output_path().display());
    println!("✅ Processed {} rows", points.len());
    Ok(())
}

fn print_summary(summary: &SummaryStats) {
    println!("\nStatistics:");
    println!("  7-day avg:  {:.1}%", summary.avg_7_day);
    println!("  30-day avg: {:.1}%", summary.avg_30_day);
    println!("  60-day avg: {:.1}%", summary.avg_60_day);
    println!("\nPoints above budget:");
    for (year, count) in &summary.above_budget_by_year {
        println!("  {}: {}", year, count);
    }
}
