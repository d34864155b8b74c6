use anyhow::{bail, Result};
use chrono::NaiveDate;
use log::warn;
use polars::prelude::*;
use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

use crate::models::DailyObservation;

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

fn parse_date(raw: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// Replace the utf8 `Date` column with a date-typed series. Any value that
/// parses under neither supported format is fatal. Duplicate dates within
/// the dataset are kept as-is; the inner join will expand them, so they are
/// flagged here rather than silently dropped.
pub fn normalize_dates(mut df: DataFrame, label: &str) -> Result<DataFrame> {
    let raw = df.column("Date")?.cast(&DataType::Utf8)?;
    let raw = raw.utf8()?;

    let mut dates: Vec<NaiveDate> = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        match raw.get(i) {
            Some(value) => match parse_date(value.trim()) {
                Some(date) => dates.push(date),
                None => bail!("unparseable {} date: {:?}", label, value),
            },
            None => bail!("missing {} date at row {}", label, i),
        }
    }

    let mut seen = HashSet::with_capacity(dates.len());
    let duplicates = dates.iter().filter(|d| !seen.insert(**d)).count();
    if duplicates > 0 {
        warn!(
            "{} dataset contains {} duplicate dates; keeping all rows, the join will expand them",
            label, duplicates
        );
    }

    df.with_column(Series::new("Date", dates))?;
    Ok(df)
}

/// Inner join of the two measurement frames on exact date equality,
/// projected to the canonical `[Date, GHI, PR]` schema and sorted ascending
/// by date. Ties from duplicate dates keep their join order, so identical
/// inputs always produce identical output. Either side empty yields an
/// empty result, not an error.
pub fn merge(pr: DataFrame, ghi: DataFrame) -> Result<DataFrame> {
    let merged = pr
        .lazy()
        .join(
            ghi.lazy(),
            [col("Date")],
            [col("Date")],
            JoinArgs::new(JoinType::Inner),
        )
        .select([col("Date"), col("GHI"), col("PR")])
        .sort(
            "Date",
            SortOptions {
                descending: false,
                nulls_last: false,
                multithreaded: true,
                maintain_order: true,
            },
        )
        .collect()?;
    Ok(merged)
}

pub fn save_merged_csv(df: &DataFrame, path: &Path) -> Result<()> {
    let mut out = df.clone();
    CsvWriter::new(File::create(path)?).finish(&mut out)?;
    Ok(())
}

/// Extract the merged frame into typed rows for the analysis stages.
pub fn to_observations(df: &DataFrame) -> Result<Vec<DailyObservation>> {
    let dates = df.column("Date")?.date()?;
    let ghi = df.column("GHI")?.f64()?;
    let pr = df.column("PR")?.f64()?;

    let mut rows = Vec::with_capacity(df.height());
    for (i, date) in dates.as_date_iter().enumerate() {
        if let (Some(date), Some(ghi), Some(pr)) = (date, ghi.get(i), pr.get(i)) {
            rows.push(DailyObservation { date, ghi, pr });
        }
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pr_frame(rows: &[(&str, f64)]) -> DataFrame {
        let dates: Vec<&str> = rows.iter().map(|(d, _)| *d).collect();
        let values: Vec<f64> = rows.iter().map(|(_, v)| *v).collect();
        DataFrame::new(vec![Series::new("Date", dates), Series::new("PR", values)]).unwrap()
    }

    fn ghi_frame(rows: &[(&str, f64)]) -> DataFrame {
        let dates: Vec<&str> = rows.iter().map(|(d, _)| *d).collect();
        let values: Vec<f64> = rows.iter().map(|(_, v)| *v).collect();
        DataFrame::new(vec![Series::new("Date", dates), Series::new("GHI", values)]).unwrap()
    }

    fn merge_normalized(pr: DataFrame, ghi: DataFrame) -> DataFrame {
        let pr = normalize_dates(pr, "PR").unwrap();
        let ghi = normalize_dates(ghi, "GHI").unwrap();
        merge(pr, ghi).unwrap()
    }

    #[test]
    fn test_inner_join_keeps_shared_dates_only() {
        let merged = merge_normalized(
            pr_frame(&[("2020-01-01", 70.0), ("2020-01-02", 71.0), ("2020-01-03", 72.0)]),
            ghi_frame(&[("2020-01-02", 4.1), ("2020-01-03", 5.2), ("2020-01-04", 3.3)]),
        );

        assert_eq!(merged.height(), 2);
        assert_eq!(merged.get_column_names(), &["Date", "GHI", "PR"]);

        let rows = to_observations(&merged).unwrap();
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2020, 1, 2).unwrap());
        assert_eq!(rows[0].ghi, 4.1);
        assert_eq!(rows[0].pr, 71.0);
    }

    #[test]
    fn test_disjoint_dates_merge_to_empty() {
        let merged = merge_normalized(
            pr_frame(&[("2020-01-01", 70.0)]),
            ghi_frame(&[("2021-01-01", 4.0)]),
        );
        assert_eq!(merged.height(), 0);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let pr = pr_frame(&[("2020-01-01", 70.0), ("2020-01-02", 71.0)]);
        let ghi = ghi_frame(&[("2020-01-01", 4.0), ("2020-01-02", 5.0)]);

        let first = merge_normalized(pr.clone(), ghi.clone());
        let second = merge_normalized(pr, ghi);
        assert!(first.frame_equal(&second));
    }

    #[test]
    fn test_duplicate_dates_expand() {
        // A date appearing twice on one side joins against every match on
        // the other side. Observed upstream behavior, preserved.
        let merged = merge_normalized(
            pr_frame(&[("2020-01-01", 70.0), ("2020-01-01", 70.5)]),
            ghi_frame(&[("2020-01-01", 4.0)]),
        );
        assert_eq!(merged.height(), 2);
    }

    #[test]
    fn test_fallback_date_format() {
        let merged = merge_normalized(
            pr_frame(&[("01/02/2020", 70.0)]),
            ghi_frame(&[("2020-01-02", 4.1)]),
        );
        assert_eq!(merged.height(), 1);
    }

    #[test]
    fn test_unparseable_date_is_fatal() {
        let err = normalize_dates(pr_frame(&[("not-a-date", 70.0)]), "PR").unwrap_err();
        assert!(err.to_string().contains("not-a-date"));
    }

    #[test]
    fn test_snapshot_round_trips_header() {
        let merged = merge_normalized(
            pr_frame(&[("2020-01-01", 75.0)]),
            ghi_frame(&[("2020-01-01", 5.0)]),
        );

        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("processed_solar_data.csv");
        save_merged_csv(&merged, &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(lines.next(), Some("Date,GHI,PR"));
        assert_eq!(lines.next(), Some("2020-01-01,5.0,75.0"));
    }
}
