use anyhow::{bail, Context, Result};
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Loads one measurement dataset from a directory tree shaped
/// `<root>/<period>/<file>.csv` and concatenates every file into a single
/// frame with the columns `[Date, <value_column>]`.
pub struct DataLoader {
    root: PathBuf,
    value_column: String,
}

impl DataLoader {
    pub fn new(root: impl Into<PathBuf>, value_column: &str) -> Self {
        Self {
            root: root.into(),
            value_column: value_column.to_string(),
        }
    }

    /// Read every CSV under the root, in path-lexicographic order, and
    /// return the union of their rows. Rows are never deduplicated here.
    /// Any unreadable file or missing column aborts the whole load.
    pub fn load(&self) -> Result<DataFrame> {
        if !self.root.is_dir() {
            bail!("data directory not found: {}", self.root.display());
        }

        let pattern = self.root.join("*").join("*.csv");
        let pattern = pattern
            .to_str()
            .with_context(|| format!("non-UTF8 path under {}", self.root.display()))?;

        let mut files: Vec<PathBuf> = glob(pattern)?.filter_map(Result::ok).collect();
        files.sort();

        info!(
            "discovered {} {} files under {}",
            files.len(),
            self.value_column,
            self.root.display()
        );

        if files.is_empty() {
            return Ok(DataFrame::new(vec![
                Series::new_empty("Date", &DataType::Utf8),
                Series::new_empty(&self.value_column, &DataType::Float64),
            ])?);
        }

        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len}")
                .unwrap(),
        );

        let mut frames = Vec::with_capacity(files.len());
        for file in &files {
            frames.push(self.read_file(file)?.lazy());
            pb.inc(1);
        }
        pb.finish_and_clear();

        let combined = concat(frames.as_slice(), UnionArgs::default())?.collect()?;
        Ok(combined)
    }

    fn read_file(&self, path: &Path) -> Result<DataFrame> {
        let file =
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        let df = CsvReader::new(file)
            .has_header(true)
            .finish()
            .with_context(|| format!("failed to parse {}", path.display()))?;

        let cols = df.get_column_names();
        if !cols.contains(&"Date") {
            bail!("{} is missing the Date column", path.display());
        }
        if !cols.iter().any(|c| *c == self.value_column) {
            bail!(
                "{} is missing the {} column",
                path.display(),
                self.value_column
            );
        }

        let mut out = df.select(["Date", self.value_column.as_str()])?;
        let raw = out.column(self.value_column.as_str())?;
        let values = raw.cast(&DataType::Float64)?;
        if values.null_count() > raw.null_count() {
            bail!(
                "{} contains non-numeric {} values",
                path.display(),
                self.value_column
            );
        }
        out.with_column(values)?;
        Ok(out)
    }
}
