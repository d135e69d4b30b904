//! Year Merger Module
//! Buckets rows from many CSV files by the year prefix of a quarter-code
//! column and writes one processed file per year.

use crate::data::loader::{DataLoader, LoaderError};
use crate::stats::{FrameSummary, MissingValueReport};
use polars::prelude::*;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MergeError {
    #[error(transparent)]
    Loader(#[from] LoaderError),
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Output file name for a year's processed data.
pub fn processed_file_name(year: i32) -> String {
    format!("merged_data_{year}_processed.csv")
}

/// A quarter code belongs to a year when its first four characters are the
/// year's digits.
fn matches_year(code: &str, year: &str) -> bool {
    code.starts_with(year)
}

/// One processed file written for a year.
#[derive(Debug, Clone, PartialEq)]
pub struct YearOutput {
    pub year: i32,
    pub rows: usize,
    pub path: PathBuf,
}

/// Result of a full merge run.
#[derive(Debug, Default, Clone)]
pub struct MergeSummary {
    pub outputs: Vec<YearOutput>,
    pub empty_years: Vec<i32>,
}

impl MergeSummary {
    /// Number of years that had data and were written.
    pub fn years_processed(&self) -> usize {
        self.outputs.len()
    }
}

/// Matching frames gathered per year, in the configured year order.
pub type YearBuckets = BTreeMap<i32, Vec<DataFrame>>;

/// Filters, concatenates and writes per-year data.
pub struct YearMerger {
    years: Vec<i32>,
    quarter_column: String,
}

impl YearMerger {
    pub fn new(years: &[i32], quarter_column: &str) -> Self {
        Self {
            years: years.to_vec(),
            quarter_column: quarter_column.to_string(),
        }
    }

    /// Split one frame into the rows matching each target year.
    ///
    /// Returns an empty list when the quarter column is absent. The quarter
    /// column is converted to text in the returned frames.
    pub fn extract_years(&self, df: &DataFrame) -> Result<Vec<(i32, DataFrame)>, MergeError> {
        let Ok(quarter) = df.column(&self.quarter_column) else {
            return Ok(Vec::new());
        };

        let quarter = quarter.cast(&DataType::String)?;
        let mut df = df.clone();
        df.with_column(quarter.clone())?;
        let codes = quarter.str()?;

        let mut matches = Vec::new();
        for &year in &self.years {
            let wanted = year.to_string();
            let mask: BooleanChunked = codes
                .into_iter()
                .map(|code| Some(code.is_some_and(|c| matches_year(c, &wanted))))
                .collect();

            let year_df = df.filter(&mask)?;
            if year_df.height() > 0 {
                matches.push((year, year_df));
            }
        }

        Ok(matches)
    }

    /// Read every file and bucket its matching rows by year.
    pub fn collect(&self, files: &[PathBuf]) -> Result<YearBuckets, MergeError> {
        let per_file: Vec<(PathBuf, Vec<(i32, DataFrame)>)> = files
            .par_iter()
            .map(|path| -> Result<_, MergeError> {
                let df = DataLoader::read_csv(path)?;
                if df.column(&self.quarter_column).is_err() {
                    tracing::debug!(file = %path.display(), "No {} column, skipping", self.quarter_column);
                }
                Ok((path.clone(), self.extract_years(&df)?))
            })
            .collect::<Result<_, MergeError>>()?;

        let mut buckets: YearBuckets = self.years.iter().map(|&y| (y, Vec::new())).collect();
        for (path, matches) in per_file {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            for (year, year_df) in matches {
                tracing::info!("File '{}': added {} rows for {}", name, year_df.height(), year);
                buckets.entry(year).or_default().push(year_df);
            }
        }

        Ok(buckets)
    }

    /// Concatenate frames, unioning their columns.
    ///
    /// Missing cells become null and differing dtypes are promoted to a
    /// common supertype.
    pub fn concat(frames: &[DataFrame]) -> Result<DataFrame, MergeError> {
        if frames.is_empty() {
            return Ok(DataFrame::empty());
        }

        let lazy: Vec<LazyFrame> = frames.iter().map(|df| df.clone().lazy()).collect();
        let merged = concat_lf_diagonal(
            lazy,
            UnionArgs {
                to_supertypes: true,
                ..Default::default()
            },
        )?
        .collect()?;
        Ok(merged)
    }

    /// Write a processed frame as `merged_data_{year}_processed.csv`.
    ///
    /// The file starts with a UTF-8 BOM so spreadsheet tools detect the
    /// encoding.
    pub fn write_processed(
        df: &mut DataFrame,
        dir: &Path,
        year: i32,
    ) -> Result<PathBuf, MergeError> {
        std::fs::create_dir_all(dir).map_err(|source| MergeError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = dir.join(processed_file_name(year));
        let mut file = File::create(&path).map_err(|source| MergeError::Io {
            path: path.clone(),
            source,
        })?;

        // Filtered frames can carry ragged chunks the CSV serializer rejects.
        df.rechunk_mut();
        CsvWriter::new(&mut file)
            .include_bom(true)
            .include_header(true)
            .finish(df)?;

        Ok(path)
    }

    /// Run the whole merge: discover, bucket, report and write.
    pub fn run(&self, input_dir: &Path, output_dir: &Path) -> Result<MergeSummary, MergeError> {
        let files = DataLoader::list_csv_files(input_dir)?;
        tracing::info!("Found {} CSV files in {}", files.len(), input_dir.display());

        let mut buckets = self.collect(&files)?;
        let mut summary = MergeSummary::default();

        for &year in &self.years {
            let frames = buckets.remove(&year).unwrap_or_default();
            if frames.is_empty() {
                println!("\nNo data to process for {year}.");
                summary.empty_years.push(year);
                continue;
            }

            let mut merged = Self::concat(&frames)?;

            println!("\n{year} merged frame:");
            println!("{}", FrameSummary::of(&merged));
            println!("\n{year} missing values:");
            println!("{}", MissingValueReport::of(&merged));

            let path = Self::write_processed(&mut merged, output_dir, year)?;
            println!("\n{year} processed data saved: {}", path.display());
            tracing::info!(year, rows = merged.height(), path = %path.display(), "Wrote processed file");

            summary.outputs.push(YearOutput {
                year,
                rows: merged.height(),
                path,
            });
        }

        println!("\nTotal years processed: {}", summary.years_processed());
        Ok(summary)
    }
}
