//! Analysis Data Processor
//! Builds the year-tagged analysis table from the per-year processed files:
//! locates the card-amount column, keeps the columns of interest and renames
//! them to readable labels.

use crate::config::AnalysisConfig;
use crate::data::loader::{DataLoader, LoaderError};
use crate::data::merger::{processed_file_name, MergeError, YearMerger};
use polars::prelude::*;
use std::path::Path;
use thiserror::Error;

/// Name of the column holding each row's source year.
pub const YEAR_COLUMN: &str = "YEAR";

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Card amount column not found (no column contains {markers})")]
    CardColumnNotFound { markers: String },
    #[error("Column not found: {0}")]
    ColumnNotFound(String),
    #[error("No processed files found in {0}")]
    NoData(String),
    #[error(transparent)]
    Loader(#[from] LoaderError),
    #[error(transparent)]
    Merge(#[from] MergeError),
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// Mean of every label for one year.
#[derive(Debug, Clone, PartialEq)]
pub struct YearlyMeans {
    pub years: Vec<i32>,
    pub labels: Vec<String>,
    /// `means[label_idx][year_idx]`, NaN when a year has no values.
    pub means: Vec<Vec<f64>>,
}

impl YearlyMeans {
    pub fn get(&self, label_idx: usize, year_idx: usize) -> f64 {
        self.means
            .get(label_idx)
            .and_then(|row| row.get(year_idx))
            .copied()
            .unwrap_or(f64::NAN)
    }
}

/// Year-tagged table of the analysed columns.
///
/// Columns: `YEAR` (Int32) followed by one Float64 column per label.
#[derive(Debug, Clone)]
pub struct AnalysisTable {
    df: DataFrame,
    labels: Vec<String>,
    card_column: String,
}

impl AnalysisTable {
    /// Load `merged_data_{year}_processed.csv` for each year from `dir`.
    ///
    /// Years whose file is missing are skipped with a warning.
    pub fn load(dir: &Path, years: &[i32], settings: &AnalysisConfig) -> Result<Self, AnalysisError> {
        let mut frames = Vec::new();
        for &year in years {
            let path = dir.join(processed_file_name(year));
            if !path.is_file() {
                tracing::warn!(path = %path.display(), "Processed file missing, skipping {}", year);
                continue;
            }

            let df = DataLoader::read_csv(&path)?
                .lazy()
                .with_column(lit(year).alias(YEAR_COLUMN))
                .collect()?;
            tracing::info!(year, rows = df.height(), "Loaded processed file");
            frames.push(df);
        }

        if frames.is_empty() {
            return Err(AnalysisError::NoData(dir.display().to_string()));
        }

        let merged = YearMerger::concat(&frames)?;
        Self::from_merged(&merged, settings)
    }

    /// Select, cast and rename the analysed columns of a merged frame that
    /// already carries a `YEAR` column.
    pub fn from_merged(df: &DataFrame, settings: &AnalysisConfig) -> Result<Self, AnalysisError> {
        let columns = DataLoader::column_names(df);
        let card_column = Self::find_card_column(&columns, &settings.card_markers)
            .ok_or_else(|| AnalysisError::CardColumnNotFound {
                markers: settings.card_markers.join(" + "),
            })?;
        tracing::debug!(column = %card_column, "Using card amount column");

        let l = &settings.labels;
        let sources = [
            (settings.income_column.as_str(), l.income.as_str()),
            (card_column.as_str(), l.card.as_str()),
            (settings.telesales_column.as_str(), l.telesales.as_str()),
            (settings.cs_advance_column.as_str(), l.cs_advance.as_str()),
        ];

        for name in std::iter::once(YEAR_COLUMN).chain(sources.iter().map(|(src, _)| *src)) {
            if !columns.iter().any(|c| c == name) {
                return Err(AnalysisError::ColumnNotFound(name.to_string()));
            }
        }

        let mut exprs = vec![col(YEAR_COLUMN).cast(DataType::Int32)];
        exprs.extend(
            sources
                .iter()
                .map(|(src, label)| col(*src).cast(DataType::Float64).alias(*label)),
        );
        let df = df.clone().lazy().select(exprs).collect()?;

        Ok(Self {
            df,
            labels: sources.iter().map(|(_, label)| label.to_string()).collect(),
            card_column,
        })
    }

    /// First column whose name contains every marker.
    pub fn find_card_column(columns: &[String], markers: &[String]) -> Option<String> {
        columns
            .iter()
            .find(|c| markers.iter().all(|m| c.contains(m.as_str())))
            .cloned()
    }

    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Source column chosen as the card amount.
    pub fn card_column(&self) -> &str {
        &self.card_column
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    /// Per-row year.
    pub fn year_values(&self) -> Vec<Option<i32>> {
        self.df
            .column(YEAR_COLUMN)
            .ok()
            .and_then(|c| c.i32().ok().map(|ca| ca.into_iter().collect()))
            .unwrap_or_default()
    }

    /// Distinct years present, ascending.
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.year_values().into_iter().flatten().collect();
        years.sort_unstable();
        years.dedup();
        years
    }

    /// Per-row values of a label, `None` where missing.
    pub fn values(&self, label: &str) -> Vec<Option<f64>> {
        self.df
            .column(label)
            .ok()
            .and_then(|c| c.f64().ok().map(|ca| ca.into_iter().collect()))
            .unwrap_or_default()
    }

    /// Present values of a label for one year.
    pub fn values_for_year(&self, label: &str, year: i32) -> Vec<f64> {
        self.year_values()
            .into_iter()
            .zip(self.values(label))
            .filter_map(|(y, v)| match (y, v) {
                (Some(y), Some(v)) if y == year && !v.is_nan() => Some(v),
                _ => None,
            })
            .collect()
    }

    /// Mean of each label per year, missing values skipped.
    pub fn yearly_means(&self) -> Result<YearlyMeans, AnalysisError> {
        let aggs: Vec<Expr> = self.labels.iter().map(|l| col(l.as_str()).mean()).collect();
        let grouped = self
            .df
            .clone()
            .lazy()
            .group_by([col(YEAR_COLUMN)])
            .agg(aggs)
            .sort([YEAR_COLUMN], SortMultipleOptions::default())
            .collect()?;

        let years: Vec<i32> = grouped
            .column(YEAR_COLUMN)?
            .i32()?
            .into_iter()
            .flatten()
            .collect();

        let mut means = Vec::with_capacity(self.labels.len());
        for label in &self.labels {
            let column = grouped.column(label)?.cast(&DataType::Float64)?;
            means.push(
                column
                    .f64()?
                    .into_iter()
                    .map(|v| v.unwrap_or(f64::NAN))
                    .collect(),
            );
        }

        Ok(YearlyMeans {
            years,
            labels: self.labels.clone(),
            means,
        })
    }

    /// Keep only the rows where `keep` is true.
    pub fn retain(&self, keep: &[bool]) -> Result<Self, AnalysisError> {
        let mask: BooleanChunked = keep.iter().map(|&k| Some(k)).collect();
        Ok(Self {
            df: self.df.filter(&mask)?,
            labels: self.labels.clone(),
            card_column: self.card_column.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> AnalysisConfig {
        AnalysisConfig::default()
    }

    fn merged() -> DataFrame {
        df!(
            "YEAR" => [2018i32, 2018, 2020, 2020],
            "MM_INCM" => [Some(1000i64), Some(3000), Some(2000), None],
            "X_CARD_GRAMT_AVG" => [10.0, 30.0, 20.0, 40.0],
            "CR_NTSL_USE_GRAMT_AVG" => [1.0, 1.0, 2.0, 2.0],
            "CSADVC_USE_GRAMT_AVG" => [0.5, 1.5, 2.5, 3.5],
            "OTHER" => ["a", "b", "c", "d"],
        )
        .unwrap()
    }

    #[test]
    fn test_find_card_column_first_match() {
        let columns: Vec<String> = ["MM_INCM", "CARD_CNT", "A_CARD_GRAMT", "B_CARD_GRAMT"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let markers = settings().card_markers;
        assert_eq!(
            AnalysisTable::find_card_column(&columns, &markers).as_deref(),
            Some("A_CARD_GRAMT")
        );
        assert!(AnalysisTable::find_card_column(&columns[..2], &markers).is_none());
    }

    #[test]
    fn test_from_merged_renames_and_casts() {
        let table = AnalysisTable::from_merged(&merged(), &settings()).unwrap();

        assert_eq!(table.card_column(), "X_CARD_GRAMT_AVG");
        assert_eq!(
            DataLoader::column_names(table.dataframe()),
            vec![
                "YEAR",
                "Monthly Income",
                "Avg Card Spend",
                "Avg Telesales Spend",
                "Avg CS Advance Spend"
            ]
        );
        assert_eq!(table.values("Monthly Income")[3], None);
        assert_eq!(table.values("Monthly Income")[0], Some(1000.0));
        assert_eq!(table.years(), vec![2018, 2020]);
    }

    #[test]
    fn test_missing_card_column() {
        let df = merged().drop("X_CARD_GRAMT_AVG").unwrap();
        let err = AnalysisTable::from_merged(&df, &settings()).unwrap_err();
        assert!(matches!(err, AnalysisError::CardColumnNotFound { .. }));
    }

    #[test]
    fn test_missing_other_column() {
        let df = merged().drop("CSADVC_USE_GRAMT_AVG").unwrap();
        let err = AnalysisTable::from_merged(&df, &settings()).unwrap_err();
        assert!(matches!(err, AnalysisError::ColumnNotFound(c) if c == "CSADVC_USE_GRAMT_AVG"));
    }

    #[test]
    fn test_yearly_means_skip_missing() {
        let table = AnalysisTable::from_merged(&merged(), &settings()).unwrap();
        let means = table.yearly_means().unwrap();

        assert_eq!(means.years, vec![2018, 2020]);
        assert_eq!(means.get(0, 0), 2000.0);
        assert_eq!(means.get(0, 1), 2000.0);
        assert_eq!(means.get(1, 1), 30.0);
        assert_eq!(means.get(3, 0), 1.0);
    }

    #[test]
    fn test_values_for_year() {
        let table = AnalysisTable::from_merged(&merged(), &settings()).unwrap();
        assert_eq!(table.values_for_year("Avg Card Spend", 2020), vec![20.0, 40.0]);
        assert_eq!(table.values_for_year("Monthly Income", 2020), vec![2000.0]);
        assert!(table.values_for_year("Monthly Income", 2023).is_empty());
    }

    #[test]
    fn test_retain() {
        let table = AnalysisTable::from_merged(&merged(), &settings()).unwrap();
        let kept = table.retain(&[true, false, false, true]).unwrap();
        assert_eq!(kept.height(), 2);
        assert_eq!(kept.years(), vec![2018, 2020]);
    }

    #[test]
    fn test_load_skips_missing_years() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("merged_data_2018_processed.csv"),
            "\u{feff}CRTR_QURTR,MM_INCM,X_CARD_GRAMT,CR_NTSL_USE_GRAMT_AVG,CSADVC_USE_GRAMT_AVG\n\
             20181,1000,10,1,1\n20182,2000,20,2,2\n",
        )
        .unwrap();

        let table = AnalysisTable::load(dir.path(), &[2018, 2020], &settings()).unwrap();
        assert_eq!(table.height(), 2);
        assert_eq!(table.years(), vec![2018]);
    }

    #[test]
    fn test_load_without_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = AnalysisTable::load(dir.path(), &[2018], &settings()).unwrap_err();
        assert!(matches!(err, AnalysisError::NoData(_)));
    }
}
