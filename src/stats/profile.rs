//! Frame Profile Module
//! Column summaries and missing-value reports printed after each merge.

use polars::prelude::*;
use std::fmt;

/// One column of a [`FrameSummary`].
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub name: String,
    pub non_null: usize,
    pub dtype: String,
}

/// Shape, non-null counts and dtypes of a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSummary {
    pub rows: usize,
    pub columns: Vec<ColumnSummary>,
}

impl FrameSummary {
    pub fn of(df: &DataFrame) -> Self {
        let columns = df
            .get_columns()
            .iter()
            .map(|col| ColumnSummary {
                name: col.name().to_string(),
                non_null: col.len() - col.null_count(),
                dtype: col.dtype().to_string(),
            })
            .collect();

        Self {
            rows: df.height(),
            columns,
        }
    }
}

impl fmt::Display for FrameSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Rows: {}, Columns: {}", self.rows, self.columns.len())?;
        let name_w = self
            .columns
            .iter()
            .map(|c| c.name.chars().count())
            .max()
            .unwrap_or(0)
            .max("Column".len());

        writeln!(f, " {:>3}  {:<name_w$}  {:>14}  Dtype", "#", "Column", "Non-Null Count")?;
        for (i, c) in self.columns.iter().enumerate() {
            writeln!(
                f,
                " {:>3}  {:<name_w$}  {:>5} non-null  {}",
                i, c.name, c.non_null, c.dtype
            )?;
        }
        Ok(())
    }
}

/// Missing count and share for one column.
#[derive(Debug, Clone, PartialEq)]
pub struct MissingColumn {
    pub name: String,
    pub missing: usize,
    pub percentage: f64,
}

/// Missing values per column.
#[derive(Debug, Clone, PartialEq)]
pub struct MissingValueReport {
    pub rows: usize,
    pub columns: Vec<MissingColumn>,
}

impl MissingValueReport {
    pub fn of(df: &DataFrame) -> Self {
        let rows = df.height();
        let columns = df
            .get_columns()
            .iter()
            .map(|col| {
                let missing = col.null_count();
                let percentage = if rows == 0 {
                    0.0
                } else {
                    100.0 * missing as f64 / rows as f64
                };
                MissingColumn {
                    name: col.name().to_string(),
                    missing,
                    percentage,
                }
            })
            .collect();

        Self { rows, columns }
    }

    /// Columns with at least one missing value.
    pub fn with_missing(&self) -> impl Iterator<Item = &MissingColumn> {
        self.columns.iter().filter(|c| c.missing > 0)
    }
}

impl fmt::Display for MissingValueReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.with_missing().next().is_none() {
            return write!(f, "No missing values.");
        }

        let name_w = self
            .with_missing()
            .map(|c| c.name.chars().count())
            .max()
            .unwrap_or(0);
        write!(f, "{:<name_w$}  {:>14}  {:>10}", "", "Missing Values", "Percentage")?;
        for c in self.with_missing() {
            write!(
                f,
                "\n{:<name_w$}  {:>14}  {:>10.6}",
                c.name, c.missing, c.percentage
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataFrame {
        df!(
            "A" => [Some(1i64), None, Some(3), None],
            "B" => [Some("x"), Some("y"), Some("z"), Some("w")],
            "C" => [None::<f64>, None, None, Some(1.5)],
        )
        .unwrap()
    }

    #[test]
    fn test_missing_percentages() {
        let report = MissingValueReport::of(&sample());
        assert_eq!(report.rows, 4);

        let missing: Vec<_> = report.with_missing().collect();
        assert_eq!(missing.len(), 2);
        assert_eq!(missing[0].name, "A");
        assert_eq!(missing[0].missing, 2);
        assert!((missing[0].percentage - 50.0).abs() < 1e-9);
        assert_eq!(missing[1].name, "C");
        assert!((missing[1].percentage - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_display_lists_only_missing_columns() {
        let text = MissingValueReport::of(&sample()).to_string();
        assert!(text.contains("Missing Values"));
        assert!(text.lines().any(|l| l.starts_with('A')));
        assert!(!text.lines().any(|l| l.starts_with('B')));
    }

    #[test]
    fn test_no_missing_values() {
        let df = df!("A" => [1i64, 2]).unwrap();
        assert_eq!(MissingValueReport::of(&df).to_string(), "No missing values.");
    }

    #[test]
    fn test_empty_frame_has_zero_percentage() {
        let report = MissingValueReport::of(&DataFrame::empty());
        assert_eq!(report.rows, 0);
        assert!(report.columns.is_empty());
    }

    #[test]
    fn test_frame_summary() {
        let summary = FrameSummary::of(&sample());
        assert_eq!(summary.rows, 4);
        assert_eq!(summary.columns[0].non_null, 2);
        assert_eq!(summary.columns[1].non_null, 4);
        assert!(summary.to_string().contains("Rows: 4, Columns: 3"));
    }
}
