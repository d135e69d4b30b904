//! CSV Data Loader Module
//! Handles CSV discovery and loading using Polars.

use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load CSV {path}: {source}")]
    CsvError { path: PathBuf, source: PolarsError },
    #[error("Cannot read directory {path}: {source}")]
    DirError {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Handles CSV file loading with Polars.
pub struct DataLoader;

impl DataLoader {
    /// Load a CSV file using Polars.
    pub fn read_csv(path: &Path) -> Result<DataFrame, LoaderError> {
        LazyCsvReader::new(path)
            .with_infer_schema_length(Some(10000))
            .finish()
            .and_then(|lazy| lazy.collect())
            .map_err(|source| LoaderError::CsvError {
                path: path.to_path_buf(),
                source,
            })
    }

    /// List `*.csv` files directly inside `dir`, sorted by file name.
    pub fn list_csv_files(dir: &Path) -> Result<Vec<PathBuf>, LoaderError> {
        let dir_err = |source| LoaderError::DirError {
            path: dir.to_path_buf(),
            source,
        };

        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(dir_err)? {
            let entry = entry.map_err(dir_err)?;
            let path = entry.path();
            let is_csv = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(".csv"));
            if is_csv && path.is_file() {
                files.push(path);
            }
        }

        files.sort();
        Ok(files)
    }

    /// Get list of column names from a DataFrame.
    pub fn column_names(df: &DataFrame) -> Vec<String> {
        df.get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_csv_files_filters_and_sorts() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.csv"), "a\n1\n").unwrap();
        std::fs::write(dir.path().join("a.csv"), "a\n1\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();
        std::fs::write(dir.path().join("upper.CSV"), "a\n1\n").unwrap();
        std::fs::create_dir(dir.path().join("nested.csv")).unwrap();

        let files = DataLoader::list_csv_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.csv", "b.csv"]);
    }

    #[test]
    fn test_list_csv_files_missing_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = DataLoader::list_csv_files(&dir.path().join("missing"));
        assert!(matches!(result, Err(LoaderError::DirError { .. })));
    }

    #[test]
    fn test_read_csv_columns() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("data.csv");
        std::fs::write(&path, "CRTR_QURTR,MM_INCM\n20181,3000\n20202,4000\n").unwrap();

        let df = DataLoader::read_csv(&path).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(DataLoader::column_names(&df), vec!["CRTR_QURTR", "MM_INCM"]);
    }
}
