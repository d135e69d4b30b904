//! Data module - CSV loading, year merging and analysis tables

mod loader;
mod merger;
mod processor;

pub use loader::{DataLoader, LoaderError};
pub use merger::{processed_file_name, MergeError, MergeSummary, YearMerger, YearOutput};
pub use processor::{AnalysisError, AnalysisTable, YearlyMeans, YEAR_COLUMN};
