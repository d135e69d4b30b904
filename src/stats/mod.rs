//! Stats module - Statistical calculations and frame profiling

mod calculator;
mod profile;

pub use calculator::{
    BoxSummary, CorrelationMatrix, DescriptiveStats, Histogram2d, StatsCalculator,
};
pub use profile::{ColumnSummary, FrameSummary, MissingColumn, MissingValueReport};
