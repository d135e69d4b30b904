//! Yearwise - Year-bucketed CSV merger and spending chart viewer
//!
//! Merges quarterly CSV extracts into one processed file per year, then
//! analyzes income and spending across those years as six charts.

pub mod charts;
pub mod config;
pub mod data;
pub mod gui;
pub mod stats;
