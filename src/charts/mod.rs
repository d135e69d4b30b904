//! Charts module - Chart data, interactive plotting and PNG rendering

pub mod colormap;
mod data;
pub mod format;
mod plotter;
mod renderer;

pub use data::{ChartData, ChartKind, ScatterData, YearBoxes, YearPoints, YearShares};
pub use plotter::ChartPlotter;
pub use renderer::{RenderError, StaticChartRenderer};
