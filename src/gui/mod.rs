//! GUI module - Chart viewer window

mod app;
mod chart_viewer;
mod control_panel;

pub use app::ViewerApp;
pub use chart_viewer::ChartViewer;
pub use control_panel::{ControlPanel, ControlPanelAction};
