//! Chart Viewer Widget
//! Central panel showing the selected chart as a card using egui_plot.

use crate::charts::{ChartData, ChartKind, ChartPlotter};
use egui::{Color32, RichText};

/// Displays one chart of the current data set at a time.
#[derive(Default)]
pub struct ChartViewer {
    pub chart_data: Option<ChartData>,
}

impl ChartViewer {
    pub fn new(chart_data: Option<ChartData>) -> Self {
        Self { chart_data }
    }

    pub fn has_data(&self) -> bool {
        self.chart_data.is_some()
    }

    pub fn set_chart_data(&mut self, chart_data: ChartData) {
        self.chart_data = Some(chart_data);
    }

    /// Draw the selected chart filling the panel
    pub fn show(&self, ui: &mut egui::Ui, kind: ChartKind) {
        let Some(data) = &self.chart_data else {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No Data").size(20.0));
            });
            return;
        };

        egui::Frame::none()
            .rounding(8.0)
            .stroke(egui::Stroke::new(2.0, Color32::from_rgb(100, 149, 237)))
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .inner_margin(12.0)
            .show(ui, |ui| {
                ui.vertical(|ui| {
                    ui.label(RichText::new(kind.title()).size(18.0).strong());
                    ui.label(
                        RichText::new(Self::caption(kind, data))
                            .size(12.0)
                            .color(Color32::GRAY),
                    );
                    ui.add_space(8.0);
                    ChartPlotter::draw(ui, kind, data);
                });
            });
    }

    /// One-line description under the chart title.
    fn caption(kind: ChartKind, data: &ChartData) -> String {
        let years = data
            .years
            .iter()
            .map(|y| y.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        match kind {
            ChartKind::IncomeVsCard => format!(
                "{} points from {years}, jittered within their bins",
                data.scatter.point_count()
            ),
            ChartKind::Correlation => format!("Pearson correlation over {years}"),
            _ => format!("Years: {years}"),
        }
    }
}
