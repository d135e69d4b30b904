//! Control Panel Widget
//! Left side panel with chart navigation, export and reload controls.

use crate::charts::ChartKind;
use egui::{Color32, RichText};
use std::path::PathBuf;

/// Left side control panel with chart selection and processing controls.
pub struct ControlPanel {
    pub selected: ChartKind,
    pub data_dir: Option<PathBuf>,
    pub summary: Option<String>,
    pub progress: f32,
    pub status: String,
    pub busy: bool,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self {
            selected: ChartKind::YearlyTrend,
            data_dir: None,
            summary: None,
            progress: 0.0,
            status: "Ready".to_string(),
            busy: false,
        }
    }
}

impl ControlPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Step the selection forward or back, wrapping at both ends.
    pub fn step(&mut self, forward: bool) {
        let n = ChartKind::ALL.len();
        let idx = self.selected.index();
        let next = if forward { (idx + 1) % n } else { (idx + n - 1) % n };
        self.selected = ChartKind::ALL[next];
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui, has_data: bool) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("📊 Yearwise")
                    .size(22.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
            ui.label(
                RichText::new("Yearly spending charts")
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Data Source Section =====
        ui.label(RichText::new("📁 Data Source").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                let dir_text = self
                    .data_dir
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "No folder loaded".to_string());
                ui.label(RichText::new(dir_text).size(12.0));
                if let Some(summary) = &self.summary {
                    ui.label(RichText::new(summary).size(11.0).color(Color32::GRAY));
                }

                ui.add_enabled_ui(!self.busy, |ui| {
                    if ui.button("📂 Reload data…").clicked() {
                        action = ControlPanelAction::Reload;
                    }
                });
            });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Chart Section =====
        ui.label(RichText::new("📈 Charts").size(14.0).strong());
        ui.add_space(5.0);

        ui.add_enabled_ui(has_data, |ui| {
            for kind in ChartKind::ALL {
                let text = format!("{}. {}", kind.index() + 1, kind.title());
                if ui.selectable_label(self.selected == kind, text).clicked() {
                    self.selected = kind;
                }
            }

            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if ui.button("◀ Prev").clicked() {
                    self.step(false);
                }
                if ui.button("Next ▶").clicked() {
                    self.step(true);
                }
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Action Buttons =====
        ui.vertical_centered(|ui| {
            ui.add_enabled_ui(has_data && !self.busy, |ui| {
                let button = egui::Button::new(RichText::new("🖼 Export PNGs…").size(14.0))
                    .min_size(egui::vec2(150.0, 30.0));
                if ui.add(button).clicked() {
                    action = ControlPanelAction::ExportPngs;
                }
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Progress Section =====
        ui.label(RichText::new("📊 Progress").size(14.0).strong());
        ui.add_space(5.0);

        ui.add(
            egui::ProgressBar::new(self.progress / 100.0)
                .show_percentage()
                .animate(self.busy),
        );

        ui.add_space(5.0);

        let status_color = if self.status.contains("Error") {
            Color32::from_rgb(220, 53, 69)
        } else if self.status.contains("Complete") {
            Color32::from_rgb(40, 167, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        action
    }

    /// Set progress and status
    pub fn set_progress(&mut self, progress: f32, status: &str) {
        self.progress = progress;
        self.status = status.to_string();
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    Reload,
    ExportPngs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_wraps_both_ways() {
        let mut panel = ControlPanel::new();
        panel.step(false);
        assert_eq!(panel.selected, ChartKind::SpendingShare);
        panel.step(true);
        assert_eq!(panel.selected, ChartKind::YearlyTrend);
        panel.step(true);
        assert_eq!(panel.selected, ChartKind::YearlyBars);
    }
}
