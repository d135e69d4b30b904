//! Yearwise Viewer Application
//! Main window with control panel and chart viewer.

use crate::charts::{ChartData, ChartKind, StaticChartRenderer};
use crate::config::AppConfig;
use crate::data::AnalysisTable;
use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction};
use egui::SidePanel;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::thread;

/// Analysis result from background thread
enum ReloadResult {
    Progress(f32, String),
    Complete {
        dir: PathBuf,
        data: Box<ChartData>,
        summary: String,
    },
    Error(String),
}

/// PNG export result from background thread
enum ExportResult {
    Progress(f32, String),
    Complete(Vec<PathBuf>),
    Error(String),
}

/// Take every pending message. The flag is set once the sender is gone.
fn drain<T>(rx: &Receiver<T>) -> (Vec<T>, bool) {
    let mut messages = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(message) => messages.push(message),
            Err(TryRecvError::Empty) => return (messages, false),
            Err(TryRecvError::Disconnected) => return (messages, true),
        }
    }
}

const WORKER_LOST: &str = "Error: background task stopped unexpectedly";

/// Main application window.
pub struct ViewerApp {
    config: AppConfig,
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,

    // Async reload
    reload_rx: Option<Receiver<ReloadResult>>,

    // Async export
    export_rx: Option<Receiver<ExportResult>>,
}

impl ViewerApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        config: AppConfig,
        chart_data: Option<ChartData>,
        summary: Option<String>,
    ) -> Self {
        let mut control_panel = ControlPanel::new();
        if chart_data.is_some() {
            control_panel.data_dir = Some(config.analysis.processed_dir.clone());
            control_panel.summary = summary;
            control_panel.set_progress(100.0, "Complete! 6 charts ready");
        }

        Self {
            config,
            control_panel,
            chart_viewer: ChartViewer::new(chart_data),
            reload_rx: None,
            export_rx: None,
        }
    }

    fn is_busy(&self) -> bool {
        self.reload_rx.is_some() || self.export_rx.is_some()
    }

    /// Pick a processed-data folder and rebuild the charts from it.
    fn handle_reload(&mut self) {
        if self.is_busy() {
            return;
        }

        let Some(dir) = rfd::FileDialog::new()
            .set_directory(&self.config.analysis.processed_dir)
            .pick_folder()
        else {
            return;
        };

        let (tx, rx) = channel();
        self.reload_rx = Some(rx);
        self.control_panel.set_progress(5.0, "Loading processed files...");

        let config = self.config.clone();
        thread::spawn(move || Self::run_reload(tx, dir, config));
    }

    /// Run analysis (called from background thread)
    fn run_reload(tx: Sender<ReloadResult>, dir: PathBuf, config: AppConfig) {
        let table = match AnalysisTable::load(&dir, &config.years, &config.analysis) {
            Ok(table) => table,
            Err(e) => {
                let _ = tx.send(ReloadResult::Error(e.to_string()));
                return;
            }
        };

        let _ = tx.send(ReloadResult::Progress(
            50.0,
            "Computing chart data...".to_string(),
        ));

        match ChartData::build(&table, &config.analysis.scatter) {
            Ok(data) => {
                let summary = format!(
                    "{} rows, card column {}",
                    table.height(),
                    table.card_column()
                );
                let _ = tx.send(ReloadResult::Complete {
                    dir,
                    data: Box::new(data),
                    summary,
                });
            }
            Err(e) => {
                let _ = tx.send(ReloadResult::Error(e.to_string()));
            }
        }
    }

    /// Check for reload results
    fn check_reload_results(&mut self) {
        let Some(rx) = self.reload_rx.take() else {
            return;
        };
        let mut should_keep_receiver = true;

        let (results, disconnected) = drain(&rx);
        for result in results {
            match result {
                ReloadResult::Progress(progress, status) => {
                    self.control_panel.set_progress(progress, &status);
                }
                ReloadResult::Complete { dir, data, summary } => {
                    tracing::info!(dir = %dir.display(), "Reloaded chart data");
                    self.chart_viewer.set_chart_data(*data);
                    self.control_panel.data_dir = Some(dir);
                    self.control_panel.summary = Some(summary);
                    self.control_panel
                        .set_progress(100.0, "Complete! 6 charts ready");
                    should_keep_receiver = false;
                }
                ReloadResult::Error(error) => {
                    tracing::warn!(%error, "Reload failed");
                    self.control_panel
                        .set_progress(0.0, &format!("Error: {}", error));
                    should_keep_receiver = false;
                }
            }
        }

        if should_keep_receiver && disconnected {
            tracing::warn!("Reload worker exited without a result");
            self.control_panel.set_progress(0.0, WORKER_LOST);
            should_keep_receiver = false;
        }
        if should_keep_receiver {
            self.reload_rx = Some(rx);
        }
    }

    /// Pick an output folder and render every chart to PNG there.
    fn handle_export(&mut self) {
        if self.is_busy() {
            return;
        }
        let Some(data) = self.chart_viewer.chart_data.clone() else {
            self.control_panel.set_progress(0.0, "No charts to export");
            return;
        };
        let Some(dir) = rfd::FileDialog::new().pick_folder() else {
            return;
        };

        let (tx, rx) = channel();
        self.export_rx = Some(rx);
        self.control_panel.set_progress(0.0, "Rendering charts...");

        let charts = self.config.charts.clone();
        thread::spawn(move || {
            let renderer = StaticChartRenderer::new(&charts.font, (charts.width, charts.height));
            let total = ChartKind::ALL.len();
            let mut written = Vec::with_capacity(total);

            if let Err(e) = std::fs::create_dir_all(&dir) {
                let _ = tx.send(ExportResult::Error(e.to_string()));
                return;
            }

            for (idx, kind) in ChartKind::ALL.into_iter().enumerate() {
                let _ = tx.send(ExportResult::Progress(
                    idx as f32 / total as f32 * 100.0,
                    format!("Rendering chart {}/{}...", idx + 1, total),
                ));
                let path = dir.join(format!("{}.png", kind.file_stem()));
                if let Err(e) = renderer.render_to_file(kind, &data, &path) {
                    let _ = tx.send(ExportResult::Error(e.to_string()));
                    return;
                }
                written.push(path);
            }

            let _ = tx.send(ExportResult::Complete(written));
        });
    }

    /// Check for export results
    fn check_export_results(&mut self) {
        let Some(rx) = self.export_rx.take() else {
            return;
        };
        let mut should_keep_receiver = true;

        let (results, disconnected) = drain(&rx);
        for result in results {
            match result {
                ExportResult::Progress(progress, status) => {
                    self.control_panel.set_progress(progress, &status);
                }
                ExportResult::Complete(paths) => {
                    let dir = paths
                        .first()
                        .and_then(|p| p.parent())
                        .map(|p| p.display().to_string())
                        .unwrap_or_default();
                    tracing::info!(count = paths.len(), %dir, "Exported charts");
                    self.control_panel.set_progress(
                        100.0,
                        &format!("Complete! {} PNGs written to {}", paths.len(), dir),
                    );
                    should_keep_receiver = false;
                }
                ExportResult::Error(error) => {
                    self.control_panel
                        .set_progress(0.0, &format!("Error: {}", error));
                    should_keep_receiver = false;
                }
            }
        }

        if should_keep_receiver && disconnected {
            tracing::warn!("Export worker exited without a result");
            self.control_panel.set_progress(0.0, WORKER_LOST);
            should_keep_receiver = false;
        }
        if should_keep_receiver {
            self.export_rx = Some(rx);
        }
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Check for background results
        self.check_reload_results();
        self.check_export_results();

        let busy = self.is_busy();
        self.control_panel.busy = busy;
        if busy {
            ctx.request_repaint();
        }

        // Keyboard navigation between charts
        let (prev, next) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::ArrowLeft),
                i.key_pressed(egui::Key::ArrowRight),
            )
        });
        if self.chart_viewer.has_data() {
            if prev {
                self.control_panel.step(false);
            }
            if next {
                self.control_panel.step(true);
            }
        }

        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(260.0)
            .max_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let action = self.control_panel.show(ui, self.chart_viewer.has_data());

                    match action {
                        ControlPanelAction::Reload => self.handle_reload(),
                        ControlPanelAction::ExportPngs => self.handle_export(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        // Central panel - Chart Viewer
        let selected = self.control_panel.selected;
        egui::CentralPanel::default().show(ctx, |ui| {
            self.chart_viewer.show(ui, selected);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_keeps_receiver_while_worker_runs() {
        let (tx, rx) = channel();
        tx.send(1).unwrap();
        tx.send(2).unwrap();

        let (messages, disconnected) = drain(&rx);
        assert_eq!(messages, vec![1, 2]);
        assert!(!disconnected);
    }

    #[test]
    fn test_drain_reports_worker_gone() {
        let (tx, rx) = channel::<u8>();
        let worker = thread::spawn(move || {
            let _tx = tx;
            panic!("worker failed");
        });
        assert!(worker.join().is_err());

        let (messages, disconnected) = drain(&rx);
        assert!(messages.is_empty());
        assert!(disconnected);
    }

    #[test]
    fn test_drain_returns_last_message_before_disconnect() {
        let (tx, rx) = channel();
        tx.send("done").unwrap();
        drop(tx);

        let (messages, disconnected) = drain(&rx);
        assert_eq!(messages, vec!["done"]);
        assert!(disconnected);
    }
}
