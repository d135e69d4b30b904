//! Chart Plotter Module
//! Draws the six analysis charts interactively using egui_plot.

use crate::charts::colormap::{self, year_color_index, Rgb};
use crate::charts::format::{group_offset, index_tick, thousands, year_tick};
use crate::charts::{ChartData, ChartKind};
use egui::{Align2, Color32, RichText, Stroke};
use egui_plot::{
    Bar, BarChart, BoxElem, BoxPlot, BoxSpread, GridMark, Legend, Line, Plot, PlotPoint,
    PlotPoints, Points, Polygon, Text,
};
use std::f64::consts::TAU;

const GROUP_WIDTH: f64 = 0.8;

/// Largest angle covered by one pie polygon; keeps each piece convex.
const MAX_WEDGE: f64 = TAU / 8.0;

fn color32(c: Rgb) -> Color32 {
    Color32::from_rgb(c.0, c.1, c.2)
}

/// Get color for the `idx`-th series.
pub fn series_color(idx: usize) -> Color32 {
    color32(colormap::series_color(idx))
}

/// Grid marks at fixed positions, one per category.
fn fixed_marks(positions: Vec<f64>) -> impl Fn(egui_plot::GridInput) -> Vec<GridMark> {
    move |_input| {
        positions
            .iter()
            .map(|&value| GridMark {
                value,
                step_size: 1.0,
            })
            .collect()
    }
}

/// Creates interactive visualization charts using egui_plot.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Draw one chart filling the available height.
    pub fn draw(ui: &mut egui::Ui, kind: ChartKind, data: &ChartData) {
        match kind {
            ChartKind::YearlyTrend => Self::draw_trend_chart(ui, data),
            ChartKind::YearlyBars => Self::draw_bar_chart(ui, data),
            ChartKind::Distribution => Self::draw_box_chart(ui, data),
            ChartKind::Correlation => Self::draw_heatmap(ui, data),
            ChartKind::IncomeVsCard => Self::draw_scatter_chart(ui, data),
            ChartKind::SpendingShare => Self::draw_pie_charts(ui, data),
        }
    }

    /// Line chart of yearly means, one line per variable.
    pub fn draw_trend_chart(ui: &mut egui::Ui, data: &ChartData) {
        let means = &data.yearly_means;
        let years = means.years.clone();
        let tick_years = years.clone();

        Plot::new("yearly_trend")
            .legend(Legend::default())
            .x_axis_label("Year")
            .y_axis_label("Amount")
            .include_y(0.0)
            .x_grid_spacer(fixed_marks(years.iter().map(|&y| y as f64).collect()))
            .x_axis_formatter(move |mark, _range| year_tick(mark.value, &tick_years))
            .y_axis_formatter(|mark, _range| thousands(mark.value))
            .show(ui, |plot_ui| {
                for (i, label) in means.labels.iter().enumerate() {
                    let color = series_color(i);
                    let points: Vec<[f64; 2]> = years
                        .iter()
                        .enumerate()
                        .map(|(yi, &y)| [y as f64, means.get(i, yi)])
                        .filter(|p| p[1].is_finite())
                        .collect();

                    plot_ui.line(
                        Line::new(PlotPoints::from_iter(points.iter().copied()))
                            .color(color)
                            .width(2.0)
                            .name(label),
                    );
                    plot_ui.points(
                        Points::new(PlotPoints::from_iter(points.iter().copied()))
                            .radius(5.0)
                            .filled(true)
                            .color(color)
                            .name(label),
                    );
                }
            });
    }

    /// Grouped bars of yearly means with value labels.
    pub fn draw_bar_chart(ui: &mut egui::Ui, data: &ChartData) {
        let means = &data.yearly_means;
        let years = means.years.clone();
        let n_labels = means.labels.len();
        let slot = GROUP_WIDTH / n_labels.max(1) as f64;

        Plot::new("yearly_bars")
            .legend(Legend::default())
            .x_axis_label("Year")
            .y_axis_label("Amount")
            .include_y(0.0)
            .x_grid_spacer(fixed_marks((0..years.len()).map(|i| i as f64).collect()))
            .x_axis_formatter(move |mark, _range| index_tick(mark.value, &years))
            .y_axis_formatter(|mark, _range| thousands(mark.value))
            .show(ui, |plot_ui| {
                for (i, label) in means.labels.iter().enumerate() {
                    let color = series_color(i);
                    let mut bars = Vec::new();

                    for yi in 0..means.years.len() {
                        let value = means.get(i, yi);
                        if !value.is_finite() {
                            continue;
                        }
                        let x = group_offset(yi, i, n_labels, GROUP_WIDTH);
                        bars.push(Bar::new(x, value).width(slot * 0.95));
                        plot_ui.text(
                            Text::new(
                                PlotPoint::new(x, value),
                                RichText::new(thousands(value)).size(10.0),
                            )
                            .anchor(Align2::CENTER_BOTTOM),
                        );
                    }

                    plot_ui.bar_chart(BarChart::new(bars).color(color).name(label));
                }
            });
    }

    /// Box plots per year and variable, outliers hidden.
    pub fn draw_box_chart(ui: &mut egui::Ui, data: &ChartData) {
        let years = data.years.clone();
        let n_labels = data.labels.len();
        let slot = GROUP_WIDTH / n_labels.max(1) as f64;

        Plot::new("distribution")
            .legend(Legend::default())
            .x_axis_label("Year")
            .y_axis_label("Amount")
            .x_grid_spacer(fixed_marks((0..years.len()).map(|i| i as f64).collect()))
            .x_axis_formatter(move |mark, _range| index_tick(mark.value, &years))
            .y_axis_formatter(|mark, _range| thousands(mark.value))
            .show(ui, |plot_ui| {
                for (i, label) in data.labels.iter().enumerate() {
                    let color = series_color(i);
                    let elems: Vec<BoxElem> = data
                        .boxes
                        .iter()
                        .enumerate()
                        .filter_map(|(yi, yb)| {
                            let b = yb.boxes.get(i).copied().flatten()?;
                            Some(
                                BoxElem::new(
                                    group_offset(yi, i, n_labels, GROUP_WIDTH),
                                    BoxSpread::new(
                                        b.whisker_low,
                                        b.q1,
                                        b.median,
                                        b.q3,
                                        b.whisker_high,
                                    ),
                                )
                                .name(format!("{label} {}", yb.year))
                                .box_width(slot * 0.8)
                                .whisker_width(slot * 0.4)
                                .fill(color.gamma_multiply(0.6))
                                .stroke(Stroke::new(1.5, color)),
                            )
                        })
                        .collect();

                    plot_ui.box_plot(BoxPlot::new(elems).color(color).name(label));
                }
            });
    }

    /// Correlation heatmap with annotated cells.
    pub fn draw_heatmap(ui: &mut egui::Ui, data: &ChartData) {
        let matrix = &data.correlation;
        let n = matrix.labels.len();
        let n_f = n as f64;
        let centers: Vec<f64> = (0..n).map(|k| k as f64 + 0.5).collect();
        let x_labels = matrix.labels.clone();
        let y_labels = matrix.labels.clone();

        Plot::new("correlation")
            .data_aspect(1.0)
            .allow_drag(false)
            .allow_scroll(false)
            .show_grid(false)
            .x_grid_spacer(fixed_marks(centers.clone()))
            .y_grid_spacer(fixed_marks(centers))
            .x_axis_formatter(move |mark, _range| {
                label_at(&x_labels, mark.value - 0.5).unwrap_or_default()
            })
            .y_axis_formatter(move |mark, _range| {
                label_at(&y_labels, n_f - 0.5 - mark.value).unwrap_or_default()
            })
            .show(ui, |plot_ui| {
                for i in 0..n {
                    for j in 0..n {
                        let r = matrix.get(i, j);
                        let fill = colormap::coolwarm(r);
                        let (x0, y0) = (j as f64, n_f - 1.0 - i as f64);

                        plot_ui.polygon(
                            Polygon::new(PlotPoints::new(vec![
                                [x0, y0],
                                [x0 + 1.0, y0],
                                [x0 + 1.0, y0 + 1.0],
                                [x0, y0 + 1.0],
                            ]))
                            .fill_color(color32(fill))
                            .stroke(Stroke::new(0.5, Color32::WHITE)),
                        );

                        let text = if r.is_nan() {
                            "nan".to_string()
                        } else {
                            format!("{r:.3}")
                        };
                        plot_ui.text(
                            Text::new(
                                PlotPoint::new(x0 + 0.5, y0 + 0.5),
                                RichText::new(text).size(13.0),
                            )
                            .color(color32(colormap::contrast_text(fill))),
                        );
                    }
                }
            });
    }

    /// Jittered scatter coloured and sized by year over a 2-D histogram.
    pub fn draw_scatter_chart(ui: &mut egui::Ui, data: &ChartData) {
        let scatter = &data.scatter;
        let (min_year, max_year) = match (data.years.first(), data.years.last()) {
            (Some(a), Some(b)) => (*a, *b),
            _ => (0, 0),
        };

        Plot::new("income_vs_card")
            .legend(Legend::default())
            .x_axis_label(scatter.x_label.as_str())
            .y_axis_label(scatter.y_label.as_str())
            .include_x(0.0)
            .include_x(scatter.x_max)
            .include_y(0.0)
            .include_y(scatter.y_max)
            .x_axis_formatter(|mark, _range| thousands(mark.value))
            .y_axis_formatter(|mark, _range| thousands(mark.value))
            .show(ui, |plot_ui| {
                let max = scatter.histogram.max_count();
                for (x0, x1, y0, y1, count) in scatter.histogram.cells() {
                    let Some(t) = colormap::log_norm(count, max) else {
                        continue;
                    };
                    let (r, g, b) = colormap::blues(t);
                    plot_ui.polygon(
                        Polygon::new(PlotPoints::new(vec![[x0, y0], [x1, y0], [x1, y1], [x0, y1]]))
                            .fill_color(Color32::from_rgba_unmultiplied(r, g, b, 77))
                            .stroke(Stroke::NONE),
                    );
                }

                for year_points in &scatter.by_year {
                    let color = series_color(year_color_index(&data.years, year_points.year));
                    let t = if max_year > min_year {
                        (year_points.year - min_year) as f32 / (max_year - min_year) as f32
                    } else {
                        1.0
                    };
                    plot_ui.points(
                        Points::new(PlotPoints::from_iter(year_points.points.iter().copied()))
                            .radius(2.5 + 2.5 * t)
                            .filled(true)
                            .color(color.gamma_multiply(0.5))
                            .name(year_points.year.to_string()),
                    );
                }
            });
    }

    /// One pie per year, side by side.
    pub fn draw_pie_charts(ui: &mut egui::Ui, data: &ChartData) {
        const RADIUS: f64 = 1.0;
        const SPACING: f64 = 3.0;

        Plot::new("spending_share")
            .legend(Legend::default())
            .data_aspect(1.0)
            .show_axes(false)
            .show_grid(false)
            .allow_drag(false)
            .allow_scroll(false)
            .include_y(-1.6)
            .include_y(1.6)
            .show(ui, |plot_ui| {
                for (k, shares) in data.shares.iter().enumerate() {
                    let cx = k as f64 * SPACING;

                    plot_ui.text(Text::new(
                        PlotPoint::new(cx, RADIUS + 0.35),
                        RichText::new(format!("{} spending share", shares.year))
                            .size(15.0)
                            .strong(),
                    ));

                    if shares.slices.is_empty() {
                        plot_ui.text(Text::new(PlotPoint::new(cx, 0.0), "No data"));
                        continue;
                    }

                    let mut start = TAU / 4.0;
                    for (label, percent) in &shares.slices {
                        let sweep = TAU * percent / 100.0;
                        let idx = data.labels.iter().position(|l| l == label).unwrap_or(0);
                        let color = series_color(idx);

                        for piece in wedge_pieces(cx, start, sweep, RADIUS) {
                            plot_ui.polygon(
                                Polygon::new(PlotPoints::new(piece))
                                    .fill_color(color)
                                    .stroke(Stroke::new(1.0, Color32::WHITE))
                                    .name(label),
                            );
                        }

                        let mid = start + sweep / 2.0;
                        plot_ui.text(Text::new(
                            PlotPoint::new(cx + 0.6 * RADIUS * mid.cos(), 0.6 * RADIUS * mid.sin()),
                            RichText::new(format!("{percent:.1}%")).size(12.0),
                        ));
                        start += sweep;
                    }
                }
            });
    }
}

/// Label whose index is `value` rounded, if `value` is close to an integer.
fn label_at(labels: &[String], value: f64) -> Option<String> {
    let rounded = value.round();
    if (value - rounded).abs() > 1e-6 || rounded < 0.0 {
        return None;
    }
    labels.get(rounded as usize).cloned()
}

/// Convex polygons approximating a pie wedge centred at `(cx, 0)`.
fn wedge_pieces(cx: f64, start: f64, sweep: f64, radius: f64) -> Vec<Vec<[f64; 2]>> {
    let pieces = (sweep / MAX_WEDGE).ceil().max(1.0) as usize;
    let step = sweep / pieces as f64;

    (0..pieces)
        .map(|p| {
            let a0 = start + step * p as f64;
            let segments = 12;
            let mut points = vec![[cx, 0.0]];
            points.extend((0..=segments).map(|s| {
                let a = a0 + step * s as f64 / segments as f64;
                [cx + radius * a.cos(), radius * a.sin()]
            }));
            points
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_at() {
        let labels = vec!["YEAR".to_string(), "Monthly Income".to_string()];
        assert_eq!(label_at(&labels, 0.0).as_deref(), Some("YEAR"));
        assert_eq!(label_at(&labels, 1.0).as_deref(), Some("Monthly Income"));
        assert_eq!(label_at(&labels, 0.5), None);
        assert_eq!(label_at(&labels, 2.0), None);
        assert_eq!(label_at(&labels, -1.0), None);
    }

    #[test]
    fn test_wedge_pieces_split_large_sweeps() {
        let pieces = wedge_pieces(0.0, 0.0, TAU * 0.75, 1.0);
        assert_eq!(pieces.len(), 6);
        for piece in &pieces {
            assert_eq!(piece[0], [0.0, 0.0]);
            for p in &piece[1..] {
                assert!(((p[0] * p[0] + p[1] * p[1]).sqrt() - 1.0).abs() < 1e-9);
            }
        }
        assert_eq!(wedge_pieces(3.0, 0.0, 0.1, 1.0).len(), 1);
    }

    #[test]
    fn test_series_colors_cycle() {
        assert_eq!(series_color(0), series_color(10));
        assert_ne!(series_color(0), series_color(1));
    }
}
