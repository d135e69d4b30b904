//! Static Chart Renderer
//! Writes the six analysis charts as PNG files with plotters.
//!
//! Charts:
//! 1. Yearly trend: mean per variable and year, line with markers
//! 2. Yearly bars: grouped bars with value labels
//! 3. Distribution: box plot per year and variable, outliers hidden
//! 4. Correlation: annotated heatmap with colour bar
//! 5. Income vs card spend: jittered scatter over a log-scaled 2-D histogram
//! 6. Spending share: one pie per year

use crate::charts::colormap::{self, year_color_index, Rgb};
use crate::charts::format::{group_offset, index_tick, thousands, year_tick};
use crate::charts::{ChartData, ChartKind};
use plotters::coord::Shift;
use plotters::element::Pie;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::{Path, PathBuf};
use thiserror::Error;

type DrawResult = Result<(), Box<dyn std::error::Error>>;
type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

/// Fraction of a year slot covered by a group of bars or boxes.
const GROUP_WIDTH: f64 = 0.8;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Cannot create {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to draw '{chart}': {message}")]
    Draw { chart: &'static str, message: String },
}

fn rgb(c: Rgb) -> RGBColor {
    RGBColor(c.0, c.1, c.2)
}

fn series(idx: usize) -> RGBColor {
    rgb(colormap::series_color(idx))
}

/// Renders charts to bitmap files.
pub struct StaticChartRenderer {
    font: String,
    size: (u32, u32),
}

impl StaticChartRenderer {
    pub fn new(font: &str, size: (u32, u32)) -> Self {
        Self {
            font: font.to_string(),
            size,
        }
    }

    /// Font scaled to the output height (sizes are given for 900 px).
    fn font(&self, size: f64) -> TextStyle<'_> {
        let scale = self.size.1 as f64 / 900.0;
        TextStyle::from((self.font.as_str(), size * scale).into_font())
    }

    fn px(&self, v: f64) -> u32 {
        (v * self.size.1 as f64 / 900.0).round() as u32
    }

    /// Render one chart into `path`.
    pub fn render_to_file(
        &self,
        kind: ChartKind,
        data: &ChartData,
        path: &Path,
    ) -> Result<(), RenderError> {
        let root = BitMapBackend::new(path, self.size).into_drawing_area();
        let drawn = (|| -> DrawResult {
            root.fill(&WHITE)?;
            self.draw(kind, &root, data)?;
            root.present()?;
            Ok(())
        })();

        drawn.map_err(|e| RenderError::Draw {
            chart: kind.title(),
            message: e.to_string(),
        })
    }

    /// Render all six charts into `dir`, returning the written paths in order.
    pub fn render_all(&self, data: &ChartData, dir: &Path) -> Result<Vec<PathBuf>, RenderError> {
        std::fs::create_dir_all(dir).map_err(|source| RenderError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut written = Vec::with_capacity(ChartKind::ALL.len());
        for kind in ChartKind::ALL {
            let path = dir.join(format!("{}.png", kind.file_stem()));
            self.render_to_file(kind, data, &path)?;
            tracing::info!(chart = kind.title(), path = %path.display(), "Rendered chart");
            written.push(path);
        }
        Ok(written)
    }

    fn draw(&self, kind: ChartKind, root: &Area<'_>, data: &ChartData) -> DrawResult {
        match kind {
            ChartKind::YearlyTrend => self.draw_trend(root, data),
            ChartKind::YearlyBars => self.draw_bars(root, data),
            ChartKind::Distribution => self.draw_boxes(root, data),
            ChartKind::Correlation => self.draw_heatmap(root, data),
            ChartKind::IncomeVsCard => self.draw_scatter(root, data),
            ChartKind::SpendingShare => self.draw_pies(root, data),
        }
    }

    fn draw_trend(&self, root: &Area<'_>, data: &ChartData) -> DrawResult {
        let means = &data.yearly_means;
        let years = means.years.clone();
        let (first, last) = match (years.first(), years.last()) {
            (Some(f), Some(l)) => (*f as f64, *l as f64),
            _ => (0.0, 1.0),
        };
        let (lo, hi) = value_range(means.means.iter().flatten().copied(), 0.1);

        let mut chart = ChartBuilder::on(root)
            .caption(ChartKind::YearlyTrend.title(), self.font(28.0))
            .margin(self.px(20.0))
            .x_label_area_size(self.px(50.0))
            .y_label_area_size(self.px(100.0))
            .build_cartesian_2d((first - 0.5)..(last + 0.5), lo..hi)?;

        let x_fmt = |v: &f64| year_tick(*v, &years);
        let y_fmt = |v: &f64| thousands(*v);
        chart
            .configure_mesh()
            .x_labels(((last - first) as usize + 2) * 2)
            .x_label_formatter(&x_fmt)
            .y_label_formatter(&y_fmt)
            .x_desc("Year")
            .y_desc("Amount")
            .label_style(self.font(14.0))
            .axis_desc_style(self.font(16.0))
            .draw()?;

        for (i, label) in means.labels.iter().enumerate() {
            let color = series(i);
            let points: Vec<(f64, f64)> = years
                .iter()
                .enumerate()
                .map(|(yi, &y)| (y as f64, means.get(i, yi)))
                .filter(|(_, v)| v.is_finite())
                .collect();

            chart
                .draw_series(LineSeries::new(points.clone(), color.stroke_width(2)))?
                .label(label.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
            chart.draw_series(
                points
                    .iter()
                    .map(|&p| Circle::new(p, self.px(5.0), color.filled())),
            )?;
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.85))
            .border_style(BLACK)
            .label_font(self.font(14.0))
            .draw()?;
        Ok(())
    }

    fn draw_bars(&self, root: &Area<'_>, data: &ChartData) -> DrawResult {
        let means = &data.yearly_means;
        let years = means.years.clone();
        let n_labels = means.labels.len();
        let (lo, hi) = value_range(means.means.iter().flatten().copied(), 0.15);
        let slot = GROUP_WIDTH / n_labels.max(1) as f64;

        let mut chart = ChartBuilder::on(root)
            .caption(ChartKind::YearlyBars.title(), self.font(28.0))
            .margin(self.px(20.0))
            .x_label_area_size(self.px(50.0))
            .y_label_area_size(self.px(100.0))
            .build_cartesian_2d(-0.5..(years.len() as f64 - 0.5), lo..hi)?;

        let x_fmt = |v: &f64| index_tick(*v, &years);
        let y_fmt = |v: &f64| thousands(*v);
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(years.len() * 2 + 1)
            .x_label_formatter(&x_fmt)
            .y_label_formatter(&y_fmt)
            .x_desc("Year")
            .y_desc("Amount")
            .label_style(self.font(14.0))
            .axis_desc_style(self.font(16.0))
            .draw()?;

        let value_style = self
            .font(10.0)
            .pos(Pos::new(HPos::Center, VPos::Bottom));

        for (i, label) in means.labels.iter().enumerate() {
            let color = series(i);
            let bars: Vec<(f64, f64)> = (0..years.len())
                .map(|yi| (group_offset(yi, i, n_labels, GROUP_WIDTH), means.get(i, yi)))
                .filter(|(_, v)| v.is_finite())
                .collect();

            chart
                .draw_series(bars.iter().map(|&(cx, v)| {
                    Rectangle::new(
                        [(cx - slot / 2.0, 0.0), (cx + slot / 2.0, v)],
                        color.filled(),
                    )
                }))?
                .label(label.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 6), (x + 14, y + 6)], color.filled()));

            chart.draw_series(
                bars.iter()
                    .map(|&(cx, v)| Text::new(thousands(v), (cx, v), value_style.clone())),
            )?;
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.85))
            .border_style(BLACK)
            .label_font(self.font(13.0))
            .draw()?;
        Ok(())
    }

    fn draw_boxes(&self, root: &Area<'_>, data: &ChartData) -> DrawResult {
        let years = data.years.clone();
        let n_labels = data.labels.len();
        let slot = GROUP_WIDTH / n_labels.max(1) as f64;
        let half = slot * 0.4;

        let extents = data
            .boxes
            .iter()
            .flat_map(|yb| yb.boxes.iter().flatten())
            .flat_map(|b| [b.whisker_low, b.whisker_high]);
        let (lo, hi) = value_range(extents, 0.05);

        let mut chart = ChartBuilder::on(root)
            .caption(ChartKind::Distribution.title(), self.font(28.0))
            .margin(self.px(20.0))
            .x_label_area_size(self.px(50.0))
            .y_label_area_size(self.px(100.0))
            .build_cartesian_2d(-0.5..(years.len() as f64 - 0.5), lo..hi)?;

        let x_fmt = |v: &f64| index_tick(*v, &years);
        let y_fmt = |v: &f64| thousands(*v);
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(years.len() * 2 + 1)
            .x_label_formatter(&x_fmt)
            .y_label_formatter(&y_fmt)
            .x_desc("Year")
            .y_desc("Amount")
            .label_style(self.font(14.0))
            .axis_desc_style(self.font(16.0))
            .draw()?;

        for (i, label) in data.labels.iter().enumerate() {
            let color = series(i);
            let line = BLACK.stroke_width(1);

            for (yi, year_boxes) in data.boxes.iter().enumerate() {
                let Some(Some(b)) = year_boxes.boxes.get(i) else {
                    continue;
                };
                let cx = group_offset(yi, i, n_labels, GROUP_WIDTH);

                chart.draw_series([
                    PathElement::new(vec![(cx, b.whisker_low), (cx, b.q1)], line),
                    PathElement::new(vec![(cx, b.q3), (cx, b.whisker_high)], line),
                    PathElement::new(
                        vec![(cx - half / 2.0, b.whisker_low), (cx + half / 2.0, b.whisker_low)],
                        line,
                    ),
                    PathElement::new(
                        vec![(cx - half / 2.0, b.whisker_high), (cx + half / 2.0, b.whisker_high)],
                        line,
                    ),
                ])?;
                chart.draw_series([
                    Rectangle::new([(cx - half, b.q1), (cx + half, b.q3)], color.mix(0.75).filled()),
                    Rectangle::new([(cx - half, b.q1), (cx + half, b.q3)], line),
                ])?;
                chart.draw_series(std::iter::once(PathElement::new(
                    vec![(cx - half, b.median), (cx + half, b.median)],
                    BLACK.stroke_width(2),
                )))?;
            }

            chart
                .draw_series(std::iter::empty::<Rectangle<(f64, f64)>>())?
                .label(label.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 6), (x + 14, y + 6)], color.filled()));
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.85))
            .border_style(BLACK)
            .label_font(self.font(13.0))
            .draw()?;
        Ok(())
    }

    fn draw_heatmap(&self, root: &Area<'_>, data: &ChartData) -> DrawResult {
        let matrix = &data.correlation;
        let n = matrix.labels.len();
        let n_f = n.max(1) as f64;

        let title_area = root.titled(ChartKind::Correlation.title(), self.font(28.0))?;
        let (width, _) = title_area.dim_in_pixel();
        let bar_width = self.px(140.0).min(width / 4);
        let (main, bar) = title_area.split_horizontally(width - bar_width);

        let mut chart = ChartBuilder::on(&main)
            .margin(self.px(20.0))
            .x_label_area_size(self.px(60.0))
            .y_label_area_size(self.px(200.0))
            .build_cartesian_2d(0.0..n_f, 0.0..n_f)?;

        for i in 0..n {
            for j in 0..n {
                let r = matrix.get(i, j);
                let fill = colormap::coolwarm(r);
                let (x0, y0) = (j as f64, n_f - 1.0 - i as f64);

                chart.draw_series(std::iter::once(Rectangle::new(
                    [(x0, y0), (x0 + 1.0, y0 + 1.0)],
                    rgb(fill).filled(),
                )))?;

                let text = if r.is_nan() { "nan".to_string() } else { format!("{r:.3}") };
                let text_color = rgb(colormap::contrast_text(fill));
                let style = self
                    .font(15.0)
                    .color(&text_color)
                    .pos(Pos::new(HPos::Center, VPos::Center));
                chart.draw_series(std::iter::once(Text::new(
                    text,
                    (x0 + 0.5, y0 + 0.5),
                    style,
                )))?;
            }
        }

        // Axis labels sit outside the plotting area, so draw them on the root.
        let x_style = self.font(13.0).pos(Pos::new(HPos::Center, VPos::Top));
        let y_style = self.font(13.0).pos(Pos::new(HPos::Right, VPos::Center));
        let gap = self.px(8.0) as i32;
        for (k, label) in matrix.labels.iter().enumerate() {
            let (px, py) = chart.backend_coord(&(k as f64 + 0.5, 0.0));
            root.draw(&Text::new(label.clone(), (px, py + gap), x_style.clone()))?;

            let (px, py) = chart.backend_coord(&(0.0, n_f - 0.5 - k as f64));
            root.draw(&Text::new(label.clone(), (px - gap, py), y_style.clone()))?;
        }

        let mut legend = ChartBuilder::on(&bar)
            .margin_top(self.px(20.0))
            .margin_bottom(self.px(80.0))
            .margin_right(self.px(10.0))
            .y_label_area_size(self.px(60.0))
            .build_cartesian_2d(0.0..1.0, -1.0..1.0)?;
        legend
            .configure_mesh()
            .disable_x_mesh()
            .disable_y_mesh()
            .x_labels(0)
            .y_labels(5)
            .y_label_formatter(&|v: &f64| format!("{v:.1}"))
            .label_style(self.font(12.0))
            .draw()?;

        let steps = 100;
        legend.draw_series((0..steps).map(|s| {
            let y0 = -1.0 + 2.0 * s as f64 / steps as f64;
            let y1 = y0 + 2.0 / steps as f64;
            Rectangle::new(
                [(0.0, y0), (1.0, y1)],
                rgb(colormap::coolwarm((y0 + y1) / 2.0)).filled(),
            )
        }))?;
        Ok(())
    }

    fn draw_scatter(&self, root: &Area<'_>, data: &ChartData) -> DrawResult {
        let scatter = &data.scatter;

        let mut chart = ChartBuilder::on(root)
            .caption(ChartKind::IncomeVsCard.title(), self.font(30.0))
            .margin(self.px(20.0))
            .x_label_area_size(self.px(60.0))
            .y_label_area_size(self.px(110.0))
            .build_cartesian_2d(0.0..scatter.x_max, 0.0..scatter.y_max)?;

        let fmt = |v: &f64| thousands(*v);
        chart
            .configure_mesh()
            .x_labels(18)
            .y_labels(16)
            .x_label_formatter(&fmt)
            .y_label_formatter(&fmt)
            .bold_line_style(BLACK.mix(0.12))
            .light_line_style(BLACK.mix(0.04))
            .x_desc(scatter.x_label.as_str())
            .y_desc(scatter.y_label.as_str())
            .label_style(self.font(12.0))
            .axis_desc_style(self.font(18.0))
            .draw()?;

        let max = scatter.histogram.max_count();
        chart.draw_series(scatter.histogram.cells().filter_map(|(x0, x1, y0, y1, count)| {
            let t = colormap::log_norm(count, max)?;
            Some(Rectangle::new(
                [(x0, y0), (x1, y1)],
                rgb(colormap::blues(t)).mix(0.3).filled(),
            ))
        }))?;

        let (min_year, max_year) = match (data.years.first(), data.years.last()) {
            (Some(a), Some(b)) => (*a, *b),
            _ => (0, 0),
        };
        for year_points in &scatter.by_year {
            let color = series(year_color_index(&data.years, year_points.year));
            let radius = self.px(marker_radius(year_points.year, min_year, max_year));

            chart
                .draw_series(
                    year_points
                        .points
                        .iter()
                        .map(|&[x, y]| Circle::new((x, y), radius, color.mix(0.5).filled())),
                )?
                .label(year_points.year.to_string())
                .legend(move |(x, y)| Circle::new((x + 8, y), radius, color.filled()));
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.85))
            .border_style(BLACK)
            .label_font(self.font(14.0))
            .draw()?;
        Ok(())
    }

    fn draw_pies(&self, root: &Area<'_>, data: &ChartData) -> DrawResult {
        let root = root.titled(ChartKind::SpendingShare.title(), self.font(28.0))?;
        let panels = root.split_evenly((1, data.shares.len().max(1)));

        for (panel, shares) in panels.iter().zip(&data.shares) {
            let (w, h) = panel.dim_in_pixel();
            let title_style = self.font(20.0).pos(Pos::new(HPos::Center, VPos::Top));
            panel.draw(&Text::new(
                format!("{} spending share", shares.year),
                (w as i32 / 2, self.px(10.0) as i32),
                title_style,
            ))?;

            if shares.slices.is_empty() {
                let style = self.font(16.0).pos(Pos::new(HPos::Center, VPos::Center));
                panel.draw(&Text::new("No data", (w as i32 / 2, h as i32 / 2), style))?;
                continue;
            }

            let center = (w as i32 / 2, h as i32 / 2 + self.px(20.0) as i32);
            let radius = w.min(h) as f64 * 0.3;
            let sizes: Vec<f64> = shares.slices.iter().map(|(_, p)| *p).collect();
            let labels: Vec<String> = shares.slices.iter().map(|(l, _)| l.clone()).collect();
            let colors: Vec<RGBColor> = shares
                .slices
                .iter()
                .map(|(l, _)| series(data.labels.iter().position(|x| x == l).unwrap_or(0)))
                .collect();

            let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
            pie.start_angle(-90.0);
            pie.label_style(self.font(13.0).color(&BLACK));
            pie.percentages(self.font(13.0).color(&BLACK));
            panel.draw(&pie)?;
        }
        Ok(())
    }
}

/// Padded `(lo, hi)` covering `values` and zero.
fn value_range(values: impl Iterator<Item = f64>, pad: f64) -> (f64, f64) {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((0.0f64, 0.0f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if hi - lo <= f64::EPSILON {
        return (lo, lo + 1.0);
    }
    let span = hi - lo;
    let lo = if lo < 0.0 { lo - span * pad } else { lo };
    (lo, hi + span * pad)
}

/// Marker radius growing with the year, mirroring a size scale of 30..100
/// point² (radius given for a 900 px tall image).
fn marker_radius(year: i32, min_year: i32, max_year: i32) -> f64 {
    let t = if max_year > min_year {
        (year - min_year) as f64 / (max_year - min_year) as f64
    } else {
        1.0
    };
    let area = 30.0 + 70.0 * t;
    area.sqrt() / 1.6
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_range_includes_zero() {
        assert_eq!(value_range([10.0, 20.0].into_iter(), 0.1), (0.0, 22.0));
        let (lo, hi) = value_range([-10.0, 10.0].into_iter(), 0.1);
        assert_eq!((lo, hi), (-12.0, 12.0));
    }

    #[test]
    fn test_value_range_degenerate() {
        assert_eq!(value_range(std::iter::empty(), 0.1), (0.0, 1.0));
        assert_eq!(value_range([f64::NAN].into_iter(), 0.1), (0.0, 1.0));
    }

    #[test]
    fn test_marker_radius_grows_with_year() {
        let small = marker_radius(2018, 2018, 2023);
        let large = marker_radius(2023, 2018, 2023);
        assert!(small < large);
        assert!((large - 100f64.sqrt() / 1.6).abs() < 1e-12);
    }

    #[test]
    fn test_render_error_names_chart() {
        let err = RenderError::Draw {
            chart: ChartKind::Correlation.title(),
            message: "boom".into(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to draw 'Correlation Between Variables': boom"
        );
    }
}
