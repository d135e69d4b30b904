//! Chart Data Module
//! Precomputes every dataset the six analysis charts draw, so the static and
//! interactive renderers share identical numbers.

use crate::config::ScatterConfig;
use crate::data::{AnalysisError, AnalysisTable, YearlyMeans, YEAR_COLUMN};
use crate::stats::{BoxSummary, CorrelationMatrix, Histogram2d, StatsCalculator};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// The fixed chart sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
    YearlyTrend,
    YearlyBars,
    Distribution,
    Correlation,
    IncomeVsCard,
    SpendingShare,
}

impl ChartKind {
    pub const ALL: [ChartKind; 6] = [
        ChartKind::YearlyTrend,
        ChartKind::YearlyBars,
        ChartKind::Distribution,
        ChartKind::Correlation,
        ChartKind::IncomeVsCard,
        ChartKind::SpendingShare,
    ];

    pub fn title(self) -> &'static str {
        match self {
            ChartKind::YearlyTrend => "Yearly Average Trend",
            ChartKind::YearlyBars => "Yearly Average Comparison",
            ChartKind::Distribution => "Yearly Distribution (outliers excluded)",
            ChartKind::Correlation => "Correlation Between Variables",
            ChartKind::IncomeVsCard => "Monthly Income vs Card Spend",
            ChartKind::SpendingShare => "Spending Share by Year",
        }
    }

    /// File stem used when the chart is exported.
    pub fn file_stem(self) -> &'static str {
        match self {
            ChartKind::YearlyTrend => "01_yearly_trend",
            ChartKind::YearlyBars => "02_yearly_bars",
            ChartKind::Distribution => "03_distribution",
            ChartKind::Correlation => "04_correlation",
            ChartKind::IncomeVsCard => "05_income_vs_card",
            ChartKind::SpendingShare => "06_spending_share",
        }
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|k| *k == self).unwrap_or(0)
    }
}

/// Box summaries of every label for one year.
#[derive(Debug, Clone, PartialEq)]
pub struct YearBoxes {
    pub year: i32,
    /// Indexed like the labels; `None` when the year has no values.
    pub boxes: Vec<Option<BoxSummary>>,
}

/// Jittered scatter points for one year.
#[derive(Debug, Clone, PartialEq)]
pub struct YearPoints {
    pub year: i32,
    pub points: Vec<[f64; 2]>,
}

/// Income vs card-spend scatter with its density histogram.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterData {
    pub by_year: Vec<YearPoints>,
    pub histogram: Histogram2d,
    pub x_max: f64,
    pub y_max: f64,
    pub x_label: String,
    pub y_label: String,
}

impl ScatterData {
    pub fn point_count(&self) -> usize {
        self.by_year.iter().map(|y| y.points.len()).sum()
    }
}

/// Share of each label in one year's mean total, in percent.
#[derive(Debug, Clone, PartialEq)]
pub struct YearShares {
    pub year: i32,
    /// `(label, percent)` for labels with a positive mean.
    pub slices: Vec<(String, f64)>,
}

/// All datasets for the six charts.
#[derive(Debug, Clone)]
pub struct ChartData {
    pub years: Vec<i32>,
    pub labels: Vec<String>,
    pub yearly_means: YearlyMeans,
    pub boxes: Vec<YearBoxes>,
    pub correlation: CorrelationMatrix,
    pub scatter: ScatterData,
    pub shares: Vec<YearShares>,
}

impl ChartData {
    /// Compute every chart dataset from the analysis table.
    pub fn build(table: &AnalysisTable, settings: &ScatterConfig) -> Result<Self, AnalysisError> {
        let mut rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self::build_with_rng(table, settings, &mut rng)
    }

    pub fn build_with_rng<R: Rng>(
        table: &AnalysisTable,
        settings: &ScatterConfig,
        rng: &mut R,
    ) -> Result<Self, AnalysisError> {
        let labels = table.labels().to_vec();
        let years = table.years();
        let yearly_means = table.yearly_means()?;

        let boxes = years
            .iter()
            .map(|&year| YearBoxes {
                year,
                boxes: labels
                    .iter()
                    .map(|l| StatsCalculator::box_summary(&table.values_for_year(l, year)))
                    .collect(),
            })
            .collect();

        let mut columns = vec![(
            YEAR_COLUMN.to_string(),
            table
                .year_values()
                .into_iter()
                .map(|y| y.map(f64::from))
                .collect::<Vec<_>>(),
        )];
        columns.extend(labels.iter().map(|l| (l.clone(), table.values(l))));
        let correlation = StatsCalculator::correlation_matrix(&columns);

        let (filtered, scatter) = Self::scatter(table, settings, rng)?;
        let shares = Self::shares(&filtered, &years);

        tracing::debug!(
            rows = table.height(),
            scatter_rows = filtered.height(),
            points = scatter.point_count(),
            "Chart data ready"
        );

        Ok(Self {
            years,
            labels,
            yearly_means,
            boxes,
            correlation,
            scatter,
            shares,
        })
    }

    /// Bin income and card spend, drop rows above the card cap, and jitter.
    ///
    /// Returns the capped table too; the pie charts are computed from it.
    fn scatter<R: Rng>(
        table: &AnalysisTable,
        settings: &ScatterConfig,
        rng: &mut R,
    ) -> Result<(AnalysisTable, ScatterData), AnalysisError> {
        let labels = table.labels();
        let (income_label, card_label) = (&labels[0], &labels[1]);

        let income_bins: Vec<Option<f64>> = table
            .values(income_label)
            .into_iter()
            .map(|v| v.map(|x| bin(x, settings.income_bin)))
            .collect();
        let card_bins: Vec<Option<f64>> = table
            .values(card_label)
            .into_iter()
            .map(|v| v.map(|y| bin(y, settings.card_bin)))
            .collect();

        let keep: Vec<bool> = card_bins
            .iter()
            .map(|c| c.is_some_and(|y| y <= settings.card_cap))
            .collect();
        let filtered = table.retain(&keep)?;

        let mut by_year: Vec<YearPoints> = Vec::new();
        let rows = table.year_values().into_iter().zip(income_bins).zip(card_bins);
        for ((year, x), y) in rows {
            let (Some(year), Some(y)) = (year, y) else {
                continue;
            };
            if y > settings.card_cap {
                continue;
            }
            let jx = jitter(rng, settings.x_jitter);
            let jy = jitter(rng, settings.y_jitter);
            let Some(x) = x.filter(|x| !x.is_nan()) else {
                continue;
            };

            let point = [x + jx, y + jy];
            match by_year.iter_mut().find(|p| p.year == year) {
                Some(entry) => entry.points.push(point),
                None => by_year.push(YearPoints {
                    year,
                    points: vec![point],
                }),
            }
        }
        by_year.sort_by_key(|p| p.year);

        let all: Vec<[f64; 2]> = by_year.iter().flat_map(|p| p.points.iter().copied()).collect();
        let histogram = StatsCalculator::histogram_2d(&all, settings.hist_bins);

        Ok((
            filtered,
            ScatterData {
                by_year,
                histogram,
                x_max: settings.x_max,
                y_max: settings.y_max,
                x_label: income_label.clone(),
                y_label: card_label.clone(),
            },
        ))
    }

    fn shares(table: &AnalysisTable, years: &[i32]) -> Vec<YearShares> {
        years
            .iter()
            .map(|&year| {
                let means: Vec<(String, f64)> = table
                    .labels()
                    .iter()
                    .filter_map(|l| {
                        let values = table.values_for_year(l, year);
                        let mean = StatsCalculator::describe(&values).mean;
                        (mean > 0.0).then(|| (l.clone(), mean))
                    })
                    .collect();

                let total: f64 = means.iter().map(|(_, m)| m).sum();
                let slices = means
                    .into_iter()
                    .map(|(l, m)| (l, 100.0 * m / total))
                    .collect();
                YearShares { year, slices }
            })
            .collect()
    }

    /// Descriptive statistics table printed by `analyze`.
    pub fn summary_table(&self, table: &AnalysisTable) -> String {
        let mut out = format!(
            "{:<24} {:>6} {:>8} {:>14} {:>14} {:>14} {:>14} {:>14}\n",
            "Variable", "Year", "Count", "Mean", "Std", "Min", "Median", "Max"
        );
        for label in &self.labels {
            for &year in &self.years {
                let s = StatsCalculator::describe(&table.values_for_year(label, year));
                out.push_str(&format!(
                    "{:<24} {:>6} {:>8} {:>14.2} {:>14.2} {:>14.2} {:>14.2} {:>14.2}\n",
                    label, year, s.count, s.mean, s.std, s.min, s.median, s.max
                ));
            }
        }
        out
    }
}

/// Lower edge of the bin of width `width` containing `value`.
fn bin(value: f64, width: f64) -> f64 {
    (value / width).floor() * width
}

fn jitter<R: Rng>(rng: &mut R, half_width: f64) -> f64 {
    if half_width > 0.0 {
        rng.random_range(-half_width..half_width)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use polars::prelude::*;

    fn table() -> AnalysisTable {
        let df = df!(
            "YEAR" => [2018i32, 2018, 2018, 2020, 2020, 2023],
            "MM_INCM" => [Some(1500.0), Some(2999.0), None, Some(4200.0), Some(100.0), Some(9000.0)],
            "A_CARD_GRAMT" => [Some(3999.0), Some(500_000.0), Some(100.0), Some(2000.0), None, Some(302_500.0)],
            "CR_NTSL_USE_GRAMT_AVG" => [10.0, 20.0, 30.0, 40.0, 50.0, 60.0],
            "CSADVC_USE_GRAMT_AVG" => [0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        )
        .unwrap();
        AnalysisTable::from_merged(&df, &AnalysisConfig::default()).unwrap()
    }

    fn build() -> ChartData {
        let mut rng = StdRng::seed_from_u64(42);
        ChartData::build_with_rng(&table(), &ScatterConfig::default(), &mut rng).unwrap()
    }

    #[test]
    fn test_bin() {
        assert_eq!(bin(3999.0, 2000.0), 2000.0);
        assert_eq!(bin(2000.0, 2000.0), 2000.0);
        assert_eq!(bin(1999.9, 1000.0), 1000.0);
        assert_eq!(bin(-1.0, 1000.0), -1000.0);
    }

    #[test]
    fn test_chart_kind_order() {
        assert_eq!(ChartKind::ALL.len(), 6);
        assert_eq!(ChartKind::SpendingShare.index(), 5);
        assert!(ChartKind::ALL
            .windows(2)
            .all(|w| w[0].file_stem() < w[1].file_stem()));
    }

    #[test]
    fn test_scatter_respects_cap_and_jitter() {
        let data = build();
        let scatter = &data.scatter;

        // 2018: rows 0 and 2 pass the cap, row 2 has no income.
        // 2020: row 3 passes, row 4 has no card spend. 2023 is above the cap.
        assert_eq!(scatter.point_count(), 2);
        let years: Vec<i32> = scatter.by_year.iter().map(|p| p.year).collect();
        assert_eq!(years, vec![2018, 2020]);

        let [x, y] = scatter.by_year[0].points[0];
        assert!((x - 1000.0).abs() < 400.0);
        assert!((y - 2000.0).abs() < 800.0);
        assert_eq!(scatter.histogram.cells().map(|c| c.4).sum::<u32>(), 2);
    }

    #[test]
    fn test_shares_use_capped_rows_and_sum_to_100() {
        let data = build();
        assert_eq!(data.shares.len(), 3);

        let share_2018 = &data.shares[0];
        assert_eq!(share_2018.year, 2018);
        // CS advance mean is zero, so it has no slice.
        assert_eq!(share_2018.slices.len(), 3);
        let total: f64 = share_2018.slices.iter().map(|(_, p)| p).sum();
        assert!((total - 100.0).abs() < 1e-9);

        // Every 2023 row is above the cap.
        assert!(data.shares[2].slices.is_empty());
    }

    #[test]
    fn test_correlation_includes_year() {
        let data = build();
        assert_eq!(data.correlation.labels[0], "YEAR");
        assert_eq!(data.correlation.labels.len(), 5);
        assert!(data.correlation.get(4, 4).is_nan());
    }

    #[test]
    fn test_boxes_per_year_and_label() {
        let data = build();
        assert_eq!(data.boxes.len(), 3);
        assert_eq!(data.boxes[0].boxes.len(), 4);
        let income_2020 = data.boxes[1].boxes[0].unwrap();
        assert_eq!(income_2020.median, 2150.0);
    }

    #[test]
    fn test_seeded_build_is_reproducible() {
        let settings = ScatterConfig {
            seed: Some(9),
            ..Default::default()
        };
        let a = ChartData::build(&table(), &settings).unwrap();
        let b = ChartData::build(&table(), &settings).unwrap();
        assert_eq!(a.scatter, b.scatter);
    }

    #[test]
    fn test_summary_table_lists_each_year() {
        let data = build();
        let text = data.summary_table(&table());
        assert_eq!(text.lines().count(), 1 + 4 * 3);
    }
}
