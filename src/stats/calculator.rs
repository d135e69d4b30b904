//! Statistics Calculator Module
//! Descriptive statistics, box-plot summaries, correlation and 2-D histograms.

use rayon::prelude::*;
use statrs::statistics::Statistics;

/// Whisker reach in multiples of the interquartile range.
pub const WHISKER_IQR: f64 = 1.5;

/// Descriptive statistics for one set of values.
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptiveStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub p95: f64,
    pub p05: f64,
}

impl Default for DescriptiveStats {
    fn default() -> Self {
        Self {
            count: 0,
            mean: f64::NAN,
            median: f64::NAN,
            std: f64::NAN,
            min: f64::NAN,
            max: f64::NAN,
            p95: f64::NAN,
            p05: f64::NAN,
        }
    }
}

/// Five-number summary drawn by a box plot, outliers excluded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxSummary {
    pub whisker_low: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub whisker_high: f64,
}

/// Symmetric correlation matrix over named columns.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub labels: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values
            .get(row)
            .and_then(|r| r.get(col))
            .copied()
            .unwrap_or(f64::NAN)
    }
}

/// Bin counts over a rectangular range.
///
/// `counts[i][j]` is the number of points in x bin `i` and y bin `j`.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram2d {
    pub x_edges: Vec<f64>,
    pub y_edges: Vec<f64>,
    pub counts: Vec<Vec<u32>>,
}

impl Histogram2d {
    pub fn max_count(&self) -> u32 {
        self.counts
            .iter()
            .flat_map(|row| row.iter().copied())
            .max()
            .unwrap_or(0)
    }

    /// Non-empty cells as `(x0, x1, y0, y1, count)`.
    pub fn cells(&self) -> impl Iterator<Item = (f64, f64, f64, f64, u32)> + '_ {
        self.counts.iter().enumerate().flat_map(move |(i, row)| {
            row.iter().enumerate().filter_map(move |(j, &count)| {
                (count > 0).then(|| {
                    (
                        self.x_edges[i],
                        self.x_edges[i + 1],
                        self.y_edges[j],
                        self.y_edges[j + 1],
                        count,
                    )
                })
            })
        })
    }
}

/// Handles statistical calculations.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Compute descriptive statistics for an array of values.
    pub fn describe(values: &[f64]) -> DescriptiveStats {
        let n = values.len();
        if n == 0 {
            return DescriptiveStats::default();
        }

        let sorted = Self::sorted(values);
        let std = if n > 1 { values.std_dev() } else { 0.0 };

        DescriptiveStats {
            count: n,
            mean: values.mean(),
            median: Self::percentile(&sorted, 50.0),
            std,
            min: sorted[0],
            max: sorted[n - 1],
            p95: Self::percentile(&sorted, 95.0),
            p05: Self::percentile(&sorted, 5.0),
        }
    }

    fn sorted(values: &[f64]) -> Vec<f64> {
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        sorted
    }

    /// Calculate percentile using linear interpolation (NumPy compatible).
    pub fn percentile(sorted_values: &[f64], p: f64) -> f64 {
        let n = sorted_values.len();
        if n == 0 {
            return f64::NAN;
        }
        if n == 1 {
            return sorted_values[0];
        }

        let rank = (p / 100.0) * (n - 1) as f64;
        let lower = rank.floor() as usize;
        let upper = (rank.ceil() as usize).min(n - 1);
        let frac = rank - lower as f64;

        if lower == upper {
            sorted_values[lower]
        } else {
            sorted_values[lower] * (1.0 - frac) + sorted_values[upper] * frac
        }
    }

    /// Box-plot summary with whiskers at the most extreme points within
    /// 1.5 IQR of the box.
    pub fn box_summary(values: &[f64]) -> Option<BoxSummary> {
        if values.is_empty() {
            return None;
        }

        let sorted = Self::sorted(values);
        let q1 = Self::percentile(&sorted, 25.0);
        let median = Self::percentile(&sorted, 50.0);
        let q3 = Self::percentile(&sorted, 75.0);
        let iqr = q3 - q1;

        let low_fence = q1 - WHISKER_IQR * iqr;
        let high_fence = q3 + WHISKER_IQR * iqr;
        let whisker_low = sorted
            .iter()
            .copied()
            .find(|&v| v >= low_fence)
            .unwrap_or(q1)
            .min(q1);
        let whisker_high = sorted
            .iter()
            .rev()
            .copied()
            .find(|&v| v <= high_fence)
            .unwrap_or(q3)
            .max(q3);

        Some(BoxSummary {
            whisker_low,
            q1,
            median,
            q3,
            whisker_high,
        })
    }

    /// Pearson correlation over the rows where both values are present.
    ///
    /// NaN when fewer than two complete pairs exist or either side is constant.
    pub fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> f64 {
        let (x, y): (Vec<f64>, Vec<f64>) = xs
            .iter()
            .zip(ys)
            .filter_map(|(x, y)| match (x, y) {
                (Some(x), Some(y)) if !x.is_nan() && !y.is_nan() => Some((*x, *y)),
                _ => None,
            })
            .unzip();

        if x.len() < 2 {
            return f64::NAN;
        }

        let sx = x.iter().std_dev();
        let sy = y.iter().std_dev();
        if sx == 0.0 || sy == 0.0 {
            return f64::NAN;
        }

        (x.iter().covariance(y.iter()) / (sx * sy)).clamp(-1.0, 1.0)
    }

    /// Pairwise correlation matrix over named columns of equal length.
    pub fn correlation_matrix(columns: &[(String, Vec<Option<f64>>)]) -> CorrelationMatrix {
        let n = columns.len();
        let values: Vec<Vec<f64>> = (0..n)
            .into_par_iter()
            .map(|i| {
                (0..n)
                    .map(|j| {
                        let r = Self::pearson(&columns[i].1, &columns[j].1);
                        if i == j && !r.is_nan() {
                            1.0
                        } else {
                            r
                        }
                    })
                    .collect::<Vec<f64>>()
            })
            .collect();

        CorrelationMatrix {
            labels: columns.iter().map(|(name, _)| name.clone()).collect(),
            values,
        }
    }

    /// Count points into `bins.0 x bins.1` equal-width cells spanning the
    /// points' bounding box. The last bin on each axis includes its right edge.
    pub fn histogram_2d(points: &[[f64; 2]], bins: (usize, usize)) -> Histogram2d {
        let (nx, ny) = (bins.0.max(1), bins.1.max(1));
        let x_edges = Self::edges(points.iter().map(|p| p[0]), nx);
        let y_edges = Self::edges(points.iter().map(|p| p[1]), ny);
        let mut counts = vec![vec![0u32; ny]; nx];

        for p in points {
            if let (Some(i), Some(j)) = (Self::bin_of(p[0], &x_edges), Self::bin_of(p[1], &y_edges)) {
                counts[i][j] += 1;
            }
        }

        Histogram2d {
            x_edges,
            y_edges,
            counts,
        }
    }

    fn edges(values: impl Iterator<Item = f64>, bins: usize) -> Vec<f64> {
        let (mut lo, mut hi) = values
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        if lo > hi {
            (lo, hi) = (0.0, 1.0);
        } else if lo == hi {
            lo -= 0.5;
            hi += 0.5;
        }

        let step = (hi - lo) / bins as f64;
        (0..=bins)
            .map(|k| if k == bins { hi } else { lo + step * k as f64 })
            .collect()
    }

    fn bin_of(value: f64, edges: &[f64]) -> Option<usize> {
        let bins = edges.len().checked_sub(1)?;
        let (lo, hi) = (edges[0], edges[bins]);
        if !value.is_finite() || value < lo || value > hi {
            return None;
        }
        let idx = ((value - lo) / (hi - lo) * bins as f64).floor() as usize;
        Some(idx.min(bins - 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile_linear() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(StatsCalculator::percentile(&sorted, 50.0), 2.5);
        assert_eq!(StatsCalculator::percentile(&sorted, 25.0), 1.75);
        assert_eq!(StatsCalculator::percentile(&sorted, 100.0), 4.0);
        assert!(StatsCalculator::percentile(&[], 50.0).is_nan());
    }

    #[test]
    fn test_describe() {
        let stats = StatsCalculator::describe(&[4.0, 1.0, 3.0, 2.0]);
        assert_eq!(stats.count, 4);
        assert_eq!(stats.mean, 2.5);
        assert_eq!(stats.median, 2.5);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 4.0);
        assert!((stats.std - 1.2909944487358056).abs() < 1e-12);
    }

    #[test]
    fn test_describe_empty_and_single() {
        assert!(StatsCalculator::describe(&[]).mean.is_nan());
        let single = StatsCalculator::describe(&[7.0]);
        assert_eq!(single.std, 0.0);
        assert_eq!(single.median, 7.0);
    }

    #[test]
    fn test_box_summary_excludes_outlier() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 100.0];
        let b = StatsCalculator::box_summary(&values).unwrap();
        assert_eq!(b.q1, 2.25);
        assert_eq!(b.median, 3.5);
        assert_eq!(b.q3, 4.75);
        assert_eq!(b.whisker_low, 1.0);
        assert_eq!(b.whisker_high, 5.0);
        assert!(StatsCalculator::box_summary(&[]).is_none());
    }

    #[test]
    fn test_pearson_ignores_incomplete_pairs() {
        let xs = [Some(1.0), Some(2.0), None, Some(3.0), Some(4.0)];
        let ys = [Some(2.0), Some(4.0), Some(100.0), None, Some(8.0)];
        let r = StatsCalculator::pearson(&xs, &ys);
        assert!((r - 1.0).abs() < 1e-12);

        let neg = StatsCalculator::pearson(
            &[Some(1.0), Some(2.0), Some(3.0)],
            &[Some(3.0), Some(2.0), Some(1.0)],
        );
        assert!((neg + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_degenerate() {
        assert!(StatsCalculator::pearson(&[Some(1.0)], &[Some(2.0)]).is_nan());
        assert!(
            StatsCalculator::pearson(&[Some(1.0), Some(1.0)], &[Some(2.0), Some(3.0)]).is_nan()
        );
    }

    #[test]
    fn test_correlation_matrix_symmetric_unit_diagonal() {
        let columns = vec![
            ("a".to_string(), vec![Some(1.0), Some(2.0), Some(3.0), Some(5.0)]),
            ("b".to_string(), vec![Some(2.0), Some(1.0), Some(4.0), Some(3.0)]),
            ("c".to_string(), vec![Some(9.0), None, Some(7.0), Some(1.0)]),
        ];
        let m = StatsCalculator::correlation_matrix(&columns);

        assert_eq!(m.labels, vec!["a", "b", "c"]);
        for i in 0..3 {
            assert_eq!(m.get(i, i), 1.0);
            for j in 0..3 {
                assert!((m.get(i, j) - m.get(j, i)).abs() < 1e-12);
            }
        }
        assert!(m.get(5, 0).is_nan());
    }

    #[test]
    fn test_histogram_2d_counts() {
        let points = [[0.0, 0.0], [0.1, 0.1], [1.0, 1.0], [0.6, 0.2]];
        let h = StatsCalculator::histogram_2d(&points, (2, 2));

        assert_eq!(h.x_edges, vec![0.0, 0.5, 1.0]);
        assert_eq!(h.counts[0][0], 2);
        assert_eq!(h.counts[1][0], 1);
        assert_eq!(h.counts[1][1], 1);
        assert_eq!(h.max_count(), 2);
        assert_eq!(h.cells().count(), 3);
    }

    #[test]
    fn test_histogram_2d_single_point() {
        let h = StatsCalculator::histogram_2d(&[[5.0, 5.0]], (3, 3));
        assert_eq!(h.max_count(), 1);
        assert_eq!(h.cells().count(), 1);
    }
}
