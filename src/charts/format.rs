//! Axis and annotation text helpers.

/// Round to an integer and group thousands with commas: `1234567.8` → `1,234,568`.
pub fn thousands(value: f64) -> String {
    if !value.is_finite() {
        return String::from("-");
    }

    let rounded = value.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Year label for an axis tick, or empty when the tick is not one of `years`.
pub fn year_tick(value: f64, years: &[i32]) -> String {
    let rounded = value.round();
    if (value - rounded).abs() > 1e-6 {
        return String::new();
    }
    let year = rounded as i32;
    if years.contains(&year) {
        year.to_string()
    } else {
        String::new()
    }
}

/// Year label for a tick on an axis indexed by year position.
pub fn index_tick(value: f64, years: &[i32]) -> String {
    let rounded = value.round();
    if (value - rounded).abs() > 1e-6 || rounded < 0.0 {
        return String::new();
    }
    years
        .get(rounded as usize)
        .map(|y| y.to_string())
        .unwrap_or_default()
}

/// Centre of series `series` of `count` within the group slot at `group`,
/// where the whole group spans `width` on an index axis.
pub fn group_offset(group: usize, series: usize, count: usize, width: f64) -> f64 {
    let slot = width / count.max(1) as f64;
    group as f64 - width / 2.0 + slot * (series as f64 + 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thousands() {
        assert_eq!(thousands(0.0), "0");
        assert_eq!(thousands(999.0), "999");
        assert_eq!(thousands(1000.0), "1,000");
        assert_eq!(thousands(340_000.0), "340,000");
        assert_eq!(thousands(1_234_567.8), "1,234,568");
        assert_eq!(thousands(-2500.0), "-2,500");
        assert_eq!(thousands(f64::NAN), "-");
    }

    #[test]
    fn test_year_tick() {
        let years = [2018, 2020, 2023];
        assert_eq!(year_tick(2018.0, &years), "2018");
        assert_eq!(year_tick(2019.0, &years), "");
        assert_eq!(year_tick(2020.5, &years), "");
    }

    #[test]
    fn test_index_tick() {
        let years = [2018, 2020, 2023];
        assert_eq!(index_tick(0.0, &years), "2018");
        assert_eq!(index_tick(2.0, &years), "2023");
        assert_eq!(index_tick(3.0, &years), "");
        assert_eq!(index_tick(-1.0, &years), "");
        assert_eq!(index_tick(0.5, &years), "");
    }

    #[test]
    fn test_group_offset_centres_series() {
        let offsets: Vec<f64> = (0..4).map(|s| group_offset(1, s, 4, 0.8)).collect();
        assert!((offsets[0] - 0.7).abs() < 1e-12);
        assert!((offsets[3] - 1.3).abs() < 1e-12);
        let mean: f64 = offsets.iter().sum::<f64>() / 4.0;
        assert!((mean - 1.0).abs() < 1e-12);
    }
}
