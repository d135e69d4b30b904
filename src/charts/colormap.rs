//! Colour palette and continuous colour maps shared by both renderers.

/// RGB triple, converted into the backend's colour type at draw time.
pub type Rgb = (u8, u8, u8);

/// Series colours, one per variable or year.
pub const PALETTE: [Rgb; 10] = [
    (52, 152, 219),  // Blue
    (231, 76, 60),   // Red
    (46, 204, 113),  // Green
    (155, 89, 182),  // Purple
    (243, 156, 18),  // Orange
    (26, 188, 156),  // Teal
    (233, 30, 99),   // Pink
    (0, 188, 212),   // Cyan
    (121, 85, 72),   // Brown
    (96, 125, 139),  // Blue Grey
];

/// Colour for the `idx`-th series.
pub fn series_color(idx: usize) -> Rgb {
    PALETTE[idx % PALETTE.len()]
}

/// Series index of `year` among all analysed years, so a year keeps its
/// colour even when another year has nothing to draw.
pub fn year_color_index(years: &[i32], year: i32) -> usize {
    years.iter().position(|y| *y == year).unwrap_or(0)
}

// Anchor points sampled from matplotlib's "coolwarm" and "Blues" maps.
const COOLWARM: [Rgb; 5] = [
    (59, 76, 192),
    (141, 176, 254),
    (221, 221, 221),
    (244, 154, 123),
    (180, 4, 38),
];

const BLUES: [Rgb; 5] = [
    (247, 251, 255),
    (198, 219, 239),
    (107, 174, 214),
    (33, 113, 181),
    (8, 48, 107),
];

fn interpolate(anchors: &[Rgb], t: f64) -> Rgb {
    let t = if t.is_nan() { 0.5 } else { t.clamp(0.0, 1.0) };
    let segments = (anchors.len() - 1) as f64;
    let pos = t * segments;
    let idx = (pos.floor() as usize).min(anchors.len() - 2);
    let frac = pos - idx as f64;

    let (a, b) = (anchors[idx], anchors[idx + 1]);
    let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * frac).round() as u8;
    (mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
}

/// Diverging map for correlations in `[-1, 1]`; NaN maps to the neutral mid.
pub fn coolwarm(r: f64) -> Rgb {
    interpolate(&COOLWARM, (r + 1.0) / 2.0)
}

/// Sequential map for `t` in `[0, 1]`.
pub fn blues(t: f64) -> Rgb {
    interpolate(&BLUES, t)
}

/// Logarithmic normalisation of a count against the largest count.
///
/// Returns `None` for empty cells, which are left undrawn.
pub fn log_norm(count: u32, max: u32) -> Option<f64> {
    if count == 0 || max == 0 {
        return None;
    }
    if max == 1 {
        return Some(1.0);
    }
    Some((count as f64).ln() / (max as f64).ln())
}

/// Text colour readable on top of `bg`.
pub fn contrast_text(bg: Rgb) -> Rgb {
    let luma = 0.299 * bg.0 as f64 + 0.587 * bg.1 as f64 + 0.114 * bg.2 as f64;
    if luma < 140.0 {
        (255, 255, 255)
    } else {
        (0, 0, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coolwarm_endpoints() {
        assert_eq!(coolwarm(-1.0), COOLWARM[0]);
        assert_eq!(coolwarm(1.0), COOLWARM[4]);
        assert_eq!(coolwarm(0.0), COOLWARM[2]);
        assert_eq!(coolwarm(f64::NAN), COOLWARM[2]);
        assert_eq!(coolwarm(5.0), COOLWARM[4]);
    }

    #[test]
    fn test_blues_monotonic_darkening() {
        let light = blues(0.0);
        let dark = blues(1.0);
        assert!(light.0 > dark.0 && light.2 > dark.2);
    }

    #[test]
    fn test_log_norm() {
        assert_eq!(log_norm(0, 10), None);
        assert_eq!(log_norm(1, 1), Some(1.0));
        assert_eq!(log_norm(1, 10), Some(0.0));
        assert_eq!(log_norm(10, 10), Some(1.0));
    }

    #[test]
    fn test_year_color_index_follows_all_years() {
        let years = [2018, 2020, 2023];
        assert_eq!(year_color_index(&years, 2018), 0);
        assert_eq!(year_color_index(&years, 2023), 2);
        assert_eq!(year_color_index(&years, 1999), 0);
    }

    #[test]
    fn test_contrast_text() {
        assert_eq!(contrast_text((8, 48, 107)), (255, 255, 255));
        assert_eq!(contrast_text((247, 251, 255)), (0, 0, 0));
    }
}
