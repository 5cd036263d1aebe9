//! Trailing-window statistics over one country's yearly series
//!
//! A series is a year-sorted slice of `(year, value)`. Windows are calendar
//! windows: length `w` at anchor year `y` covers observed years in
//! `[y - w + 1, y]`. Years missing from the panel simply do not contribute.

/// Points of `series[..=anchor]` inside the trailing calendar window
pub fn trailing_window(series: &[(i32, f64)], anchor: usize, years: u32) -> &[(i32, f64)] {
    let end = anchor + 1;
    let anchor_year = series[anchor].0;
    let first_year = anchor_year - years as i32 + 1;
    let start = series[..end].partition_point(|(y, _)| *y < first_year);
    &series[start..end]
}

pub fn mean(points: &[(i32, f64)]) -> Option<f64> {
    if points.is_empty() {
        None
    } else {
        Some(points.iter().map(|(_, v)| v).sum::<f64>() / points.len() as f64)
    }
}

/// Sample standard deviation (n - 1); 0.0 with fewer than two points
pub fn sample_std(points: &[(i32, f64)]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    let m = mean(points).unwrap_or(0.0);
    let ss: f64 = points.iter().map(|(_, v)| (v - m).powi(2)).sum();
    (ss / (points.len() - 1) as f64).sqrt()
}

/// Ordinary least-squares slope of value against calendar year.
///
/// Returns 0.0 with fewer than two points or no spread in years.
pub fn ols_slope(points: &[(i32, f64)]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    let n = points.len() as f64;
    let x_mean = points.iter().map(|(y, _)| *y as f64).sum::<f64>() / n;
    let y_mean = points.iter().map(|(_, v)| v).sum::<f64>() / n;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for (year, value) in points {
        let dx = *year as f64 - x_mean;
        sxy += dx * (value - y_mean);
        sxx += dx * dx;
    }
    if sxx <= 0.0 {
        0.0
    } else {
        sxy / sxx
    }
}

/// Mean of values strictly before `series[anchor]`, falling back to the
/// anchor's own value when there is no prior year
pub fn prior_mean(series: &[(i32, f64)], anchor: usize) -> f64 {
    mean(&series[..anchor]).unwrap_or(series[anchor].1)
}

/// Value of the calendar year before the anchor, if observed
pub fn previous_year(series: &[(i32, f64)], anchor: usize) -> Option<f64> {
    let target = series[anchor].0 - 1;
    anchor
        .checked_sub(1)
        .map(|i| series[i])
        .filter(|(year, _)| *year == target)
        .map(|(_, value)| value)
}
