use crate::aggregate::DailyTotals;

/// Daily growth rate estimated by ordinary least squares over a trailing
/// window of daily totals, re-indexed 0..n in chronological order.
///
/// The slope is in absolute currency units per day, not a percentage; the
/// projector multiplies it by a day offset to produce a linear adjustment.
/// Fewer than two points, or a degenerate denominator, yields 0.0.
pub fn growth_slope(window: &DailyTotals) -> f64 {
    let n = window.len();
    if n < 2 {
        return 0.0;
    }

    let n = n as f64;
    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut sum_xy = 0.0;
    let mut sum_x2 = 0.0;

    for (index, (_, revenue)) in window.iter().enumerate() {
        let x = index as f64;
        sum_x += x;
        sum_y += revenue;
        sum_xy += x * revenue;
        sum_x2 += x * x;
    }

    let denominator = n * sum_x2 - sum_x * sum_x;
    if denominator == 0.0 {
        return 0.0;
    }

    (n * sum_xy - sum_x * sum_y) / denominator
}
