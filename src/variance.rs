use crate::report::ReportRow;

/// Absolute delta between a realized value and a reference, absent when
/// either side is absent.
pub fn delta(actual: Option<f64>, reference: Option<f64>) -> Option<f64> {
    match (actual, reference) {
        (Some(actual), Some(reference)) => Some(actual - reference),
        _ => None,
    }
}

/// Percentage delta relative to the reference, absent when the delta is
/// absent or the reference is not strictly positive.
pub fn delta_percent(delta: Option<f64>, reference: Option<f64>) -> Option<f64> {
    match (delta, reference) {
        (Some(delta), Some(reference)) if reference > 0.0 => Some(delta / reference * 100.0),
        _ => None,
    }
}

/// Fills the variance fields of every row: actual vs predicted and actual vs
/// required, absolute and percentage. Pure derived figures, no side effects.
pub fn annotate(rows: Vec<ReportRow>) -> Vec<ReportRow> {
    rows.into_iter()
        .map(|mut row| {
            row.delta_vs_predicted = delta(row.actual, row.predicted);
            row.delta_percent_vs_predicted = delta_percent(row.delta_vs_predicted, row.predicted);
            row.delta_vs_required = delta(row.actual, Some(row.required));
            row.delta_percent_vs_required =
                delta_percent(row.delta_vs_required, Some(row.required));
            row
        })
        .collect()
}
