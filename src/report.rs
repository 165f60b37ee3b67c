use crate::aggregate::DailyTotals;
use crate::error::{Result, TargetEngineError};
use crate::projection::Projector;
use crate::schema::{FrozenSnapshot, ReportGranularity};
use crate::utils::{dates_in_period, month_start, week_start};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One report line. Daily rows have `period_start == period_end`; aggregated
/// rows label the period with its start (Monday for weeks, the first of the
/// month for months) and sum the underlying daily figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub actual: Option<f64>,
    pub predicted: Option<f64>,
    pub required: f64,
    pub is_past: bool,

    #[serde(default)]
    pub delta_vs_predicted: Option<f64>,
    #[serde(default)]
    pub delta_percent_vs_predicted: Option<f64>,
    #[serde(default)]
    pub delta_vs_required: Option<f64>,
    #[serde(default)]
    pub delta_percent_vs_required: Option<f64>,
}

/// Builds the per-day series for the whole period, applying the freeze rule:
/// a past day reports its realized actual (absent days count as zero) and,
/// when a frozen snapshot covers it, the prediction and requirement stored
/// before the day elapsed. Future days get freshly computed predictions and
/// requirements.
pub fn daily_rows(
    totals: &DailyTotals,
    projector: &Projector,
    frozen: Option<&FrozenSnapshot>,
    today: NaiveDate,
) -> Vec<ReportRow> {
    let bounds = projector.bounds();
    let mut rows = Vec::with_capacity(bounds.total_days as usize);

    for date in dates_in_period(bounds.start, bounds.end) {
        let is_past = date < today;
        let frozen_day = frozen.and_then(|snapshot| snapshot.get(&date));

        let (actual, predicted, required) = if is_past {
            let actual = totals.get(&date).copied().unwrap_or(0.0);
            let predicted = frozen_day.and_then(|day| day.predicted);
            let required = frozen_day
                .and_then(|day| day.required)
                .unwrap_or_else(|| projector.required_for(date));
            (Some(actual), predicted, required)
        } else {
            (
                None,
                Some(projector.predicted_for(date)),
                projector.required_for(date),
            )
        };

        rows.push(ReportRow {
            period_start: date,
            period_end: date,
            actual,
            predicted,
            required,
            is_past,
            delta_vs_predicted: None,
            delta_percent_vs_predicted: None,
            delta_vs_required: None,
            delta_percent_vs_required: None,
        });
    }

    rows
}

struct PeriodBucket {
    last_day: NaiveDate,
    actual_sum: f64,
    has_actual: bool,
    predicted_sum: f64,
    has_predicted: bool,
    required_sum: f64,
}

impl PeriodBucket {
    fn new(last_day: NaiveDate) -> Self {
        Self {
            last_day,
            actual_sum: 0.0,
            has_actual: false,
            predicted_sum: 0.0,
            has_predicted: false,
            required_sum: 0.0,
        }
    }

    fn absorb(&mut self, row: &ReportRow) {
        self.last_day = self.last_day.max(row.period_end);

        if let Some(actual) = row.actual {
            self.actual_sum += actual;
            self.has_actual = true;
        }
        if let Some(predicted) = row.predicted {
            self.predicted_sum += predicted;
            self.has_predicted = true;
        }
        self.required_sum += row.required;
    }
}

/// Rolls the daily series up to the requested granularity.
///
/// Weeks are Monday-anchored (a Sunday closes the week of the previous
/// Monday). A bucket is past once its last contained day is on or before
/// today. Monthly rows report an accumulated actual of exactly zero as
/// absent, the display convention that separates "no data" from a genuinely
/// zero revenue day inside an otherwise open month.
pub fn aggregate_rows(
    daily: &[ReportRow],
    granularity: ReportGranularity,
    today: NaiveDate,
) -> Vec<ReportRow> {
    if granularity == ReportGranularity::Daily {
        return daily.to_vec();
    }

    let mut buckets: BTreeMap<NaiveDate, PeriodBucket> = BTreeMap::new();

    for row in daily {
        let label = match granularity {
            ReportGranularity::Weekly => week_start(row.period_start),
            ReportGranularity::Monthly => month_start(row.period_start),
            ReportGranularity::Daily => unreachable!(),
        };

        buckets
            .entry(label)
            .or_insert_with(|| PeriodBucket::new(row.period_end))
            .absorb(row);
    }

    buckets
        .into_iter()
        .map(|(label, bucket)| {
            let actual = match granularity {
                ReportGranularity::Monthly if bucket.actual_sum == 0.0 => None,
                _ if !bucket.has_actual => None,
                _ => Some(bucket.actual_sum),
            };

            ReportRow {
                period_start: label,
                period_end: bucket.last_day,
                actual,
                predicted: bucket.has_predicted.then_some(bucket.predicted_sum),
                required: bucket.required_sum,
                is_past: bucket.last_day <= today,
                delta_vs_predicted: None,
                delta_percent_vs_predicted: None,
                delta_vs_required: None,
                delta_percent_vs_required: None,
            }
        })
        .collect()
}

/// Checks that the weekly and monthly rollups preserve the daily sums of
/// actual, predicted and required within `tolerance`.
pub fn verify_rollup(daily: &[ReportRow], today: NaiveDate, tolerance: f64) -> Result<()> {
    for granularity in [ReportGranularity::Weekly, ReportGranularity::Monthly] {
        let aggregated = aggregate_rows(daily, granularity, today);
        let label = format!("{:?}", granularity);

        for (field, daily_sum, aggregated_sum) in [
            ("actual", opt_sum(daily, |r| r.actual), opt_sum(&aggregated, |r| r.actual)),
            (
                "predicted",
                opt_sum(daily, |r| r.predicted),
                opt_sum(&aggregated, |r| r.predicted),
            ),
            (
                "required",
                daily.iter().map(|r| r.required).sum::<f64>(),
                aggregated.iter().map(|r| r.required).sum::<f64>(),
            ),
        ] {
            if (daily_sum - aggregated_sum).abs() > tolerance {
                return Err(TargetEngineError::RollupViolation {
                    field,
                    label: label.clone(),
                    daily: daily_sum,
                    aggregated: aggregated_sum,
                });
            }
        }
    }

    Ok(())
}

fn opt_sum(rows: &[ReportRow], field: impl Fn(&ReportRow) -> Option<f64>) -> f64 {
    rows.iter().filter_map(field).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::PeriodBounds;
    use crate::schema::{FrozenDay, TargetConfig};
    use crate::seasonality::SeasonalityProfile;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn january_projector(
        profile: &SeasonalityProfile,
        today: NaiveDate,
        target: f64,
    ) -> Projector<'_> {
        let mut config = TargetConfig::from_json(r#"{ "target_revenue": 1.0 }"#).unwrap();
        config.start_date = Some(date(2024, 1, 1));
        config.end_date = Some(date(2024, 1, 31));
        let bounds = PeriodBounds::resolve(&config, today).unwrap();
        Projector::new(profile, 0.0, bounds, target, today)
    }

    fn flat_profile(value: f64) -> SeasonalityProfile {
        let mut profile = SeasonalityProfile::from_history(&DailyTotals::new(), false);
        profile.baselines = [value; 7];
        profile
    }

    #[test]
    fn test_daily_rows_exactly_one_of_actual_predicted() {
        let today = date(2024, 1, 15);
        let profile = flat_profile(100.0);
        let projector = january_projector(&profile, today, 31000.0);

        let mut totals = DailyTotals::new();
        totals.insert(date(2024, 1, 3), 450.0);

        let rows = daily_rows(&totals, &projector, None, today);
        assert_eq!(rows.len(), 31);

        for row in &rows {
            assert_eq!(row.is_past, row.period_start < today);
            assert_eq!(row.actual.is_some(), row.is_past);
            assert_eq!(row.predicted.is_some(), !row.is_past);
        }

        // A past day with no records reports a zero actual, not an absence.
        assert_eq!(rows[0].actual, Some(0.0));
        assert_eq!(rows[2].actual, Some(450.0));
    }

    #[test]
    fn test_daily_rows_freeze_wins_on_past_days() {
        let today = date(2024, 1, 15);
        let profile = flat_profile(100.0);
        let projector = january_projector(&profile, today, 31000.0);

        let mut frozen = FrozenSnapshot::new();
        frozen.insert(
            date(2024, 1, 10),
            FrozenDay {
                predicted: Some(888.0),
                required: Some(777.0),
            },
        );
        // A frozen entry for a future day must not override the fresh figures.
        frozen.insert(
            date(2024, 1, 20),
            FrozenDay {
                predicted: Some(1.0),
                required: Some(2.0),
            },
        );

        let rows = daily_rows(&DailyTotals::new(), &projector, Some(&frozen), today);

        let jan10 = &rows[9];
        assert_eq!(jan10.predicted, Some(888.0));
        assert!((jan10.required - 777.0).abs() < 1e-10);

        let jan20 = &rows[19];
        assert_eq!(jan20.predicted, Some(100.0));
        assert!((jan20.required - 1000.0).abs() < 1e-10);
    }

    #[test]
    fn test_weekly_rollup_monday_anchored() {
        // A Wednesday, so the third week straddles past and future.
        let today = date(2024, 1, 17);
        let profile = flat_profile(100.0);
        let projector = january_projector(&profile, today, 31000.0);

        let rows = daily_rows(&DailyTotals::new(), &projector, None, today);
        let weekly = aggregate_rows(&rows, ReportGranularity::Weekly, today);

        // January 2024: Jan 1 is a Monday, so weeks start 1, 8, 15, 22, 29.
        assert_eq!(weekly.len(), 5);
        assert_eq!(weekly[0].period_start, date(2024, 1, 1));
        assert_eq!(weekly[0].period_end, date(2024, 1, 7));
        assert_eq!(weekly[4].period_start, date(2024, 1, 29));
        assert_eq!(weekly[4].period_end, date(2024, 1, 31));

        // The week ending Jan 14 has fully elapsed; the week containing
        // today has not.
        assert!(weekly[1].is_past);
        assert!(!weekly[2].is_past);

        // The straddling week carries both sums: actuals for Jan 15-16,
        // predictions for Jan 17-21.
        let straddling = &weekly[2];
        assert!(straddling.actual.is_some());
        assert!(straddling.predicted.is_some());
    }

    #[test]
    fn test_monthly_rollup_zero_actual_reported_absent() {
        let today = date(2024, 2, 10);
        let mut config = TargetConfig::from_json(r#"{ "target_revenue": 1.0 }"#).unwrap();
        config.start_date = Some(date(2024, 1, 1));
        config.end_date = Some(date(2024, 2, 29));
        let bounds = PeriodBounds::resolve(&config, today).unwrap();
        let profile = flat_profile(100.0);
        let projector = Projector::new(&profile, 0.0, bounds, 60000.0, today);

        // No revenue was ever recorded: January's accumulated actual is 0.
        let rows = daily_rows(&DailyTotals::new(), &projector, None, today);
        let monthly = aggregate_rows(&rows, ReportGranularity::Monthly, today);

        assert_eq!(monthly.len(), 2);
        assert_eq!(monthly[0].period_start, date(2024, 1, 1));
        assert_eq!(monthly[0].actual, None);
        assert!(monthly[0].is_past);
        assert!(!monthly[1].is_past);
    }

    #[test]
    fn test_rollup_sums_preserved() {
        let today = date(2024, 1, 15);
        let profile = flat_profile(100.0);
        let projector = january_projector(&profile, today, 31000.0);

        let mut totals = DailyTotals::new();
        totals.insert(date(2024, 1, 2), 120.0);
        totals.insert(date(2024, 1, 9), 340.0);
        totals.insert(date(2024, 1, 14), 95.0);

        let rows = daily_rows(&totals, &projector, None, today);
        assert!(verify_rollup(&rows, today, 1e-9).is_ok());
    }

    #[test]
    fn test_verify_rollup_detects_tampering() {
        let today = date(2024, 1, 15);
        let profile = flat_profile(100.0);
        let projector = january_projector(&profile, today, 31000.0);

        let mut rows = daily_rows(&DailyTotals::new(), &projector, None, today);
        assert!(verify_rollup(&rows, today, 1e-9).is_ok());

        // An impossible tolerance makes even consistent data fail loudly.
        rows[0].actual = Some(123.0);
        let strict = verify_rollup(&rows, today, 1e-9);
        assert!(strict.is_ok(), "sums move together, still consistent");

        let impossible = verify_rollup(&rows, today, -1.0);
        assert!(matches!(
            impossible,
            Err(TargetEngineError::RollupViolation { .. })
        ));
    }
}
