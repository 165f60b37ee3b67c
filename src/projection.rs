use crate::aggregate::DailyTotals;
use crate::error::{Result, TargetEngineError};
use crate::schema::{DateMode, TargetConfig};
use crate::seasonality::SeasonalityProfile;
use crate::utils::days_inclusive;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Length of the active window in rolling date mode: today through today+29.
pub const ROLLING_WINDOW_DAYS: u64 = 30;

/// The resolved target period and its split around the injected `today`.
///
/// `days_passed` counts period days that have fully elapsed; today itself is
/// still open and belongs to the remaining days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodBounds {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub total_days: i64,
    pub days_passed: i64,
    pub days_remaining: i64,
}

impl PeriodBounds {
    pub fn resolve(config: &TargetConfig, today: NaiveDate) -> Result<Self> {
        let (start, end) = match config.date_mode {
            DateMode::Rolling => {
                let end = today
                    .checked_add_days(Days::new(ROLLING_WINDOW_DAYS - 1))
                    .unwrap();
                (today, end)
            }
            DateMode::Range => {
                let start = config.start_date.ok_or_else(|| {
                    TargetEngineError::NotConfigured(
                        "start_date is required in Range mode".to_string(),
                    )
                })?;
                let end = config.end_date.ok_or_else(|| {
                    TargetEngineError::NotConfigured(
                        "end_date is required in Range mode".to_string(),
                    )
                })?;

                if end < start {
                    return Err(TargetEngineError::InvalidDateRange { start, end });
                }

                (start, end)
            }
        };

        let total_days = days_inclusive(start, end);
        let days_passed = (today - start).num_days().max(0);
        let days_remaining = (total_days - days_passed).max(0);

        Ok(Self {
            start,
            end,
            total_days,
            days_passed,
            days_remaining,
        })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Combines the seasonal baselines and the growth slope into per-day
/// predictions, per-day requirements, and the period KPI block.
pub struct Projector<'a> {
    profile: &'a SeasonalityProfile,
    slope: f64,
    bounds: PeriodBounds,
    target: f64,
    today: NaiveDate,
    total_weight: f64,
}

impl<'a> Projector<'a> {
    pub fn new(
        profile: &'a SeasonalityProfile,
        slope: f64,
        bounds: PeriodBounds,
        target: f64,
        today: NaiveDate,
    ) -> Self {
        let total_weight = profile.total_weight_over(bounds.start, bounds.end);
        Self {
            profile,
            slope,
            bounds,
            target,
            today,
            total_weight,
        }
    }

    pub fn bounds(&self) -> &PeriodBounds {
        &self.bounds
    }

    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    /// Predicted revenue for a day on or after today.
    ///
    /// The growth adjustment is anchored to the day's absolute offset from
    /// the period start (`days_passed + offset_from_today`), so a positive
    /// slope compounds over the whole period rather than restarting at today.
    pub fn predicted_for(&self, date: NaiveDate) -> f64 {
        let offset_from_today = (date - self.today).num_days();
        let anchor = self.bounds.days_passed + offset_from_today;
        self.profile.baseline_for(date) + self.slope * anchor as f64
    }

    /// Revenue the given period day must produce for the period to hit the
    /// target exactly, proportional to the day's seasonality weight. Falls
    /// back to an equal split when no seasonality data exists.
    pub fn required_for(&self, date: NaiveDate) -> f64 {
        if self.total_weight > 0.0 {
            self.target * self.profile.baseline_for(date) / self.total_weight
        } else if self.bounds.total_days > 0 {
            self.target / self.bounds.total_days as f64
        } else {
            0.0
        }
    }

    /// Sum of the predicted values for every remaining day, today included.
    pub fn predicted_remaining(&self) -> f64 {
        (0..self.bounds.days_remaining)
            .map(|offset| {
                let date = self.today.checked_add_days(Days::new(offset as u64)).unwrap();
                self.predicted_for(date)
            })
            .sum()
    }

    pub fn kpis(&self, current_revenue: f64) -> TargetKpis {
        let predicted_remaining = self.predicted_remaining();
        let total_projected = current_revenue + predicted_remaining;
        let gap = self.target - total_projected;

        let (gap_percent, progress_percent) = if self.target == 0.0 {
            (0.0, 0.0)
        } else {
            (
                gap / self.target * 100.0,
                current_revenue / self.target * 100.0,
            )
        };

        TargetKpis {
            current_revenue,
            predicted_remaining,
            total_projected,
            gap,
            gap_percent,
            progress_percent,
        }
    }
}

/// Sum of the realized daily totals over the period days that have elapsed.
pub fn current_revenue(totals: &DailyTotals, bounds: &PeriodBounds, today: NaiveDate) -> f64 {
    totals
        .range(bounds.start..=bounds.end)
        .filter(|(date, _)| **date < today)
        .map(|(_, value)| value)
        .sum()
}

/// Headline figures for the target card.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetKpis {
    pub current_revenue: f64,
    pub predicted_remaining: f64,
    pub total_projected: f64,
    pub gap: f64,
    pub gap_percent: f64,
    pub progress_percent: f64,
}
