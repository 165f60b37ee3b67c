use crate::aggregate::DailyTotals;
use crate::utils::{dates_in_period, weekday_index};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Smoothing factor for the exponential moving average baseline.
pub const EMA_ALPHA: f64 = 0.2;

/// One baseline revenue figure per weekday, Sunday = 0 through Saturday = 6.
///
/// Day-of-week bucketing captures weekly demand cycles (weekend spikes) that
/// a flat daily average would wash out. A weekday with no observations in the
/// historical window keeps a baseline of 0.0 so all downstream math stays
/// defined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalityProfile {
    pub baselines: [f64; 7],
}

impl SeasonalityProfile {
    /// Derives weekday baselines from a historical daily-revenue window.
    ///
    /// Simple mode takes the arithmetic mean of each weekday group. EMA mode
    /// seeds with the chronologically earliest value and folds forward with
    /// `avg = EMA_ALPHA * value + (1 - EMA_ALPHA) * avg`, weighting recent
    /// weeks more heavily.
    pub fn from_history(history: &DailyTotals, use_ema: bool) -> Self {
        let mut groups: [Vec<f64>; 7] = Default::default();

        // BTreeMap iteration is chronological, which the EMA fold relies on.
        for (date, value) in history {
            groups[weekday_index(*date)].push(*value);
        }

        let mut baselines = [0.0; 7];
        for (weekday, group) in groups.iter().enumerate() {
            if group.is_empty() {
                continue;
            }
            baselines[weekday] = if use_ema { ema(group) } else { mean(group) };
        }

        Self { baselines }
    }

    pub fn baseline(&self, weekday: usize) -> f64 {
        self.baselines[weekday]
    }

    pub fn baseline_for(&self, date: NaiveDate) -> f64 {
        self.baselines[weekday_index(date)]
    }

    /// The summed seasonality weight of every calendar day in `[start, end]`.
    /// Each occurrence of a weekday counts, so a period with five Mondays
    /// counts the Monday baseline five times.
    pub fn total_weight_over(&self, start: NaiveDate, end: NaiveDate) -> f64 {
        dates_in_period(start, end)
            .iter()
            .map(|date| self.baseline_for(*date))
            .sum()
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn ema(values: &[f64]) -> f64 {
    let mut avg = values[0];
    for value in &values[1..] {
        avg = EMA_ALPHA * value + (1.0 - EMA_ALPHA) * avg;
    }
    avg
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn mondays_history(values: &[f64]) -> DailyTotals {
        // 2024-01-01, 2024-01-08, 2024-01-15, ... are consecutive Mondays
        let mut history = DailyTotals::new();
        for (week, value) in values.iter().enumerate() {
            history.insert(date(2024, 1, 1 + 7 * week as u32), *value);
        }
        history
    }

    #[test]
    fn test_mean_baseline() {
        let history = mondays_history(&[100.0, 200.0, 300.0]);
        let profile = SeasonalityProfile::from_history(&history, false);

        assert!((profile.baseline(1) - 200.0).abs() < 1e-10);
        // Every other weekday has no observations.
        for weekday in [0, 2, 3, 4, 5, 6] {
            assert_eq!(profile.baseline(weekday), 0.0);
        }
    }

    #[test]
    fn test_ema_baseline() {
        let history = mondays_history(&[100.0, 200.0, 300.0]);
        let profile = SeasonalityProfile::from_history(&history, true);

        // 0.2*300 + 0.8*(0.2*200 + 0.8*100) = 156
        assert!((profile.baseline(1) - 156.0).abs() < 1e-10);
    }

    #[test]
    fn test_ema_single_observation_is_the_seed() {
        let history = mondays_history(&[480.0]);
        let profile = SeasonalityProfile::from_history(&history, true);
        assert_eq!(profile.baseline(1), 480.0);
    }

    #[test]
    fn test_empty_history_is_all_zero() {
        let profile = SeasonalityProfile::from_history(&DailyTotals::new(), false);
        assert_eq!(profile.baselines, [0.0; 7]);
    }

    #[test]
    fn test_total_weight_counts_each_occurrence() {
        let mut profile = SeasonalityProfile::from_history(&DailyTotals::new(), false);
        profile.baselines[1] = 1200.0; // Mondays only

        // January 2024 contains five Mondays (1, 8, 15, 22, 29).
        let weight = profile.total_weight_over(date(2024, 1, 1), date(2024, 1, 31));
        assert!((weight - 6000.0).abs() < 1e-10);
    }

    #[test]
    fn test_mixed_weekdays_grouped_independently() {
        let mut history = DailyTotals::new();
        history.insert(date(2024, 1, 1), 100.0); // Monday
        history.insert(date(2024, 1, 2), 40.0); // Tuesday
        history.insert(date(2024, 1, 8), 300.0); // Monday
        history.insert(date(2024, 1, 9), 60.0); // Tuesday

        let profile = SeasonalityProfile::from_history(&history, false);
        assert!((profile.baseline(1) - 200.0).abs() < 1e-10);
        assert!((profile.baseline(2) - 50.0).abs() < 1e-10);
    }
}
