//! # Revenue Target Engine
//!
//! A library for projecting restaurant-chain revenue against a target figure:
//! day-of-week seasonality baselines, a linear growth trend, per-day revenue
//! requirements, and daily/weekly/monthly report rows with variance figures.
//!
//! ## Core Concepts
//!
//! - **Daily totals**: raw per-store revenue records filtered and summed into
//!   one figure per calendar day
//! - **Seasonality baseline**: the "normal" revenue for each weekday, derived
//!   from a trailing historical window (arithmetic mean or EMA)
//! - **Growth slope**: a per-day linear trend fitted by least squares over a
//!   recent window
//! - **Required revenue**: the share of the target each day must produce,
//!   proportional to its seasonality weight
//! - **Frozen days**: past days whose actuals (and previously stored
//!   predictions) are immutable history, never recomputed
//!
//! The engine is a pure computation: `today` is an explicit parameter to
//! every entry point, nothing reads the wall clock, and identical inputs
//! always produce identical reports.
//!
//! ## Example
//!
//! ```rust,ignore
//! use revenue_target_engine::*;
//! use chrono::NaiveDate;
//!
//! let config = TargetConfig {
//!     name: "January chain-wide".to_string(),
//!     target_revenue: Some(30_000.0),
//!     store_filter: StoreFilter::All,
//!     channel_filter: None,
//!     app_filter: None,
//!     date_mode: DateMode::Range,
//!     start_date: NaiveDate::from_ymd_opt(2024, 1, 1),
//!     end_date: NaiveDate::from_ymd_opt(2024, 1, 31),
//!     historical_days: 90,
//!     use_ema: false,
//!     growth_rate_period_days: 14,
//! };
//!
//! let today = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
//! let report = compute_target_report(&records, &config, ReportGranularity::Weekly, today)?;
//! println!("projected {} against target {}", report.kpis.total_projected, 30_000.0);
//! ```

pub mod aggregate;
pub mod error;
pub mod projection;
pub mod report;
pub mod schema;
pub mod seasonality;
pub mod trend;
pub mod utils;
pub mod variance;

pub use aggregate::{daily_totals, resolve_revenue, trailing_window, DailyTotals};
pub use error::{Result, TargetEngineError};
pub use projection::{
    current_revenue, PeriodBounds, Projector, TargetKpis, ROLLING_WINDOW_DAYS,
};
pub use report::{aggregate_rows, daily_rows, verify_rollup, ReportRow};
pub use schema::*;
pub use seasonality::{SeasonalityProfile, EMA_ALPHA};
pub use trend::growth_slope;
pub use utils::*;
pub use variance::{annotate, delta, delta_percent};

use chrono::{Days, NaiveDate};
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// The full output handed to the UI layer: headline KPIs, the estimated
/// seasonality and trend, and the report rows at the requested granularity.
/// No formatting (currency symbols, locale) happens here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetReport {
    pub name: String,
    pub granularity: ReportGranularity,
    pub kpis: TargetKpis,
    pub seasonality: SeasonalityProfile,
    pub growth_rate: f64,
    pub rows: Vec<ReportRow>,
}

impl TargetReport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Stateless engine front end. Holds only the key-rename mappings shared by
/// every computation; each `compute` call is an independent pure transform
/// of its inputs.
#[derive(Debug, Clone, Default)]
pub struct TargetEngine {
    mappings: KeyMappings,
}

impl TargetEngine {
    pub fn new(mappings: KeyMappings) -> Self {
        Self { mappings }
    }

    /// Runs the full pipeline: filter/aggregate, estimate seasonality and
    /// trend, project, roll up, annotate variance.
    ///
    /// Returns the not-configured error when `target_revenue` is unset or
    /// Range mode is missing its bounds; every numeric edge case inside the
    /// pipeline resolves to a defined fallback instead.
    pub fn compute(
        &self,
        records: &[RevenueRecord],
        config: &TargetConfig,
        frozen: Option<&FrozenSnapshot>,
        granularity: ReportGranularity,
        today: NaiveDate,
    ) -> Result<TargetReport> {
        let (report, _, _, _, _) = self.build(records, config, frozen, granularity, today)?;
        Ok(report)
    }

    /// Like [`compute`](Self::compute), then re-checks the report's own
    /// arithmetic: the weekly and monthly rollups must preserve the daily
    /// sums, and the freshly computed daily requirements must exhaust the
    /// target whenever seasonality weight exists. Violations surface as
    /// errors carrying the offending figures.
    pub fn compute_with_verification(
        &self,
        records: &[RevenueRecord],
        config: &TargetConfig,
        frozen: Option<&FrozenSnapshot>,
        granularity: ReportGranularity,
        today: NaiveDate,
        tolerance: f64,
    ) -> Result<TargetReport> {
        let (report, daily, fresh_required_total, target, total_weight) =
            self.build(records, config, frozen, granularity, today)?;

        verify_rollup(&daily, today, tolerance)?;

        if total_weight > 0.0 && (fresh_required_total - target).abs() > tolerance {
            return Err(TargetEngineError::RequiredPartitionViolation {
                target,
                allocated: fresh_required_total,
            });
        }

        Ok(report)
    }

    fn build(
        &self,
        records: &[RevenueRecord],
        config: &TargetConfig,
        frozen: Option<&FrozenSnapshot>,
        granularity: ReportGranularity,
        today: NaiveDate,
    ) -> Result<(TargetReport, Vec<ReportRow>, f64, f64, f64)> {
        let target = config.target()?;
        let bounds = PeriodBounds::resolve(config, today)?;

        info!(
            "Computing target report '{}' for {}..{} ({} of {} days elapsed)",
            config.name,
            bounds.start,
            bounds.end,
            bounds.days_passed.min(bounds.total_days),
            bounds.total_days
        );

        let filter = config.revenue_filter();
        let lookback = config.historical_days.max(config.growth_rate_period_days) as u64;
        let span_start = bounds.start.min(
            today
                .checked_sub_days(Days::new(lookback))
                .unwrap_or(NaiveDate::MIN),
        );
        let span_end = bounds.end.max(today);

        let totals = daily_totals(
            records,
            span_start,
            span_end,
            &config.store_filter,
            &filter,
            &self.mappings,
        );

        let history = trailing_window(&totals, today, config.historical_days);
        let seasonality = SeasonalityProfile::from_history(&history, config.use_ema);

        let growth_window = trailing_window(&totals, today, config.growth_rate_period_days);
        let growth_rate = growth_slope(&growth_window);

        debug!(
            "Weekday baselines {:?}, growth slope {:.4}, {} historical days observed",
            seasonality.baselines,
            growth_rate,
            history.len()
        );

        let projector = Projector::new(&seasonality, growth_rate, bounds, target, today);
        let kpis = projector.kpis(current_revenue(&totals, &bounds, today));

        let daily = daily_rows(&totals, &projector, frozen, today);
        let rows = variance::annotate(aggregate_rows(&daily, granularity, today));

        let fresh_required_total: f64 = dates_in_period(bounds.start, bounds.end)
            .iter()
            .map(|date| projector.required_for(*date))
            .sum();
        let total_weight = projector.total_weight();

        let report = TargetReport {
            name: config.name.clone(),
            granularity,
            kpis,
            seasonality,
            growth_rate,
            rows,
        };

        Ok((report, daily, fresh_required_total, target, total_weight))
    }
}

/// Convenience wrapper over [`TargetEngine::compute`] with identity key
/// mappings and no frozen snapshot.
pub fn compute_target_report(
    records: &[RevenueRecord],
    config: &TargetConfig,
    granularity: ReportGranularity,
    today: NaiveDate,
) -> Result<TargetReport> {
    TargetEngine::default().compute(records, config, None, granularity, today)
}
