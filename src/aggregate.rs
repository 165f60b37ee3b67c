use crate::schema::{KeyMappings, RevenueFilter, RevenueRecord, StoreFilter};
use chrono::{Days, NaiveDate};
use std::collections::BTreeMap;

/// One summed revenue figure per calendar day. Days with no matching records
/// are absent and treated as zero downstream.
pub type DailyTotals = BTreeMap<NaiveDate, f64>;

/// The contributing revenue of a single record under the configured filter.
///
/// Breakdown keys pass through the rename mappings before comparison, so a
/// raw `"glovo"` entry matches a `ByApp("Glovo")` filter when the mapping
/// says so.
pub fn resolve_revenue(
    record: &RevenueRecord,
    filter: &RevenueFilter,
    mappings: &KeyMappings,
) -> f64 {
    match filter {
        RevenueFilter::Total => record.total_revenue,
        RevenueFilter::ByChannel(key) => record
            .channel_breakdown
            .iter()
            .filter(|(raw, _)| mappings.map_channel(raw) == key)
            .map(|(_, value)| value)
            .sum(),
        RevenueFilter::ByApp(key) => record
            .app_breakdown
            .iter()
            .filter(|(raw, _)| mappings.map_app(raw) == key)
            .map(|(_, value)| value)
            .sum(),
    }
}

/// Sums matching records into a date-keyed map over `[from, to]` inclusive.
///
/// Records without a date are skipped silently. Multiple records on the same
/// date (one per store) are summed, never overwritten.
pub fn daily_totals(
    records: &[RevenueRecord],
    from: NaiveDate,
    to: NaiveDate,
    store_filter: &StoreFilter,
    filter: &RevenueFilter,
    mappings: &KeyMappings,
) -> DailyTotals {
    let mut totals = DailyTotals::new();

    for record in records {
        let date = match record.date {
            Some(date) => date,
            None => continue,
        };

        if date < from || date > to {
            continue;
        }

        if !store_filter.matches(&record.store_id) {
            continue;
        }

        *totals.entry(date).or_insert(0.0) += resolve_revenue(record, filter, mappings);
    }

    totals
}

/// Restricts a totals map to the half-open window `[end - days, end)`.
/// The end day itself is excluded so a partially elapsed day never feeds
/// the estimators.
pub fn trailing_window(totals: &DailyTotals, end: NaiveDate, days: u32) -> DailyTotals {
    if days == 0 {
        return DailyTotals::new();
    }

    let start = end
        .checked_sub_days(Days::new(days as u64))
        .unwrap_or(NaiveDate::MIN);

    totals
        .range(start..end)
        .map(|(date, value)| (*date, *value))
        .collect()
}
