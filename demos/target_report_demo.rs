use anyhow::{Context, Result};
use chrono::NaiveDate;
use revenue_target_engine::{
    compute_target_report, DateMode, ReportGranularity, RevenueRecord, StoreFilter, TargetConfig,
};
use std::collections::BTreeMap;

const REVENUE_CSV: &str = "\
date,store_id,total_revenue
2024-01-01,downtown,1380.50
2024-01-01,harbour,940.00
2024-01-02,downtown,1105.25
2024-01-02,harbour,720.80
2024-01-03,downtown,1190.00
2024-01-03,harbour,801.10
2024-01-04,downtown,1254.75
2024-01-04,harbour,845.00
2024-01-05,downtown,1640.30
2024-01-05,harbour,1210.45
2024-01-06,downtown,1980.00
2024-01-06,harbour,1505.60
2024-01-07,downtown,1755.20
2024-01-07,harbour,1322.90
2024-01-08,downtown,1402.10
2024-01-08,harbour,955.35
2024-01-09,downtown,1150.00
2024-01-09,harbour,748.25
2024-01-10,downtown,1233.40
2024-01-10,harbour,812.00
2024-01-11,downtown,1298.60
2024-01-11,harbour,860.75
2024-01-12,downtown,1702.90
2024-01-12,harbour,1255.00
2024-01-13,downtown,2045.15
2024-01-13,harbour,1580.40
2024-01-14,downtown,1810.00
2024-01-14,harbour,1366.20
";

fn load_records(csv_text: &str) -> Result<Vec<RevenueRecord>> {
    let mut reader = csv::Reader::from_reader(csv_text.as_bytes());
    let mut records = Vec::new();

    for row in reader.records() {
        let row = row.context("reading revenue CSV row")?;
        let date = row.get(0).and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok());
        let store_id = row.get(1).unwrap_or_default().to_string();
        let total_revenue: f64 = row
            .get(2)
            .unwrap_or_default()
            .parse()
            .context("parsing total_revenue")?;

        records.push(RevenueRecord {
            date,
            store_id,
            total_revenue,
            channel_breakdown: BTreeMap::new(),
            app_breakdown: BTreeMap::new(),
        });
    }

    Ok(records)
}

fn main() -> Result<()> {
    let records = load_records(REVENUE_CSV)?;

    let config = TargetConfig {
        name: "January, both stores".to_string(),
        target_revenue: Some(80_000.0),
        store_filter: StoreFilter::All,
        channel_filter: None,
        app_filter: None,
        date_mode: DateMode::Range,
        start_date: NaiveDate::from_ymd_opt(2024, 1, 1),
        end_date: NaiveDate::from_ymd_opt(2024, 1, 31),
        historical_days: 14,
        use_ema: false,
        growth_rate_period_days: 14,
    };

    let today = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
    let report = compute_target_report(&records, &config, ReportGranularity::Weekly, today)?;

    println!("Target: {}", report.name);
    println!("  current revenue:     {:>12.2}", report.kpis.current_revenue);
    println!("  predicted remaining: {:>12.2}", report.kpis.predicted_remaining);
    println!("  total projected:     {:>12.2}", report.kpis.total_projected);
    println!(
        "  gap to target:       {:>12.2} ({:.1}%)",
        report.kpis.gap, report.kpis.gap_percent
    );
    println!("  progress:            {:>11.1}%", report.kpis.progress_percent);
    println!("  growth slope:        {:>12.2} / day", report.growth_rate);

    println!("\nWeek        actual     predicted  required");
    for row in &report.rows {
        let fmt = |value: Option<f64>| {
            value
                .map(|v| format!("{:>10.2}", v))
                .unwrap_or_else(|| format!("{:>10}", "-"))
        };
        println!(
            "{}  {}  {}  {:>8.2}",
            row.period_start,
            fmt(row.actual),
            fmt(row.predicted),
            row.required
        );
    }

    Ok(())
}
