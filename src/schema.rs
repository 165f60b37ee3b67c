use crate::error::{Result, TargetEngineError};
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RevenueRecord {
    #[schemars(
        description = "Calendar day the revenue was taken on, in YYYY-MM-DD format. Records without a usable date are skipped during aggregation."
    )]
    pub date: Option<NaiveDate>,

    #[schemars(description = "Identifier of the store/location that produced this record.")]
    pub store_id: String,

    #[schemars(description = "Total revenue for this store on this day, across all channels.")]
    pub total_revenue: f64,

    #[serde(default)]
    #[schemars(
        description = "Revenue split by sales channel (e.g. 'dine_in', 'delivery'). Keys are raw and pass through the channel mapping before filter comparison."
    )]
    pub channel_breakdown: BTreeMap<String, f64>,

    #[serde(default)]
    #[schemars(
        description = "Revenue split by ordering app/platform (e.g. 'glovo', 'ubereats'). Keys are raw and pass through the app mapping before filter comparison."
    )]
    pub app_breakdown: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum StoreFilter {
    #[schemars(description = "Aggregate revenue across every store.")]
    All,

    #[schemars(description = "Restrict aggregation to a single store by its identifier.")]
    Store(String),
}

impl Default for StoreFilter {
    fn default() -> Self {
        Self::All
    }
}

impl StoreFilter {
    pub fn matches(&self, store_id: &str) -> bool {
        match self {
            Self::All => true,
            Self::Store(id) => id == store_id,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum DateMode {
    #[schemars(description = "The target period is the explicit [start_date, end_date] range.")]
    Range,

    #[schemars(
        description = "The target period is always the 30 days starting today (today through today+29). start_date/end_date are ignored."
    )]
    Rolling,
}

impl Default for DateMode {
    fn default() -> Self {
        Self::Range
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum ReportGranularity {
    Daily,
    Weekly,
    Monthly,
}

/// The contributing-revenue dimension, resolved once from the config and
/// dispatched everywhere a record is summed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevenueFilter {
    Total,
    ByChannel(String),
    ByApp(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TargetConfig {
    #[serde(default)]
    #[schemars(description = "Display name for this target (e.g. 'January chain-wide').")]
    pub name: String,

    #[schemars(
        description = "The revenue figure the period must reach. A target without this value is considered not configured and produces no projection."
    )]
    pub target_revenue: Option<f64>,

    #[serde(default)]
    #[schemars(description = "Which stores contribute revenue. Defaults to all stores.")]
    pub store_filter: StoreFilter,

    #[serde(default)]
    #[schemars(
        description = "Restrict contributing revenue to one sales channel (mapped key). Ignored when app_filter is also set."
    )]
    pub channel_filter: Option<String>,

    #[serde(default)]
    #[schemars(
        description = "Restrict contributing revenue to one ordering app (mapped key). Takes precedence over channel_filter when both are set."
    )]
    pub app_filter: Option<String>,

    #[serde(default)]
    #[schemars(description = "Whether the period is an explicit range or a rolling 30-day window.")]
    pub date_mode: DateMode,

    #[serde(default)]
    #[schemars(description = "First day of the period (inclusive). Required in Range mode.")]
    pub start_date: Option<NaiveDate>,

    #[serde(default)]
    #[schemars(description = "Last day of the period (inclusive). Required in Range mode.")]
    pub end_date: Option<NaiveDate>,

    #[serde(default = "default_historical_days")]
    #[schemars(
        description = "How many days of history before today feed the seasonality baselines. Today itself is always excluded."
    )]
    pub historical_days: u32,

    #[serde(default)]
    #[schemars(
        description = "Use an exponential moving average (alpha 0.2) instead of the arithmetic mean for the weekday baselines. Weights recent weeks more heavily."
    )]
    pub use_ema: bool,

    #[serde(default)]
    #[schemars(
        description = "How many days of history feed the linear growth estimate. 0 disables the trend adjustment entirely."
    )]
    pub growth_rate_period_days: u32,
}

fn default_historical_days() -> u32 {
    90
}

impl TargetConfig {
    /// The configured target figure, or the not-configured precondition error.
    pub fn target(&self) -> Result<f64> {
        self.target_revenue.ok_or_else(|| {
            TargetEngineError::NotConfigured("target_revenue is not set".to_string())
        })
    }

    /// Resolves the channel/app filters into a single dispatchable variant.
    /// App takes precedence when both are set.
    pub fn revenue_filter(&self) -> RevenueFilter {
        if let Some(app) = &self.app_filter {
            RevenueFilter::ByApp(app.clone())
        } else if let Some(channel) = &self.channel_filter {
            RevenueFilter::ByChannel(channel.clone())
        } else {
            RevenueFilter::Total
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(TargetConfig)
    }

    pub fn schema_as_json() -> Result<String> {
        Ok(serde_json::to_string_pretty(&Self::generate_json_schema())?)
    }
}

/// Rename dictionaries translating raw breakdown keys (e.g. "glovo",
/// "delivery") to their canonical names before filter comparison.
/// A key with no entry maps to itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct KeyMappings {
    #[serde(default)]
    #[schemars(description = "Raw channel key -> canonical channel name.")]
    pub channel: BTreeMap<String, String>,

    #[serde(default)]
    #[schemars(description = "Raw app key -> canonical app name.")]
    pub app: BTreeMap<String, String>,
}

impl KeyMappings {
    pub fn map_channel<'a>(&'a self, raw: &'a str) -> &'a str {
        self.channel.get(raw).map(String::as_str).unwrap_or(raw)
    }

    pub fn map_app<'a>(&'a self, raw: &'a str) -> &'a str {
        self.app.get(raw).map(String::as_str).unwrap_or(raw)
    }
}

/// Previously computed per-day figures for days that have since elapsed.
/// Once a day is past, these are treated as immutable history and are never
/// recomputed.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema)]
pub struct FrozenDay {
    #[schemars(description = "The prediction stored for this day before it elapsed.")]
    pub predicted: Option<f64>,

    #[schemars(description = "The required revenue stored for this day before it elapsed.")]
    pub required: Option<f64>,
}

pub type FrozenSnapshot = BTreeMap<NaiveDate, FrozenDay>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_generation() {
        let schema_json = TargetConfig::schema_as_json().unwrap();
        assert!(schema_json.contains("target_revenue"));
        assert!(schema_json.contains("historical_days"));
        assert!(schema_json.contains("growth_rate_period_days"));
    }

    #[test]
    fn test_config_round_trip_and_defaults() {
        let json = r#"{
            "name": "January chain-wide",
            "target_revenue": 30000.0,
            "date_mode": "Range",
            "start_date": "2024-01-01",
            "end_date": "2024-01-31"
        }"#;

        let config = TargetConfig::from_json(json).unwrap();
        assert_eq!(config.historical_days, 90);
        assert_eq!(config.growth_rate_period_days, 0);
        assert!(!config.use_ema);
        assert_eq!(config.store_filter, StoreFilter::All);

        let round_tripped = TargetConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(round_tripped.target_revenue, Some(30000.0));
        assert_eq!(round_tripped.name, "January chain-wide");
    }

    #[test]
    fn test_missing_target_is_not_configured() {
        let config = TargetConfig::from_json(r#"{ "target_revenue": null }"#).unwrap();
        assert!(matches!(
            config.target(),
            Err(TargetEngineError::NotConfigured(_))
        ));
    }

    #[test]
    fn test_app_filter_takes_precedence() {
        let mut config = TargetConfig::from_json(r#"{ "target_revenue": 1.0 }"#).unwrap();
        assert_eq!(config.revenue_filter(), RevenueFilter::Total);

        config.channel_filter = Some("Delivery".to_string());
        assert_eq!(
            config.revenue_filter(),
            RevenueFilter::ByChannel("Delivery".to_string())
        );

        config.app_filter = Some("Glovo".to_string());
        assert_eq!(
            config.revenue_filter(),
            RevenueFilter::ByApp("Glovo".to_string())
        );
    }

    #[test]
    fn test_key_mappings_identity_fallback() {
        let mut mappings = KeyMappings::default();
        mappings.channel.insert("dlv".to_string(), "Delivery".to_string());

        assert_eq!(mappings.map_channel("dlv"), "Delivery");
        assert_eq!(mappings.map_channel("dine_in"), "dine_in");
        assert_eq!(mappings.map_app("glovo"), "glovo");
    }
}
