//! Anomaly thresholds
//!
//! All thresholds are configurable; the defaults are the calibrated values
//! the guard ships with.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{AnomalyError, AnomalyResult};

/// Longest accepted recent-activity window (one year)
pub const MAX_WINDOW_HOURS: i64 = 24 * 366;

/// Longest accepted baseline (ten years)
pub const MAX_BASELINE_DAYS: i64 = 3660;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyThresholds {
    /// Transfers in the window above which activity is flagged
    #[serde(default = "default_max_tx_count")]
    pub max_tx_count: u64,

    /// Window volume as a multiple of the average daily volume
    #[serde(default = "default_volume_spike_multiplier")]
    pub volume_spike_multiplier: Decimal,

    /// Window average price as a fraction of the baseline average price
    #[serde(default = "default_price_drop_ratio")]
    pub price_drop_ratio: Decimal,

    /// Single transfer as a fraction of total token supply
    #[serde(default = "default_whale_supply_fraction")]
    pub whale_supply_fraction: Decimal,

    /// Length of the recent-activity window
    #[serde(default = "default_window_hours")]
    pub window_hours: i64,

    /// Length of the historical baseline
    #[serde(default = "default_baseline_days")]
    pub baseline_days: i64,
}

fn default_max_tx_count() -> u64 {
    100
}

fn default_volume_spike_multiplier() -> Decimal {
    Decimal::new(5, 0)
}

fn default_price_drop_ratio() -> Decimal {
    Decimal::new(7, 1) // 0.7
}

fn default_whale_supply_fraction() -> Decimal {
    Decimal::new(1, 1) // 0.1
}

fn default_window_hours() -> i64 {
    24
}

fn default_baseline_days() -> i64 {
    30
}

impl Default for AnomalyThresholds {
    fn default() -> Self {
        Self {
            max_tx_count: default_max_tx_count(),
            volume_spike_multiplier: default_volume_spike_multiplier(),
            price_drop_ratio: default_price_drop_ratio(),
            whale_supply_fraction: default_whale_supply_fraction(),
            window_hours: default_window_hours(),
            baseline_days: default_baseline_days(),
        }
    }
}

impl AnomalyThresholds {
    /// Reject thresholds that would disable a condition or overflow date math
    pub fn validate(&self) -> AnomalyResult<()> {
        if !(1..=MAX_WINDOW_HOURS).contains(&self.window_hours) {
            return Err(AnomalyError::InvalidData(format!(
                "window of {}h outside 1..={}h",
                self.window_hours, MAX_WINDOW_HOURS
            )));
        }
        if !(1..=MAX_BASELINE_DAYS).contains(&self.baseline_days) {
            return Err(AnomalyError::InvalidData(format!(
                "baseline of {} days outside 1..={} days",
                self.baseline_days, MAX_BASELINE_DAYS
            )));
        }
        if self.volume_spike_multiplier <= Decimal::ZERO {
            return Err(AnomalyError::InvalidData("volume spike multiplier must be positive".to_string()));
        }
        for (name, fraction) in [
            ("price drop ratio", self.price_drop_ratio),
            ("whale supply fraction", self.whale_supply_fraction),
        ] {
            if fraction <= Decimal::ZERO || fraction > Decimal::ONE {
                return Err(AnomalyError::InvalidData(format!("{} {} outside (0, 1]", name, fraction)));
            }
        }
        Ok(())
    }

    /// Start of the recent-activity window ending at `now`
    pub fn window_start(&self, now: DateTime<Utc>) -> AnomalyResult<DateTime<Utc>> {
        Duration::try_hours(self.window_hours)
            .and_then(|span| now.checked_sub_signed(span))
            .ok_or_else(|| AnomalyError::InvalidData(format!("window of {}h out of range", self.window_hours)))
    }
}

/// Start of a baseline of `days` days ending at `until`
pub fn baseline_start(until: DateTime<Utc>, days: i64) -> AnomalyResult<DateTime<Utc>> {
    Duration::try_days(days)
        .and_then(|span| until.checked_sub_signed(span))
        .ok_or_else(|| AnomalyError::InvalidData(format!("baseline of {} days out of range", days)))
}
