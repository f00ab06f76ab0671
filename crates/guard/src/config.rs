//! Guard configuration
//!
//! Loaded from a JSON file, then overridden from the environment. Every
//! field has a default so a partial file is valid.

use chrono::Duration as ChronoDuration;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use rwaguard_anomaly::{AnomalyThresholds, MAX_BASELINE_DAYS};
use rwaguard_core::TrustPolicies;
use rwaguard_registry::RegistryEndpoint;

use crate::error::{GuardError, GuardResult};

pub const ENV_RPC_URL: &str = "RWAGUARD_RPC_URL";
pub const ENV_POLLING_INTERVAL_SECS: &str = "RWAGUARD_POLLING_INTERVAL_SECS";
pub const ENV_REGISTRIES: &str = "RWAGUARD_REGISTRIES";
pub const ENV_RESERVE_ORACLES: &str = "RWAGUARD_RESERVE_ORACLES";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardConfig {
    // === External Sources ===
    /// JSON-RPC endpoint for on-chain reads
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    /// Jurisdiction -> registry endpoint and credential
    #[serde(default)]
    pub registries: HashMap<String, RegistryEndpoint>,

    /// Asset id -> reserve oracle feed address
    #[serde(default)]
    pub reserve_oracles: HashMap<String, String>,

    // === Timing ===
    #[serde(default = "default_polling_interval_secs")]
    pub polling_interval_secs: u64,

    #[serde(default = "default_registry_timeout_ms")]
    pub registry_timeout_ms: u64,

    #[serde(default = "default_chain_timeout_ms")]
    pub chain_timeout_ms: u64,

    /// Used to turn block deltas into elapsed time
    #[serde(default = "default_avg_block_time_secs")]
    pub avg_block_time_secs: u64,

    /// Window for "recently changed" registry records and control transfers
    #[serde(default = "default_recent_change_days")]
    pub recent_change_days: i64,

    // === Checks ===
    #[serde(default)]
    pub anomaly: AnomalyThresholds,

    #[serde(default)]
    pub trust: TrustPolicies,
}

fn default_rpc_url() -> String {
    "http://127.0.0.1:8545".to_string()
}

fn default_polling_interval_secs() -> u64 {
    3600
}

fn default_registry_timeout_ms() -> u64 {
    15_000
}

fn default_chain_timeout_ms() -> u64 {
    10_000
}

fn default_avg_block_time_secs() -> u64 {
    12
}

fn default_recent_change_days() -> i64 {
    7
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            registries: HashMap::new(),
            reserve_oracles: HashMap::new(),
            polling_interval_secs: default_polling_interval_secs(),
            registry_timeout_ms: default_registry_timeout_ms(),
            chain_timeout_ms: default_chain_timeout_ms(),
            avg_block_time_secs: default_avg_block_time_secs(),
            recent_change_days: default_recent_change_days(),
            anomaly: AnomalyThresholds::default(),
            trust: TrustPolicies::default(),
        }
    }
}

impl GuardConfig {
    /// Load and validate a JSON config file
    pub fn from_file(path: impl AsRef<Path>) -> GuardResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: GuardConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Override from `RWAGUARD_*` environment variables
    pub fn apply_env(&mut self) -> GuardResult<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Override from any key lookup (environment, test maps)
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> GuardResult<()> {
        if let Some(url) = lookup(ENV_RPC_URL) {
            self.rpc_url = url;
        }

        if let Some(raw) = lookup(ENV_POLLING_INTERVAL_SECS) {
            self.polling_interval_secs = raw.trim().parse().map_err(|e| {
                GuardError::Config(format!("{} must be seconds, got {:?}: {}", ENV_POLLING_INTERVAL_SECS, raw, e))
            })?;
        }

        if let Some(raw) = lookup(ENV_REGISTRIES) {
            self.registries = serde_json::from_str(&raw)
                .map_err(|e| GuardError::Config(format!("{} is not a registry map: {}", ENV_REGISTRIES, e)))?;
        }

        if let Some(raw) = lookup(ENV_RESERVE_ORACLES) {
            self.reserve_oracles = serde_json::from_str(&raw).map_err(|e| {
                GuardError::Config(format!("{} is not an address map: {}", ENV_RESERVE_ORACLES, e))
            })?;
        }

        self.validate()
    }

    /// Reject values that would disable a check or overflow its date math
    pub fn validate(&self) -> GuardResult<()> {
        if self.polling_interval_secs == 0 {
            return Err(GuardError::Config("polling interval must be positive".to_string()));
        }
        if !(0..=MAX_BASELINE_DAYS).contains(&self.recent_change_days) {
            return Err(GuardError::Config(format!(
                "recent change window of {} days outside 0..={}",
                self.recent_change_days, MAX_BASELINE_DAYS
            )));
        }
        self.anomaly
            .validate()
            .map_err(|e| GuardError::Config(format!("anomaly thresholds: {}", e)))
    }

    pub fn polling_interval(&self) -> Duration {
        Duration::from_secs(self.polling_interval_secs)
    }

    pub fn registry_timeout(&self) -> Duration {
        Duration::from_millis(self.registry_timeout_ms)
    }

    pub fn chain_timeout(&self) -> Duration {
        Duration::from_millis(self.chain_timeout_ms)
    }

    /// Window for recent registry and control changes
    pub fn recent_change_window(&self) -> ChronoDuration {
        ChronoDuration::days(self.recent_change_days)
    }
}
