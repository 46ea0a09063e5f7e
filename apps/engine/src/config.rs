// [apps/engine/src/config.rs]
//! Environment-sourced configuration for the composition root. One
//! `.env` read, one place that decides defaults — nothing downstream
//! reaches into `std::env` directly.

use std::collections::HashMap;
use std::time::Duration;

use wbe_domain_license::{FeatureValue, LicenseManagerConfig};
use wbe_domain_models::license::{HardwareComponents, LicenseTier};

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_f64(key: &str, default: f64) -> f64 {
    env_var(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_i64(key: &str, default: i64) -> i64 {
    env_var(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    env_var(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

/// Hardware fingerprint acquisition is left to the host environment —
/// there is no portable way to detect `motherboard_hash`/`cpu_hash`/
/// `mac_hash` on a real machine, so the engine reads them as three
/// env vars rather than fabricating a hardware-detection dependency.
pub fn observed_hardware() -> HardwareComponents {
    HardwareComponents {
        motherboard_hash: env_var("HW_MOTHERBOARD_HASH").unwrap_or_else(|| "UNKNOWN_MOTHERBOARD".into()),
        cpu_hash: env_var("HW_CPU_HASH").unwrap_or_else(|| "UNKNOWN_CPU".into()),
        mac_hash: env_var("HW_MAC_HASH").unwrap_or_else(|| "UNKNOWN_MAC".into()),
    }
}

pub struct EngineConfig {
    pub database_url: String,
    pub database_token: Option<String>,
    pub time_series_csv_path: Option<String>,
    pub license: LicenseManagerConfig,
}

impl EngineConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| anyhow::anyhow!("CRITICAL_FAULT: DATABASE_URL undefined in runtime environment."))?;
        let database_token = env_var("TURSO_AUTH_TOKEN");
        let time_series_csv_path = env_var("TIME_SERIES_CSV_PATH");

        let webhook_url = env_var("LICENSE_WEBHOOK_URL").unwrap_or_default();
        let api_key = env_var("LICENSE_API_KEY").unwrap_or_default();
        let request_timeout = Duration::from_secs(env_i64("LICENSE_REQUEST_TIMEOUT_SECONDS", 10) as u64);

        let mut check_intervals_hours = HashMap::new();
        check_intervals_hours.insert(LicenseTier::Trial, env_i64("LICENSING_CHECK_INTERVAL_TRIAL_HOURS", LicenseTier::Trial.default_check_interval_hours()));
        check_intervals_hours.insert(
            LicenseTier::Standard,
            env_i64("LICENSING_CHECK_INTERVAL_STANDARD_HOURS", LicenseTier::Standard.default_check_interval_hours()),
        );
        check_intervals_hours.insert(
            LicenseTier::Premium,
            env_i64("LICENSING_CHECK_INTERVAL_PREMIUM_HOURS", LicenseTier::Premium.default_check_interval_hours()),
        );

        let mut tier_features: HashMap<LicenseTier, HashMap<String, FeatureValue>> = HashMap::new();
        tier_features.insert(
            LicenseTier::Trial,
            HashMap::from([("auto_apply_pump_transfers".to_string(), FeatureValue::Bool(false))]),
        );
        tier_features.insert(
            LicenseTier::Standard,
            HashMap::from([
                ("auto_apply_pump_transfers".to_string(), FeatureValue::Bool(env_var("LICENSING_STANDARD_AUTO_APPLY").map(|v| v == "true").unwrap_or(true))),
                ("auto_apply_pump_transfers_max_monthly".to_string(), FeatureValue::Limit(env_f64("LICENSING_STANDARD_MAX_MONTHLY_TRANSFERS", 30.0))),
            ]),
        );
        tier_features.insert(
            LicenseTier::Premium,
            HashMap::from([("auto_apply_pump_transfers".to_string(), FeatureValue::Bool(true))]),
        );

        let license = LicenseManagerConfig {
            webhook_url,
            api_key,
            request_timeout,
            max_transfers: env_u32("LICENSING_MAX_TRANSFERS", 3),
            offline_grace_days: env_i64("LICENSING_OFFLINE_GRACE_DAYS", 7),
            hardware_similarity_threshold: env_f64("LICENSING_HARDWARE_SIMILARITY_THRESHOLD", 0.60),
            check_intervals_hours,
            min_tick_interval_hours: env_i64("LICENSING_MIN_TICK_INTERVAL_HOURS", 1),
            tier_features,
            support_email: env_var("LICENSING_SUPPORT_EMAIL").unwrap_or_else(|| "support@example.com".into()),
            support_phone: env_var("LICENSING_SUPPORT_PHONE").unwrap_or_else(|| "+1-000-000-0000".into()),
        };

        Ok(Self { database_url, database_token, time_series_csv_path, license })
    }
}
