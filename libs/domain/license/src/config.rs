// [libs/domain/license/src/config.rs]
//! Licensing config keys consumed by the manager (the `licensing.*`
//! family).

use std::collections::HashMap;
use std::time::Duration;

use wbe_domain_models::license::LicenseTier;

/// A tier-gated capability value: either a boolean feature gate or a
/// numeric limit (`licensing.tier_features.<tier>`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeatureValue {
    Bool(bool),
    Limit(f64),
}

#[derive(Debug, Clone)]
pub struct LicenseManagerConfig {
    pub webhook_url: String,
    pub api_key: String,
    pub request_timeout: Duration,

    pub max_transfers: u32,
    pub offline_grace_days: i64,
    pub hardware_similarity_threshold: f64,

    /// Online revalidation interval per tier; falls back to
    /// `LicenseTier::default_check_interval_hours` for any tier not
    /// present.
    pub check_intervals_hours: HashMap<LicenseTier, i64>,

    /// Floor under which the ticker will not be made to tick faster,
    /// regardless of a configured interval (default 1h).
    pub min_tick_interval_hours: i64,

    pub tier_features: HashMap<LicenseTier, HashMap<String, FeatureValue>>,

    pub support_email: String,
    pub support_phone: String,
}

impl LicenseManagerConfig {
    pub fn check_interval_hours(&self, tier: LicenseTier) -> i64 {
        let configured = self
            .check_intervals_hours
            .get(&tier)
            .copied()
            .unwrap_or_else(|| tier.default_check_interval_hours());
        configured.max(self.min_tick_interval_hours)
    }

    pub fn feature(&self, tier: LicenseTier, name: &str) -> Option<FeatureValue> {
        self.tier_features.get(&tier).and_then(|features| features.get(name)).copied()
    }
}

impl Default for LicenseManagerConfig {
    fn default() -> Self {
        Self {
            webhook_url: String::new(),
            api_key: String::new(),
            request_timeout: Duration::from_secs(10),
            max_transfers: 3,
            offline_grace_days: 7,
            hardware_similarity_threshold: 0.60,
            check_intervals_hours: HashMap::new(),
            min_tick_interval_hours: 1,
            tier_features: HashMap::new(),
            support_email: String::new(),
            support_phone: String::new(),
        }
    }
}
