// [libs/domain/models/src/constant.rs]
//! Admin-managed constants table and the engine's well-known keys.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Constant {
    pub key: String,
    pub numeric_value: Option<f64>,
    pub text_value: Option<String>,
}

/// Well-known constant keys and their mandated defaults.
pub mod keys {
    pub const TSF_RETURN_RATE: &str = "TSF_RETURN_RATE";
    pub const MINING_WATER_RATE: &str = "MINING_WATER_RATE";
    pub const ORE_MOISTURE_PCT: &str = "ORE_MOISTURE_PCT";
    pub const ORE_DENSITY: &str = "ORE_DENSITY";
    pub const DEFAULT_MONTHLY_RAINFALL_MM: &str = "DEFAULT_MONTHLY_RAINFALL_MM";
    pub const UNLINED_SEEPAGE_RATE: &str = "UNLINED_SEEPAGE_RATE";
    pub const WATER_PER_TONNE: &str = "WATER_PER_TONNE";
    pub const DUST_SUPPRESSION_RATE: &str = "DUST_SUPPRESSION_RATE";
    pub const DOMESTIC_USE_RATE: &str = "DOMESTIC_USE_RATE";
    pub const CLOSURE_ERROR_ALERT_THRESHOLD_PCT: &str = "CLOSURE_ERROR_ALERT_THRESHOLD_PCT";

    pub const DEFAULT_TSF_RETURN_RATE: f64 = 0.56;
    pub const DEFAULT_MINING_WATER_RATE: f64 = 0.18;
    pub const DEFAULT_ORE_MOISTURE_PCT: f64 = 3.4;
    pub const DEFAULT_ORE_DENSITY: f64 = 2.7;
    pub const DEFAULT_RAINFALL_MM: f64 = 60.0;
    pub const DEFAULT_UNLINED_SEEPAGE_RATE: f64 = 0.005;
    pub const DEFAULT_CLOSURE_ERROR_ALERT_THRESHOLD_PCT: f64 = 5.0;
    pub const DEFAULT_WATER_PER_TONNE: f64 = 1.1;
    pub const DEFAULT_DUST_SUPPRESSION_RATE: f64 = 0.02;
    pub const DEFAULT_DOMESTIC_USE_RATE: f64 = 0.01;
}
