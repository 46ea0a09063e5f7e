// [libs/domain/models/src/balance.rs]
//! The monthly Balance record: the calculator's sole output, and the
//! unit the Store persists under `(calc_date, calc_type)`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::transfer::Transfer;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CalcType {
    Monthly,
}

/// Quality signals attached to a Balance. Stringly-typed flags are
/// modelled here as a closed, typed set.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum DataQualityFlag {
    /// `fresh_inflows < 100 m3` — `closure_error_pct` is undefined.
    LowFreshInflows,
    /// A physical inflow/outflow quantity was computed as negative.
    NegativeQuantity,
    /// `|closure_error_pct|` exceeded the configured alert threshold.
    ClosureErrorAboveThreshold,
    /// At least one facility's computed closing volume was clamped.
    FacilityCapacityClamped,
    /// At least one facility is at or below its minimum operating volume.
    FacilityBelowMinimum,
    /// A required time-series field had no value and no fallback; 0 was substituted.
    InputSubstitutedWithZero,
}

/// A facility's opening/closing snapshot for one month, retained on
/// the Balance so a subsequent overwrite can restore prior openings
/// before it deletes the superseded record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FacilityBalanceSnapshot {
    pub facility_code: String,
    pub opening_volume_m3: f64,
    pub closing_volume_m3: f64,
    pub evaporation_loss_m3: f64,
    pub seepage_loss_m3: f64,
    pub is_below_minimum: bool,
    pub days_to_minimum: f64,
    pub capacity_clamped: bool,
}

/// A human-readable capacity warning, reset at the start of every
/// `calculate` call — never accumulates across calls.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CapacityWarning {
    pub facility_code: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Balance {
    /// Surrogate id assigned by the Store on save; `None` for an
    /// in-memory, not-yet-persisted snapshot.
    pub calc_id: Option<i64>,
    pub calc_date: NaiveDate,
    pub calc_type: CalcType,
    pub computed_at: DateTime<Utc>,

    // --- Inflows (m3) ---
    pub surface_water_m3: f64,
    pub groundwater_m3: f64,
    pub underground_water_m3: f64,
    pub rainfall_m3: f64,
    pub ore_moisture_m3: f64,
    pub aquifer_seepage_gain_m3: f64,
    pub tsf_return_m3: f64,
    pub total_inflows_m3: f64,
    pub fresh_inflows_m3: f64,

    // --- Outflows (m3) ---
    pub evaporation_total_m3: f64,
    pub plant_consumption_net_m3: f64,
    pub plant_consumption_gross_m3: f64,
    pub auxiliary_uses_m3: f64,
    pub discharge_m3: f64,
    pub tailings_retention_m3: f64,
    pub total_outflows_m3: f64,

    /// Accounting-only loss: feeds `storage_change_m3`
    /// but is deliberately excluded from `total_outflows_m3`.
    pub seepage_loss_total_m3: f64,

    pub storage_change_m3: f64,

    // --- Diagnostics ---
    pub closure_error_m3: f64,
    /// `None` when `fresh_inflows_m3 < 100.0` — never defaulted to 0.
    pub closure_error_pct: Option<f64>,
    pub has_low_fresh_inflows: bool,

    pub facilities: Vec<FacilityBalanceSnapshot>,
    pub pump_transfers: Vec<Transfer>,
    pub capacity_warnings: Vec<CapacityWarning>,
    pub flags: BTreeSet<DataQualityFlag>,
}

impl Balance {
    /// Convenience summary line for CLI/log output. Not a report —
    /// report rendering remains out of scope.
    pub fn summary_line(&self) -> String {
        format!(
            "{} fresh_inflows={:.1}m3 outflows={:.1}m3 storage_change={:.1}m3 closure_error={:.1}m3 ({}) flags={}",
            self.calc_date,
            self.fresh_inflows_m3,
            self.total_outflows_m3,
            self.storage_change_m3,
            self.closure_error_m3,
            self.closure_error_pct
                .map(|p| format!("{:.2}%", p))
                .unwrap_or_else(|| "undefined".to_string()),
            self.flags.len(),
        )
    }
}
