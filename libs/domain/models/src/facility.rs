// [libs/domain/models/src/facility.rs]
//! Storage facility entity: a dam, tank, or pond with finite capacity
//! and a pump-transfer threshold policy.

use serde::{Deserialize, Serialize};

/// A modelled storage facility.
///
/// `current_volume` is mutated only by transfer application and
/// monthly closing writes — the calculator and pump engine never
/// mutate a `Facility` value directly, they return the new volume to
/// the caller, which persists it through the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Facility {
    /// Stable, unique text identifier (e.g. `"TSF-NORTH"`).
    pub facility_code: String,
    pub total_capacity_m3: f64,
    pub surface_area_m2: f64,
    pub is_lined: bool,
    pub evap_active: bool,
    /// Level (% of capacity) at which this facility starts pumping out.
    pub pump_start_pct: f64,
    /// Level (% of capacity) at which a destination is considered full
    /// for the purposes of receiving a transfer.
    pub pump_stop_pct: f64,
    /// Ordered destinations this facility feeds into when pumping.
    pub feeds_to: Vec<String>,
    pub active: bool,
    pub current_volume_m3: f64,
    /// Minimum operating volume used for `days_to_minimum` diagnostics.
    pub minimum_volume_m3: f64,
    /// Average daily consumption used for `days_to_minimum` diagnostics.
    pub average_daily_consumption_m3: f64,
    /// Area/pilot-zone grouping used by the pump transfer engine's
    /// pilot-gating policy.
    pub area_code: String,
}

impl Facility {
    /// Current fill level as a percentage of total capacity.
    ///
    /// Returns `0.0` for a zero-capacity facility rather than dividing
    /// by zero — a misconfigured facility should read as empty, not NaN.
    pub fn level_pct(&self) -> f64 {
        if self.total_capacity_m3 <= 0.0 {
            0.0
        } else {
            100.0 * self.current_volume_m3 / self.total_capacity_m3
        }
    }

    /// Clamp a proposed closing volume to `[0, total_capacity_m3]`.
    ///
    /// Returns the clamped value and the raw overflow (positive) or
    /// deficit (negative) that was clipped.
    pub fn clamp_closing_volume(&self, proposed: f64) -> (f64, f64) {
        if proposed > self.total_capacity_m3 {
            (self.total_capacity_m3, proposed - self.total_capacity_m3)
        } else if proposed < 0.0 {
            (0.0, proposed)
        } else {
            (proposed, 0.0)
        }
    }

    /// Unclamped days remaining until `current_volume_m3` reaches
    /// `minimum_volume_m3` at the current average daily consumption.
    ///
    /// A negative result means the facility is already below minimum;
    /// callers report the clamped (>= 0) value but retain this raw
    /// value to set `is_below_minimum`.
    pub fn raw_days_to_minimum(&self) -> Option<f64> {
        if self.average_daily_consumption_m3 <= 0.0 {
            return None;
        }
        Some((self.current_volume_m3 - self.minimum_volume_m3) / self.average_daily_consumption_m3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facility() -> Facility {
        Facility {
            facility_code: "TSF-NORTH".into(),
            total_capacity_m3: 100_000.0,
            surface_area_m2: 5_000.0,
            is_lined: true,
            evap_active: true,
            pump_start_pct: 70.0,
            pump_stop_pct: 70.0,
            feeds_to: vec!["PIT-LAKE".into()],
            active: true,
            current_volume_m3: 80_000.0,
            minimum_volume_m3: 10_000.0,
            average_daily_consumption_m3: 100.0,
            area_code: "UG2N".into(),
        }
    }

    #[test]
    fn level_pct_computes_ratio() {
        assert_eq!(facility().level_pct(), 80.0);
    }

    #[test]
    fn level_pct_zero_capacity_is_zero_not_nan() {
        let mut f = facility();
        f.total_capacity_m3 = 0.0;
        assert_eq!(f.level_pct(), 0.0);
    }

    #[test]
    fn clamp_closing_volume_reports_overflow() {
        let f = facility();
        let (clamped, overflow) = f.clamp_closing_volume(120_000.0);
        assert_eq!(clamped, 100_000.0);
        assert_eq!(overflow, 20_000.0);
    }

    #[test]
    fn clamp_closing_volume_reports_deficit() {
        let f = facility();
        let (clamped, deficit) = f.clamp_closing_volume(-500.0);
        assert_eq!(clamped, 0.0);
        assert_eq!(deficit, -500.0);
    }

    #[test]
    fn raw_days_to_minimum_can_be_negative() {
        let mut f = facility();
        f.current_volume_m3 = 5_000.0;
        f.minimum_volume_m3 = 10_000.0;
        assert_eq!(f.raw_days_to_minimum(), Some(-50.0));
    }
}
