// [libs/core/calculator/src/diagnostics.rs]
//! Closure-error and data-quality diagnostics.
//! Capacity warnings are computed in `storage.rs`; this module owns
//! only the closure-error math and the negative-quantity / threshold
//! flags, and is always re-derived from scratch on every `calculate`
//! call — nothing here persists across invocations.

use wbe_domain_models::balance::DataQualityFlag;
use wbe_domain_models::constant::keys;

use crate::inputs::CalculatorDataSource;

pub const LOW_FRESH_INFLOWS_THRESHOLD_M3: f64 = 100.0;

pub struct ClosureDiagnostics {
    pub closure_error_m3: f64,
    pub closure_error_pct: Option<f64>,
    pub has_low_fresh_inflows: bool,
}

/// `closure_error = fresh_inflows − outflows − storage_change`.
/// `closure_error_pct` is left `None` — never defaulted to 0 — when
/// `fresh_inflows < 100 m3`.
pub fn compute_closure(fresh_inflows_m3: f64, total_outflows_m3: f64, storage_change_m3: f64) -> ClosureDiagnostics {
    let closure_error_m3 = fresh_inflows_m3 - total_outflows_m3 - storage_change_m3;
    let has_low_fresh_inflows = fresh_inflows_m3 < LOW_FRESH_INFLOWS_THRESHOLD_M3;

    let closure_error_pct = if has_low_fresh_inflows {
        None
    } else {
        Some((closure_error_m3.abs() / fresh_inflows_m3) * 100.0)
    };

    ClosureDiagnostics {
        closure_error_m3,
        closure_error_pct,
        has_low_fresh_inflows,
    }
}

/// Collects the closed set of quality flags for one calculation.
/// Called once per `calculate`, starting from an empty set.
#[allow(clippy::too_many_arguments)]
pub fn collect_flags(
    closure: &ClosureDiagnostics,
    negative_quantity_detected: bool,
    any_facility_clamped: bool,
    any_facility_below_minimum: bool,
    any_input_substituted_with_zero: bool,
    data: &dyn CalculatorDataSource,
) -> std::collections::BTreeSet<DataQualityFlag> {
    let mut flags = std::collections::BTreeSet::new();

    if closure.has_low_fresh_inflows {
        flags.insert(DataQualityFlag::LowFreshInflows);
    }
    if negative_quantity_detected {
        flags.insert(DataQualityFlag::NegativeQuantity);
    }
    if any_facility_clamped {
        flags.insert(DataQualityFlag::FacilityCapacityClamped);
    }
    if any_facility_below_minimum {
        flags.insert(DataQualityFlag::FacilityBelowMinimum);
    }
    if any_input_substituted_with_zero {
        flags.insert(DataQualityFlag::InputSubstitutedWithZero);
    }

    if let Some(pct) = closure.closure_error_pct {
        let threshold = data
            .constant(keys::CLOSURE_ERROR_ALERT_THRESHOLD_PCT)
            .unwrap_or(keys::DEFAULT_CLOSURE_ERROR_ALERT_THRESHOLD_PCT);
        if pct.abs() > threshold {
            flags.insert(DataQualityFlag::ClosureErrorAboveThreshold);
        }
    }

    flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inputs::test_support::StubDataSource;

    #[test]
    fn closure_error_pct_is_undefined_below_threshold() {
        let closure = compute_closure(50.0, 40.0, 5.0);
        assert_eq!(closure.closure_error_m3, 5.0);
        assert!(closure.has_low_fresh_inflows);
        assert_eq!(closure.closure_error_pct, None);
    }

    #[test]
    fn closure_error_pct_computed_when_above_threshold() {
        let closure = compute_closure(1_000.0, 900.0, 50.0);
        assert!(!closure.has_low_fresh_inflows);
        assert_eq!(closure.closure_error_pct, Some(5.0));
    }

    #[test]
    fn above_threshold_flag_set_when_pct_exceeds_configured_limit() {
        let data = StubDataSource::default();
        let closure = compute_closure(1_000.0, 800.0, 0.0);
        let flags = collect_flags(&closure, false, false, false, false, &data);
        assert!(flags.contains(&DataQualityFlag::ClosureErrorAboveThreshold));
    }
}
