// [libs/core/calculator/src/storage.rs]
/*!
 * APARATO: SUBMODELO DE ALMACENAMIENTO
 * RESPONSABILIDAD: DISTRIBUCION DE ENTRADAS/SALIDAS GLOBALES ENTRE FACILITIES
 *
 * The calculator's inflow/outflow submodels produce site-wide monthly
 * totals except for rainfall, evaporation, and seepage, which are
 * already per-facility. To close each facility's monthly balance the
 * remaining site-wide totals are distributed across active facilities
 * weighted by `total_capacity_m3` since there is no explicit
 * distribution rule, so this crate picks a deterministic,
 * capacity-proportional one that preserves
 * `Σ facility_share == site_wide_total` exactly (see DESIGN.md).
 */

use chrono::NaiveDate;
use wbe_domain_models::balance::{CapacityWarning, FacilityBalanceSnapshot};
use wbe_domain_models::facility::Facility;

use crate::inflows::Inflows;
use crate::inputs::CalculatorDataSource;
use crate::outflows::Outflows;

pub const OPENING_BASELINE_FRACTION: f64 = 0.10;

pub struct StorageResult {
    pub snapshots: Vec<FacilityBalanceSnapshot>,
    pub capacity_warnings: Vec<CapacityWarning>,
    pub storage_change_m3: f64,
}

pub fn compute(
    date: NaiveDate,
    facilities: &[Facility],
    inflows: &Inflows,
    outflows: &Outflows,
    data: &dyn CalculatorDataSource,
    evap_by_facility: &[(String, f64)],
    seepage_by_facility: &[(String, f64)],
    rainfall_by_facility: &[(String, f64)],
) -> StorageResult {
    let active: Vec<&Facility> = facilities.iter().filter(|f| f.active).collect();
    let total_capacity: f64 = active.iter().map(|f| f.total_capacity_m3).sum();

    let global_inflow_excl_rainfall = inflows.total_m3() - inflows.rainfall_m3;
    let global_outflow_excl_evap = outflows.total_m3() - outflows.evaporation_total_m3;

    let mut snapshots = Vec::with_capacity(facilities.len());
    let mut capacity_warnings = Vec::new();
    let mut storage_change_m3 = 0.0;

    for facility in facilities {
        let opening_volume_m3 = data
            .previous_closing_volume(&facility.facility_code, date)
            .unwrap_or(facility.total_capacity_m3 * OPENING_BASELINE_FRACTION);

        let weight = if facility.active && total_capacity > 0.0 {
            facility.total_capacity_m3 / total_capacity
        } else {
            0.0
        };

        let evap = lookup(evap_by_facility, &facility.facility_code);
        let seepage = lookup(seepage_by_facility, &facility.facility_code);
        let rainfall = lookup(rainfall_by_facility, &facility.facility_code);

        let inflow_share = weight * global_inflow_excl_rainfall;
        let outflow_share = weight * global_outflow_excl_evap;

        let proposed_closing = opening_volume_m3 + inflow_share + rainfall - outflow_share - evap - seepage;
        let (closing_volume_m3, overflow_or_deficit) = facility.clamp_closing_volume(proposed_closing);
        let capacity_clamped = overflow_or_deficit != 0.0;

        if capacity_clamped {
            let message = if overflow_or_deficit > 0.0 {
                format!(
                    "{} closing volume clamped to capacity; {:.1} m3 overflow discarded",
                    facility.facility_code, overflow_or_deficit
                )
            } else {
                format!(
                    "{} closing volume clamped to zero; {:.1} m3 deficit discarded",
                    facility.facility_code, overflow_or_deficit
                )
            };
            capacity_warnings.push(CapacityWarning {
                facility_code: facility.facility_code.clone(),
                message,
            });
        }

        let mut probe = facility.clone();
        probe.current_volume_m3 = closing_volume_m3;
        let raw_days = probe.raw_days_to_minimum();
        let is_below_minimum = raw_days.map(|d| d < 0.0).unwrap_or(false);
        let days_to_minimum = raw_days.map(|d| d.max(0.0)).unwrap_or(f64::INFINITY);

        if is_below_minimum {
            capacity_warnings.push(CapacityWarning {
                facility_code: facility.facility_code.clone(),
                message: format!("{} is below its minimum operating volume", facility.facility_code),
            });
        }

        storage_change_m3 += closing_volume_m3 - opening_volume_m3;

        snapshots.push(FacilityBalanceSnapshot {
            facility_code: facility.facility_code.clone(),
            opening_volume_m3,
            closing_volume_m3,
            evaporation_loss_m3: evap,
            seepage_loss_m3: seepage,
            is_below_minimum,
            days_to_minimum,
            capacity_clamped,
        });
    }

    StorageResult {
        snapshots,
        capacity_warnings,
        storage_change_m3,
    }
}

fn lookup(pairs: &[(String, f64)], code: &str) -> f64 {
    pairs.iter().find(|(c, _)| c == code).map(|(_, v)| *v).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inputs::test_support::StubDataSource;

    fn facility(code: &str, capacity: f64, current: f64) -> Facility {
        Facility {
            facility_code: code.into(),
            total_capacity_m3: capacity,
            surface_area_m2: 1_000.0,
            is_lined: true,
            evap_active: true,
            pump_start_pct: 70.0,
            pump_stop_pct: 70.0,
            feeds_to: Vec::new(),
            active: true,
            current_volume_m3: current,
            minimum_volume_m3: 1_000.0,
            average_daily_consumption_m3: 10.0,
            area_code: "UG2N".into(),
        }
    }

    #[test]
    fn opening_defaults_to_ten_percent_of_capacity_with_no_prior_balance() {
        let data = StubDataSource::default();
        let facilities = vec![facility("TSF-A", 100_000.0, 0.0)];
        let result = compute(
            NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(),
            &facilities,
            &Inflows::default(),
            &Outflows::default(),
            &data,
            &[],
            &[],
            &[],
        );
        assert_eq!(result.snapshots[0].opening_volume_m3, 10_000.0);
    }

    #[test]
    fn overflow_closing_is_clamped_and_flagged() {
        let mut data = StubDataSource::default();
        data.previous_closings.insert("TSF-A".into(), 99_000.0);
        let facilities = vec![facility("TSF-A", 100_000.0, 99_000.0)];
        let mut inflows = Inflows::default();
        inflows.surface_water_m3 = 50_000.0;
        let result = compute(
            NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(),
            &facilities,
            &inflows,
            &Outflows::default(),
            &data,
            &[],
            &[],
            &[],
        );
        assert_eq!(result.snapshots[0].closing_volume_m3, 100_000.0);
        assert!(result.snapshots[0].capacity_clamped);
        assert_eq!(result.capacity_warnings.len(), 1);
    }

    #[test]
    fn below_minimum_is_flagged_but_days_clamped_at_zero() {
        let mut data = StubDataSource::default();
        data.previous_closings.insert("TSF-A".into(), 500.0);
        let facilities = vec![facility("TSF-A", 100_000.0, 500.0)];
        let result = compute(
            NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(),
            &facilities,
            &Inflows::default(),
            &Outflows::default(),
            &data,
            &[],
            &[],
            &[],
        );
        assert!(result.snapshots[0].is_below_minimum);
        assert_eq!(result.snapshots[0].days_to_minimum, 0.0);
    }
}
