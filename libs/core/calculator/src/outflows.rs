// [libs/core/calculator/src/outflows.rs]
//! Outflow submodel. Seepage loss is computed here too
//! ( `seepage_loss_total_m3` ) but stays out of `total_m3()`
//! — it is threaded separately into storage change.

use chrono::{Datelike, NaiveDate};
use wbe_domain_models::constant::keys;
use wbe_domain_models::facility::Facility;

use crate::inputs::{resolve, resolve_for_facility, resolve_tracked, CalculatorDataSource};

pub const EVAPORATION_FIELD: &str = "EVAPORATION_MM";
pub const GROSS_PLANT_FIELD: &str = "GROSS_PLANT_M3";
pub const DUST_SUPPRESSION_FIELD: &str = "DUST_SUPPRESSION_M3";
pub const MINING_USE_FIELD: &str = "MINING_USE_M3";
pub const DOMESTIC_USE_FIELD: &str = "DOMESTIC_USE_M3";
pub const DISCHARGE_FIELD: &str = "DISCHARGE_M3";

/// Per-facility evaporation loss, hard-capped at `current_volume_m3`
/// hard-capped by current volume.
pub fn evaporation_loss_m3(
    facility: &Facility,
    date: NaiveDate,
    data: &dyn CalculatorDataSource,
    ts_repo: &dyn wbe_infra_timeseries::TimeSeriesRepository,
) -> f64 {
    if !facility.evap_active {
        return 0.0;
    }
    let evap_mm = resolve_for_facility(date, EVAPORATION_FIELD, &facility.facility_code, data, ts_repo, 0.0);
    let uncapped = (evap_mm / 1000.0) * facility.surface_area_m2;
    uncapped.min(facility.current_volume_m3).max(0.0)
}

/// Seepage loss for one facility: `current_volume × rate` for unlined
/// facilities, 0 for lined ones.
pub fn seepage_loss_m3(facility: &Facility, data: &dyn CalculatorDataSource) -> f64 {
    if facility.is_lined {
        return 0.0;
    }
    let rate = data.constant(keys::UNLINED_SEEPAGE_RATE).unwrap_or(keys::DEFAULT_UNLINED_SEEPAGE_RATE);
    facility.current_volume_m3 * rate
}

pub fn gross_plant_consumption_m3(
    date: NaiveDate,
    ore_tonnes: Option<f64>,
    data: &dyn CalculatorDataSource,
    ts_repo: &dyn wbe_infra_timeseries::TimeSeriesRepository,
) -> f64 {
    let water_per_tonne = data.constant(keys::WATER_PER_TONNE).unwrap_or(keys::DEFAULT_WATER_PER_TONNE);
    ts_repo
        .get_value(date, GROSS_PLANT_FIELD)
        .unwrap_or(ore_tonnes.unwrap_or(0.0) * water_per_tonne)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Outflows {
    pub evaporation_total_m3: f64,
    pub plant_consumption_gross_m3: f64,
    pub plant_consumption_net_m3: f64,
    pub auxiliary_uses_m3: f64,
    pub discharge_m3: f64,
    pub tailings_retention_m3: f64,
    pub seepage_loss_total_m3: f64,
    /// Set when a required field fell through the whole resolution
    /// chain and was substituted with the literal `0.0`.
    pub any_substituted_with_zero: bool,
}

impl Outflows {
    /// `total_outflows_m3` deliberately excludes `seepage_loss_total_m3`.
    pub fn total_m3(&self) -> f64 {
        self.evaporation_total_m3
            + self.plant_consumption_net_m3
            + self.auxiliary_uses_m3
            + self.discharge_m3
            + self.tailings_retention_m3
    }
}

#[allow(clippy::too_many_arguments)]
pub fn compute(
    date: NaiveDate,
    ore_tonnes: Option<f64>,
    concentrate_tonnes: Option<f64>,
    facilities: &[Facility],
    data: &dyn CalculatorDataSource,
    ts_repo: &dyn wbe_infra_timeseries::TimeSeriesRepository,
    tsf_return_m3: f64,
) -> Outflows {
    let evaporation_total_m3: f64 = facilities.iter().map(|f| evaporation_loss_m3(f, date, data, ts_repo)).sum();
    let seepage_loss_total_m3: f64 = facilities.iter().map(|f| seepage_loss_m3(f, data)).sum();

    let plant_consumption_gross_m3 = gross_plant_consumption_m3(date, ore_tonnes, data, ts_repo);
    // Recycled return is subtracted here before "net plant" feeds outflows.
    let plant_consumption_net_m3 = plant_consumption_gross_m3 - tsf_return_m3;

    let dust_rate = data.constant(keys::DUST_SUPPRESSION_RATE).unwrap_or(keys::DEFAULT_DUST_SUPPRESSION_RATE);
    let mining_rate = data.constant(keys::MINING_WATER_RATE).unwrap_or(keys::DEFAULT_MINING_WATER_RATE);
    let domestic_rate = data.constant(keys::DOMESTIC_USE_RATE).unwrap_or(keys::DEFAULT_DOMESTIC_USE_RATE);
    let tonnes = ore_tonnes.unwrap_or(0.0);

    let dust_suppression_m3 = resolve(date, DUST_SUPPRESSION_FIELD, data, ts_repo, tonnes * dust_rate);
    let mining_use_m3 = resolve(date, MINING_USE_FIELD, data, ts_repo, tonnes * mining_rate);
    let domestic_use_m3 = resolve(date, DOMESTIC_USE_FIELD, data, ts_repo, tonnes * domestic_rate);
    let auxiliary_uses_m3 = dust_suppression_m3 + mining_use_m3 + domestic_use_m3;

    let (discharge_m3, discharge_substituted) = resolve_tracked(date, DISCHARGE_FIELD, data, ts_repo, 0.0);

    let tailings_moisture_pct = data.tailings_moisture_pct(date.year(), date.month()).unwrap_or(0.0);
    let tailings_retention_m3 =
        (tonnes - concentrate_tonnes.unwrap_or(0.0)) * (tailings_moisture_pct / 100.0);

    Outflows {
        evaporation_total_m3,
        plant_consumption_gross_m3,
        plant_consumption_net_m3,
        auxiliary_uses_m3,
        discharge_m3,
        tailings_retention_m3,
        seepage_loss_total_m3,
        any_substituted_with_zero: discharge_substituted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inputs::test_support::{StubDataSource, StubTimeSeries};

    fn facility(lined: bool, evap_active: bool) -> Facility {
        Facility {
            facility_code: "TSF-NORTH".into(),
            total_capacity_m3: 100_000.0,
            surface_area_m2: 5_000.0,
            is_lined: lined,
            evap_active,
            pump_start_pct: 70.0,
            pump_stop_pct: 70.0,
            feeds_to: Vec::new(),
            active: true,
            current_volume_m3: 1_000.0,
            minimum_volume_m3: 10_000.0,
            average_daily_consumption_m3: 100.0,
            area_code: "UG2N".into(),
        }
    }

    #[test]
    fn evaporation_is_capped_at_current_volume() {
        let data = StubDataSource::default();
        let mut ts = StubTimeSeries::default();
        let date = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap();
        // 500mm over 5000m2 = 2500 m3 uncapped, but current_volume is only 1000.
        ts.facility_values.insert((date, EVAPORATION_FIELD.to_string(), "TSF-NORTH".to_string()), 500.0);
        let f = facility(true, true);
        assert_eq!(evaporation_loss_m3(&f, date, &data, &ts), 1_000.0);
    }

    #[test]
    fn lined_facility_has_no_seepage() {
        let data = StubDataSource::default();
        let f = facility(true, true);
        assert_eq!(seepage_loss_m3(&f, &data), 0.0);
    }

    #[test]
    fn unlined_facility_seepage_uses_default_rate() {
        let data = StubDataSource::default();
        let f = facility(false, true);
        assert_eq!(seepage_loss_m3(&f, &data), 1_000.0 * keys::DEFAULT_UNLINED_SEEPAGE_RATE);
    }

    #[test]
    fn net_plant_subtracts_recycled_return() {
        let data = StubDataSource::default();
        let ts = StubTimeSeries::default();
        let date = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap();
        let outflows = compute(date, Some(1_000.0), None, &[], &data, &ts, 50.0);
        assert_eq!(outflows.plant_consumption_net_m3, outflows.plant_consumption_gross_m3 - 50.0);
    }

    #[test]
    fn absent_tailings_moisture_defaults_to_zero_not_a_constant() {
        let data = StubDataSource::default();
        let ts = StubTimeSeries::default();
        let date = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap();
        let outflows = compute(date, Some(1_000.0), Some(400.0), &[], &data, &ts, 0.0);
        assert_eq!(outflows.tailings_retention_m3, 0.0);
    }

    #[test]
    fn discharge_flags_substitution_when_nothing_resolves() {
        let data = StubDataSource::default();
        let ts = StubTimeSeries::default();
        let date = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap();
        let outflows = compute(date, Some(1_000.0), None, &[], &data, &ts, 0.0);
        assert_eq!(outflows.discharge_m3, 0.0);
        assert!(outflows.any_substituted_with_zero);
    }

    #[test]
    fn discharge_not_flagged_when_constant_present() {
        let mut data = StubDataSource::default();
        data.constants.insert(DISCHARGE_FIELD.to_string(), 0.0);
        let ts = StubTimeSeries::default();
        let date = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap();
        let outflows = compute(date, Some(1_000.0), None, &[], &data, &ts, 0.0);
        assert!(!outflows.any_substituted_with_zero, "a resolved constant of 0.0 is not a substitution");
    }

    #[test]
    fn total_m3_excludes_seepage() {
        let mut outflows = Outflows::default();
        outflows.evaporation_total_m3 = 10.0;
        outflows.seepage_loss_total_m3 = 999.0;
        assert_eq!(outflows.total_m3(), 10.0);
    }
}
