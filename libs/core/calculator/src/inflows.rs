// [libs/core/calculator/src/inflows.rs]
//! Inflow submodel. Each computed total is a monthly
//! sum in m³; the per-facility ones iterate the supplied facility
//! list rather than asking the TS-repo for a single scalar.

use chrono::NaiveDate;
use wbe_domain_models::constant::keys;
use wbe_domain_models::facility::Facility;
use wbe_domain_models::source::SourceType;
use wbe_infra_timeseries::TimeSeriesRepository;

use crate::inputs::{resolve_for_facility, resolve_tracked, CalculatorDataSource};

pub const RAINFALL_FIELD: &str = "RAINFALL_MM";
pub const AQUIFER_SEEPAGE_GAIN_FIELD: &str = "AQUIFER_SEEPAGE_GAIN_M3";
pub const TSF_RETURN_FIELD: &str = "TSF_RETURN_M3";

#[derive(Debug, Clone, Copy, Default)]
pub struct Inflows {
    pub surface_water_m3: f64,
    pub groundwater_m3: f64,
    pub underground_water_m3: f64,
    pub rainfall_m3: f64,
    pub ore_moisture_m3: f64,
    pub aquifer_seepage_gain_m3: f64,
    pub tsf_return_m3: f64,
    /// Set when a required field fell through the whole resolution
    /// chain and was substituted with the literal `0.0`.
    pub any_substituted_with_zero: bool,
}

impl Inflows {
    /// Total inflows before recycled return is excluded to derive
    /// `fresh_inflows = total_inflows − recycled_return`.
    pub fn total_m3(&self) -> f64 {
        self.surface_water_m3
            + self.groundwater_m3
            + self.underground_water_m3
            + self.rainfall_m3
            + self.ore_moisture_m3
            + self.aquifer_seepage_gain_m3
            + self.tsf_return_m3
    }

    pub fn fresh_inflows_m3(&self) -> f64 {
        self.total_m3() - self.tsf_return_m3
    }
}

#[allow(clippy::too_many_arguments)]
pub fn compute(
    date: NaiveDate,
    ore_tonnes: Option<f64>,
    facilities: &[Facility],
    data: &dyn CalculatorDataSource,
    ts_repo: &dyn TimeSeriesRepository,
    plant_consumption_gross_m3: f64,
) -> Inflows {
    let surface_water_m3 = data.measurement_sum(date, SourceType::Surface);
    let groundwater_m3 = data.measurement_sum(date, SourceType::Ground);
    let underground_water_m3 = data.measurement_sum(date, SourceType::Underground);

    let rainfall_m3: f64 = facilities
        .iter()
        .map(|facility| {
            let rainfall_mm = resolve_for_facility(
                date,
                RAINFALL_FIELD,
                &facility.facility_code,
                data,
                ts_repo,
                keys::DEFAULT_RAINFALL_MM,
            );
            (rainfall_mm / 1000.0 * facility.surface_area_m2).max(0.0)
        })
        .sum();

    let ore_moisture_pct = data.constant(keys::ORE_MOISTURE_PCT).unwrap_or(keys::DEFAULT_ORE_MOISTURE_PCT);
    let ore_density = data.constant(keys::ORE_DENSITY).unwrap_or(keys::DEFAULT_ORE_DENSITY);
    let ore_moisture_m3 = ore_tonnes.unwrap_or(0.0) * (ore_moisture_pct / 100.0) / ore_density;

    let (aquifer_seepage_gain_m3, aquifer_seepage_substituted) = resolve_tracked(date, AQUIFER_SEEPAGE_GAIN_FIELD, data, ts_repo, 0.0);

    let tsf_return_rate = data.constant(keys::TSF_RETURN_RATE).unwrap_or(keys::DEFAULT_TSF_RETURN_RATE);
    let tsf_return_m3 = ts_repo
        .get_value(date, TSF_RETURN_FIELD)
        .unwrap_or(plant_consumption_gross_m3 * tsf_return_rate);

    Inflows {
        surface_water_m3,
        groundwater_m3,
        underground_water_m3,
        rainfall_m3,
        ore_moisture_m3,
        aquifer_seepage_gain_m3,
        tsf_return_m3,
        any_substituted_with_zero: aquifer_seepage_substituted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inputs::test_support::{StubDataSource, StubTimeSeries};

    fn facility(code: &str, area: f64) -> Facility {
        Facility {
            facility_code: code.into(),
            total_capacity_m3: 100_000.0,
            surface_area_m2: area,
            is_lined: true,
            evap_active: true,
            pump_start_pct: 70.0,
            pump_stop_pct: 70.0,
            feeds_to: Vec::new(),
            active: true,
            current_volume_m3: 50_000.0,
            minimum_volume_m3: 10_000.0,
            average_daily_consumption_m3: 100.0,
            area_code: "UG2N".into(),
        }
    }

    #[test]
    fn rainfall_uses_constant_default_when_nothing_else_resolves() {
        let data = StubDataSource::default();
        let ts = StubTimeSeries::default();
        let facilities = vec![facility("TSF-NORTH", 5_000.0)];
        let date = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap();

        let inflows = compute(date, None, &facilities, &data, &ts, 0.0);
        assert_eq!(inflows.rainfall_m3, keys::DEFAULT_RAINFALL_MM / 1000.0 * 5_000.0);
    }

    #[test]
    fn ore_moisture_uses_ore_tonnes_and_constants() {
        let data = StubDataSource::default();
        let ts = StubTimeSeries::default();
        let date = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap();
        let inflows = compute(date, Some(10_000.0), &[], &data, &ts, 0.0);
        let expected = 10_000.0 * (keys::DEFAULT_ORE_MOISTURE_PCT / 100.0) / keys::DEFAULT_ORE_DENSITY;
        assert_eq!(inflows.ore_moisture_m3, expected);
    }

    #[test]
    fn tsf_return_falls_back_to_rate_times_gross_plant() {
        let data = StubDataSource::default();
        let ts = StubTimeSeries::default();
        let date = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap();
        let inflows = compute(date, None, &[], &data, &ts, 1_000.0);
        assert_eq!(inflows.tsf_return_m3, 1_000.0 * keys::DEFAULT_TSF_RETURN_RATE);
    }

    #[test]
    fn aquifer_seepage_gain_flags_substitution_when_nothing_resolves() {
        let data = StubDataSource::default();
        let ts = StubTimeSeries::default();
        let date = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap();
        let inflows = compute(date, None, &[], &data, &ts, 0.0);
        assert_eq!(inflows.aquifer_seepage_gain_m3, 0.0);
        assert!(inflows.any_substituted_with_zero);
    }

    #[test]
    fn aquifer_seepage_gain_not_flagged_when_override_present() {
        let mut data = StubDataSource::default();
        data.overrides.insert((NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(), AQUIFER_SEEPAGE_GAIN_FIELD.into()), 0.0);
        let ts = StubTimeSeries::default();
        let date = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap();
        let inflows = compute(date, None, &[], &data, &ts, 0.0);
        assert!(!inflows.any_substituted_with_zero, "an explicit override of 0.0 is not a substitution");
    }

    #[test]
    fn fresh_inflows_excludes_recycled_return() {
        let mut inflows = Inflows::default();
        inflows.surface_water_m3 = 100.0;
        inflows.tsf_return_m3 = 30.0;
        assert_eq!(inflows.fresh_inflows_m3(), 100.0);
        assert_eq!(inflows.total_m3(), 130.0);
    }
}
