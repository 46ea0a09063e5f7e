// [libs/core/calculator/src/inputs.rs]
/*!
 * APARATO: RESOLVEDOR DE ENTRADAS POR PRIORIDAD
 * RESPONSABILIDAD: CADENA DE RESOLUCION DE CAMPOS DEL BALANCE
 *
 * Every scalar field the calculator needs is resolved through the same
 * four-step chain: manual override, then the
 * time-series repository, then the constants table, then a literal
 * fallback. The calculator never reads the Store or the TS-repo
 * directly outside this module — submodels call `resolve`.
 */

use chrono::NaiveDate;
use wbe_domain_models::source::SourceType;
use wbe_infra_timeseries::TimeSeriesRepository;

/// Read-only surface the calculator needs over the Persistent Store.
/// Implemented by the infra Store crate; unit tests use a small stub.
pub trait CalculatorDataSource: Send + Sync {
    fn facilities(&self) -> Vec<wbe_domain_models::facility::Facility>;
    fn active_sources(&self, source_type: SourceType) -> Vec<wbe_domain_models::source::Source>;
    /// Sum of measurement rows for the given month and source type,
    /// restricted to currently active sources of that type.
    fn measurement_sum(&self, date: NaiveDate, source_type: SourceType) -> f64;
    fn manual_override(&self, date: NaiveDate, key: &str) -> Option<f64>;
    fn constant(&self, key: &str) -> Option<f64>;
    fn tailings_moisture_pct(&self, year: i32, month: u32) -> Option<f64>;
    /// The closing volume recorded for `facility_code` in the most
    /// recent saved balance strictly before `date`, if one exists.
    fn previous_closing_volume(&self, facility_code: &str, date: NaiveDate) -> Option<f64>;
}

/// Resolves a month-level, non-facility-scoped field through the full
/// priority chain: override → TS-repo → constants → literal fallback.
pub fn resolve(
    date: NaiveDate,
    field_key: &str,
    data: &dyn CalculatorDataSource,
    ts_repo: &dyn TimeSeriesRepository,
    literal_fallback: f64,
) -> f64 {
    if let Some(v) = data.manual_override(date, field_key) {
        return v;
    }
    if let Some(v) = ts_repo.get_value(date, field_key) {
        return v;
    }
    if let Some(v) = data.constant(field_key) {
        return v;
    }
    literal_fallback
}

/// Same as `resolve`, but also reports whether the literal fallback
/// was the value actually used — the calculator sets
/// `InputSubstitutedWithZero` from this when the fallback is 0.0 and a
/// value was genuinely expected: a required time-series field had no
/// value and no fallback, so 0 was substituted.
pub fn resolve_tracked(
    date: NaiveDate,
    field_key: &str,
    data: &dyn CalculatorDataSource,
    ts_repo: &dyn TimeSeriesRepository,
    literal_fallback: f64,
) -> (f64, bool) {
    if let Some(v) = data.manual_override(date, field_key) {
        return (v, false);
    }
    if let Some(v) = ts_repo.get_value(date, field_key) {
        return (v, false);
    }
    if let Some(v) = data.constant(field_key) {
        return (v, false);
    }
    (literal_fallback, true)
}

/// Same chain, but the TS-repo lookup is scoped to one facility (used
/// for rainfall and evaporation, which vary per facility).
pub fn resolve_for_facility(
    date: NaiveDate,
    field_key: &str,
    facility_code: &str,
    data: &dyn CalculatorDataSource,
    ts_repo: &dyn TimeSeriesRepository,
    literal_fallback: f64,
) -> f64 {
    let override_key = format!("{field_key}:{facility_code}");
    if let Some(v) = data.manual_override(date, &override_key) {
        return v;
    }
    if let Some(v) = ts_repo.get_value_for_facility(date, field_key, facility_code) {
        return v;
    }
    if let Some(v) = data.constant(field_key) {
        return v;
    }
    literal_fallback
}

#[cfg(test)]
pub mod test_support {
    use super::*;
    use std::collections::HashMap;
    use wbe_domain_models::facility::Facility;
    use wbe_domain_models::source::Source;

    #[derive(Default)]
    pub struct StubDataSource {
        pub facilities: Vec<Facility>,
        pub sources: Vec<Source>,
        pub measurement_sums: HashMap<(NaiveDate, SourceType), f64>,
        pub overrides: HashMap<(NaiveDate, String), f64>,
        pub constants: HashMap<String, f64>,
        pub tailings_moisture: HashMap<(i32, u32), f64>,
        pub previous_closings: HashMap<String, f64>,
    }

    impl CalculatorDataSource for StubDataSource {
        fn facilities(&self) -> Vec<Facility> {
            self.facilities.clone()
        }

        fn active_sources(&self, source_type: SourceType) -> Vec<Source> {
            self.sources.iter().filter(|s| s.source_type == source_type && s.active).cloned().collect()
        }

        fn measurement_sum(&self, date: NaiveDate, source_type: SourceType) -> f64 {
            *self.measurement_sums.get(&(date, source_type)).unwrap_or(&0.0)
        }

        fn manual_override(&self, date: NaiveDate, key: &str) -> Option<f64> {
            self.overrides.get(&(date, key.to_string())).copied()
        }

        fn constant(&self, key: &str) -> Option<f64> {
            self.constants.get(key).copied()
        }

        fn tailings_moisture_pct(&self, year: i32, month: u32) -> Option<f64> {
            self.tailings_moisture.get(&(year, month)).copied()
        }

        fn previous_closing_volume(&self, facility_code: &str, _date: NaiveDate) -> Option<f64> {
            self.previous_closings.get(facility_code).copied()
        }
    }

    #[derive(Default)]
    pub struct StubTimeSeries {
        pub values: HashMap<(NaiveDate, String), f64>,
        pub facility_values: HashMap<(NaiveDate, String, String), f64>,
    }

    impl TimeSeriesRepository for StubTimeSeries {
        fn get_value(&self, date: NaiveDate, field: &str) -> Option<f64> {
            self.values.get(&(date, field.to_string())).copied()
        }

        fn get_value_for_facility(&self, date: NaiveDate, field: &str, facility_code: &str) -> Option<f64> {
            self.facility_values.get(&(date, field.to_string(), facility_code.to_string())).copied()
        }

        fn get_latest_date(&self) -> Option<NaiveDate> {
            self.values.keys().map(|(d, _)| *d).max()
        }

        fn current_source_path(&self) -> String {
            "stub".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn override_wins_over_everything() {
        let mut data = StubDataSource::default();
        data.overrides.insert((NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(), "DISCHARGE_M3".into()), 5.0);
        data.constants.insert("DISCHARGE_M3".into(), 99.0);
        let mut ts = StubTimeSeries::default();
        ts.values.insert((NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(), "DISCHARGE_M3".into()), 42.0);

        let value = resolve(NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(), "DISCHARGE_M3", &data, &ts, 0.0);
        assert_eq!(value, 5.0);
    }

    #[test]
    fn ts_repo_wins_over_constant_when_no_override() {
        let data = StubDataSource::default();
        let mut ts = StubTimeSeries::default();
        ts.values.insert((NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(), "DISCHARGE_M3".into()), 42.0);

        let value = resolve(NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(), "DISCHARGE_M3", &data, &ts, 0.0);
        assert_eq!(value, 42.0);
    }

    #[test]
    fn falls_back_to_literal_when_nothing_resolves() {
        let data = StubDataSource::default();
        let ts = StubTimeSeries::default();
        let value = resolve(NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(), "DISCHARGE_M3", &data, &ts, 7.0);
        assert_eq!(value, 7.0);
    }
}
