// [apps/engine/src/timeseries.rs]
//! `Calculator<D, T, P>` needs one concrete `TimeSeriesRepository`
//! type; this engine configures exactly one of the two concrete
//! implementations at startup depending on `TIME_SERIES_CSV_PATH`, so
//! this enum just forwards to whichever is active.

use chrono::NaiveDate;
use wbe_infra_timeseries::{CsvTimeSeriesRepository, InMemoryTimeSeriesRepository, TimeSeriesRepository};

pub enum EngineTimeSeries {
    Csv(CsvTimeSeriesRepository),
    InMemory(InMemoryTimeSeriesRepository),
}

impl TimeSeriesRepository for EngineTimeSeries {
    fn get_value(&self, date: NaiveDate, field: &str) -> Option<f64> {
        match self {
            EngineTimeSeries::Csv(repo) => repo.get_value(date, field),
            EngineTimeSeries::InMemory(repo) => repo.get_value(date, field),
        }
    }

    fn get_value_for_facility(&self, date: NaiveDate, field: &str, facility_code: &str) -> Option<f64> {
        match self {
            EngineTimeSeries::Csv(repo) => repo.get_value_for_facility(date, field, facility_code),
            EngineTimeSeries::InMemory(repo) => repo.get_value_for_facility(date, field, facility_code),
        }
    }

    fn get_latest_date(&self) -> Option<NaiveDate> {
        match self {
            EngineTimeSeries::Csv(repo) => repo.get_latest_date(),
            EngineTimeSeries::InMemory(repo) => repo.get_latest_date(),
        }
    }

    fn current_source_path(&self) -> String {
        match self {
            EngineTimeSeries::Csv(repo) => repo.current_source_path(),
            EngineTimeSeries::InMemory(repo) => repo.current_source_path(),
        }
    }
}
