// [libs/infra/timeseries/src/in_memory.rs]
//! A fixture-style in-memory repository used by tests and by the CLI
//! when no external dataset is configured. Kept deliberately simple —
//! row storage and linear summation, no indexing — since the row
//! counts here are small (monthly granularity).

use chrono::{Datelike, NaiveDate};
use std::sync::RwLock;

use crate::repository::TimeSeriesRepository;

#[derive(Debug, Clone)]
struct Row {
    date: NaiveDate,
    field: String,
    facility_code: Option<String>,
    value: f64,
}

pub struct InMemoryTimeSeriesRepository {
    rows: RwLock<Vec<Row>>,
    source_path: RwLock<String>,
}

impl InMemoryTimeSeriesRepository {
    pub fn new(source_path: impl Into<String>) -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
            source_path: RwLock::new(source_path.into()),
        }
    }

    pub fn push(&self, date: NaiveDate, field: &str, facility_code: Option<&str>, value: f64) {
        self.rows.write().expect("lock poisoned").push(Row {
            date,
            field: field.to_string(),
            facility_code: facility_code.map(|s| s.to_string()),
            value,
        });
    }

    /// Replaces the tracked source path, as if the underlying dataset
    /// had been repointed at a different file.
    pub fn set_source_path(&self, new_path: impl Into<String>) {
        *self.source_path.write().expect("lock poisoned") = new_path.into();
    }

    fn sum_matching(&self, date: NaiveDate, field: &str, facility_code: Option<&str>) -> Option<f64> {
        let rows = self.rows.read().expect("lock poisoned");
        let mut total = 0.0;
        let mut matched = false;
        for row in rows.iter() {
            if row.field != field || row.date.year() != date.year() || row.date.month() != date.month() {
                continue;
            }
            if row.facility_code.as_deref() != facility_code {
                continue;
            }
            total += row.value;
            matched = true;
        }
        matched.then_some(total)
    }
}

impl TimeSeriesRepository for InMemoryTimeSeriesRepository {
    fn get_value(&self, date: NaiveDate, field: &str) -> Option<f64> {
        self.sum_matching(date, field, None)
    }

    fn get_value_for_facility(&self, date: NaiveDate, field: &str, facility_code: &str) -> Option<f64> {
        self.sum_matching(date, field, Some(facility_code))
    }

    fn get_latest_date(&self) -> Option<NaiveDate> {
        self.rows.read().expect("lock poisoned").iter().map(|r| r.date).max()
    }

    fn current_source_path(&self) -> String {
        self.source_path.read().expect("lock poisoned").clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sums_multiple_rows_within_the_same_month() {
        let repo = InMemoryTimeSeriesRepository::new("fixture.csv");
        repo.push(NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(), "SRC-A", None, 100.0);
        repo.push(NaiveDate::from_ymd_opt(2024, 12, 15).unwrap(), "SRC-A", None, 50.0);
        assert_eq!(repo.get_value(NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(), "SRC-A"), Some(150.0));
    }

    #[test]
    fn missing_field_returns_none_not_zero() {
        let repo = InMemoryTimeSeriesRepository::new("fixture.csv");
        assert_eq!(repo.get_value(NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(), "SRC-MISSING"), None);
    }

    #[test]
    fn facility_scoped_lookup_ignores_unscoped_rows() {
        let repo = InMemoryTimeSeriesRepository::new("fixture.csv");
        repo.push(NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(), "RAINFALL_MM", None, 10.0);
        repo.push(NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(), "RAINFALL_MM", Some("TSF-NORTH"), 42.0);
        assert_eq!(
            repo.get_value_for_facility(NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(), "RAINFALL_MM", "TSF-NORTH"),
            Some(42.0)
        );
    }

    #[test]
    fn source_path_change_is_observable() {
        let repo = InMemoryTimeSeriesRepository::new("a.xlsx");
        assert_eq!(repo.current_source_path(), "a.xlsx");
        repo.set_source_path("b.xlsx");
        assert_eq!(repo.current_source_path(), "b.xlsx");
    }
}
