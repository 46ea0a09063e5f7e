// [libs/infra/timeseries/src/csv_repository.rs]
/*!
 * APARATO: CSV TIME-SERIES REPOSITORY
 * RESPONSABILIDAD: HIDRATACION DE LA VISTA TABULAR DESDE DISCO
 *
 * Loads a flat CSV export (`date,field,facility_code,value`) into
 * memory once, and exposes the same `TimeSeriesRepository` contract
 * as the in-memory fixture. Re-reads the file only when `reload()` is
 * called explicitly — this crate does not watch the filesystem, it is
 * the caller's responsibility to call `reload()` after repointing the
 * source (mirrors the Cache Layer's `on_source_path_change` trigger).
 */

use chrono::{Datelike, NaiveDate};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{info, instrument, warn};

use crate::errors::TimeSeriesError;
use crate::repository::TimeSeriesRepository;

#[derive(Debug, Clone, serde::Deserialize)]
struct CsvRow {
    date: NaiveDate,
    field: String,
    facility_code: Option<String>,
    value: f64,
}

pub struct CsvTimeSeriesRepository {
    path: RwLock<PathBuf>,
    rows: RwLock<Vec<CsvRow>>,
}

impl CsvTimeSeriesRepository {
    #[instrument]
    pub fn load(path: impl AsRef<Path> + std::fmt::Debug) -> Result<Self, TimeSeriesError> {
        let path = path.as_ref().to_path_buf();
        let rows = Self::read_rows(&path)?;
        info!("📄 [TS_REPO]: Loaded {} rows from [{}]", rows.len(), path.display());
        Ok(Self {
            path: RwLock::new(path),
            rows: RwLock::new(rows),
        })
    }

    fn read_rows(path: &Path) -> Result<Vec<CsvRow>, TimeSeriesError> {
        let mut reader = csv::Reader::from_path(path).map_err(|e| TimeSeriesError::Io {
            path: path.display().to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, e.to_string()),
        })?;

        let mut rows = Vec::new();
        for (index, record) in reader.deserialize::<CsvRow>().enumerate() {
            match record {
                Ok(row) => rows.push(row),
                Err(fault) => {
                    return Err(TimeSeriesError::Parse {
                        path: path.display().to_string(),
                        detail: format!("row {}: {}", index, fault),
                    })
                }
            }
        }
        Ok(rows)
    }

    /// Repoint at a new file and re-hydrate in one step. Returns
    /// whether the path actually changed — callers (the Cache Layer)
    /// use this to decide whether to fire `excel_path_changed`.
    #[instrument(skip(self))]
    pub fn repoint(&self, new_path: impl AsRef<Path>) -> Result<bool, TimeSeriesError> {
        let new_path = new_path.as_ref().to_path_buf();
        let changed = *self.path.read().expect("lock poisoned") != new_path;
        let rows = Self::read_rows(&new_path)?;
        *self.rows.write().expect("lock poisoned") = rows;
        *self.path.write().expect("lock poisoned") = new_path;
        if changed {
            warn!("🔁 [TS_REPO]: Source path changed, dataset reloaded.");
        }
        Ok(changed)
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

impl TimeSeriesRepository for CsvTimeSeriesRepository {
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
        self.path.read().expect("lock poisoned").display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_fixture(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", contents).unwrap();
        file
    }

    #[test]
    fn loads_and_sums_rows() {
        let file = write_fixture("date,field,facility_code,value\n2024-12-01,SRC-A,,100.0\n2024-12-15,SRC-A,,50.0\n");
        let repo = CsvTimeSeriesRepository::load(file.path()).unwrap();
        assert_eq!(repo.get_value(NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(), "SRC-A"), Some(150.0));
    }

    #[test]
    fn repoint_reports_path_change() {
        let a = write_fixture("date,field,facility_code,value\n2024-12-01,SRC-A,,1.0\n");
        let b = write_fixture("date,field,facility_code,value\n2024-12-01,SRC-A,,2.0\n");
        let repo = CsvTimeSeriesRepository::load(a.path()).unwrap();
        let changed = repo.repoint(b.path()).unwrap();
        assert!(changed);
        assert_eq!(repo.get_value(NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(), "SRC-A"), Some(2.0));
    }

    #[test]
    fn repoint_to_same_path_reports_unchanged() {
        let a = write_fixture("date,field,facility_code,value\n2024-12-01,SRC-A,,1.0\n");
        let repo = CsvTimeSeriesRepository::load(a.path()).unwrap();
        assert!(!repo.repoint(a.path()).unwrap());
    }
}
