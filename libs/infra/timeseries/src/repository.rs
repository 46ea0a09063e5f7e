// [libs/infra/timeseries/src/repository.rs]
//! The `TimeSeriesRepository` contract: a read-only view
//! over externally-supplied tabular data keyed by
//! `(date, field, facility?)`. Two logical repositories consume this
//! same trait — a legacy meter-readings view and a flow-diagram view —
//! so the Calculator never branches on which one it was handed.

use chrono::NaiveDate;

pub trait TimeSeriesRepository: Send + Sync {
    /// A month-level lookup keyed by field only (e.g. a source code or
    /// a named aggregate column). Implementations sum all rows that
    /// fall within `date`'s calendar month.
    fn get_value(&self, date: NaiveDate, field: &str) -> Option<f64>;

    /// Same as `get_value` but additionally scoped to one facility —
    /// used for per-facility fields such as rainfall or evaporation
    /// depth.
    fn get_value_for_facility(&self, date: NaiveDate, field: &str, facility_code: &str) -> Option<f64>;

    /// The most recent date present anywhere in the underlying dataset,
    /// or `None` if the dataset is empty.
    fn get_latest_date(&self) -> Option<NaiveDate>;

    /// Identity of the underlying dataset (e.g. a file path). The
    /// Cache Layer compares this across calls to detect that the
    /// source has changed and trigger `full_clear` /
    /// `excel_path_changed`.
    fn current_source_path(&self) -> String;
}
