// [libs/domain/models/src/overrides.rs]
//! User-writable monthly overrides that take priority over the
//! time-series repository in the calculator's input resolution chain.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Overrides a single `(date, key)` field for the month containing `date`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ManualOverride {
    pub date: NaiveDate,
    pub key: String,
    pub value: f64,
    pub written_at: DateTime<Utc>,
}

/// Monthly tailings moisture percentage. Absence for a given
/// `(year, month)` means 0 — monthly moisture comes from the store,
/// and absence falls back to 0 rather than a constant default.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TailingsMoistureMonthly {
    pub year: i32,
    pub month: u32,
    pub tailings_moisture_pct: f64,
}

impl TailingsMoistureMonthly {
    pub fn fraction(&self) -> f64 {
        self.tailings_moisture_pct / 100.0
    }
}
