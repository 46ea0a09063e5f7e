// [libs/domain/models/src/transfer.rs]
//! Pump transfer proposals and the persisted, idempotency-guarded
//! transfer event they become once applied.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A proposed (not yet applied) inter-facility water movement, as
/// produced by `propose_transfers` (pure).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transfer {
    pub calc_date: NaiveDate,
    pub source_code: String,
    pub dest_code: String,
    pub volume_m3: f64,
    pub source_level_before_pct: f64,
    pub dest_level_before_pct: f64,
    pub source_level_after_pct: f64,
    pub dest_level_after_pct: f64,
}

/// The durable, append-only record of an applied transfer. Unique on
/// `(calc_date, source_code, dest_code)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PumpTransferEvent {
    pub event_id: Option<i64>,
    pub calc_date: NaiveDate,
    pub source_code: String,
    pub dest_code: String,
    pub volume_m3: f64,
    pub applied_at: DateTime<Utc>,
    pub applied_by: String,
}
