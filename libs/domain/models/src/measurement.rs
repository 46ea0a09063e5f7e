// [libs/domain/models/src/measurement.rs]
//! Appended, immutable measurement rows ingested from upstream sources.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum QualityFlag {
    Ok,
    Suspect,
    Missing,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Measurement {
    pub date: NaiveDate,
    pub field: String,
    pub source_code: Option<String>,
    pub facility_code: Option<String>,
    pub value: f64,
    pub quality: QualityFlag,
}
