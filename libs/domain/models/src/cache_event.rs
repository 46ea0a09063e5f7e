// [libs/domain/models/src/cache_event.rs]
//! Symbolic events broadcast by the Cache Layer's observer list.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CacheEvent {
    FullClear,
    ExcelPathChanged,
    BalanceWritten,
    TransfersApplied,
}
