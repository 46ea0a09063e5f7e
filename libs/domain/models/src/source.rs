// [libs/domain/models/src/source.rs]
//! Water source entities (surface, ground, underground, rainfall, return).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SourceType {
    Surface,
    Ground,
    Underground,
    Rainfall,
    Return,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Source {
    pub source_code: String,
    pub source_type: SourceType,
    pub active: bool,
    pub area_code: String,
}
