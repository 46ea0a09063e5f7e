// [libs/core/cache/src/key.rs]
//! The Balance cache is keyed by the Calculator's semantic inputs,
//! not by an opaque hash of the whole call. `ore_tonnes` is
//! an `Option<f64>`, so it is folded into a bit pattern to keep the
//! key `Eq + Hash`.

use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BalanceKey {
    date: NaiveDate,
    ore_tonnes_bits: Option<u64>,
}

impl BalanceKey {
    pub fn new(date: NaiveDate, ore_tonnes: Option<f64>) -> Self {
        Self {
            date,
            ore_tonnes_bits: ore_tonnes.map(f64::to_bits),
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }
}
