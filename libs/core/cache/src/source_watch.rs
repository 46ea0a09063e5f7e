// [libs/core/cache/src/source_watch.rs]
//! Tracks the external Time-Series Repository's reported source path
//! and fires `full_clear` + `excel_path_changed` the moment it differs
//! from what was last observed via `on_source_path_change(kind, new_path)`.

use std::sync::RwLock;
use tracing::{info, instrument};
use wbe_domain_models::cache_event::CacheEvent;

use crate::cache::BalanceCache;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    MeterReadings,
    FlowDiagram,
}

#[derive(Default)]
pub struct SourcePathWatch {
    known_paths: RwLock<std::collections::HashMap<&'static str, String>>,
}

impl SourcePathWatch {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(kind: SourceKind) -> &'static str {
        match kind {
            SourceKind::MeterReadings => "meter_readings",
            SourceKind::FlowDiagram => "flow_diagram",
        }
    }

    /// Compares `new_path` against the last path seen for `kind`; if it
    /// differs, flushes the balance cache entirely and broadcasts both
    /// `full_clear` and `excel_path_changed`. Returns whether a change
    /// was detected.
    #[instrument(skip(self, cache))]
    pub fn on_source_path_change(&self, cache: &BalanceCache, kind: SourceKind, new_path: &str) -> bool {
        let key = Self::key(kind);
        let mut known = self.known_paths.write().expect("lock poisoned");
        let changed = known.get(key).map(|prior| prior.as_str() != new_path).unwrap_or(true);

        if changed {
            known.insert(key, new_path.to_string());
            drop(known);
            info!("🔁 [CACHE]: source path for {:?} changed to [{}], flushing.", kind, new_path);
            cache.invalidate_balance(None);
            cache.notify(CacheEvent::FullClear);
            cache.notify(CacheEvent::ExcelPathChanged);
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_observation_counts_as_a_change() {
        let watch = SourcePathWatch::new();
        let cache = BalanceCache::new();
        assert!(watch.on_source_path_change(&cache, SourceKind::MeterReadings, "a.csv"));
    }

    #[test]
    fn unchanged_path_does_not_trigger_clear() {
        let watch = SourcePathWatch::new();
        let cache = BalanceCache::new();
        watch.on_source_path_change(&cache, SourceKind::MeterReadings, "a.csv");
        assert!(!watch.on_source_path_change(&cache, SourceKind::MeterReadings, "a.csv"));
    }

    #[test]
    fn different_kinds_are_tracked_independently() {
        let watch = SourcePathWatch::new();
        let cache = BalanceCache::new();
        watch.on_source_path_change(&cache, SourceKind::MeterReadings, "a.csv");
        assert!(watch.on_source_path_change(&cache, SourceKind::FlowDiagram, "a.csv"));
    }
}
