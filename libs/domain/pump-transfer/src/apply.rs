// [libs/domain/pump-transfer/src/apply.rs]
/*!
 * APARATO: APLICADOR TRANSACCIONAL DE TRANSFERENCIAS
 * RESPONSABILIDAD: IDEMPOTENCIA, PILOT-GATING Y ESCRITURA SERIALIZADA
 *
 * `apply_transfers` is the only place this crate
 * mutates anything, and only through the `PumpTransferStore` port —
 * the composition root's Store implementation owns the actual
 * facility rows. A `Mutex<()>` held for the whole call gives the
 * single-writer discipline this system requires — two simultaneous
 * calls must not double-decrement — without this crate knowing whether
 * the Store itself is already serialising writes.
 */

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use tracing::{info, instrument, warn};
use wbe_core_cache::BalanceCache;
use wbe_domain_models::cache_event::CacheEvent;
use wbe_domain_models::transfer::Transfer;

use crate::errors::PumpTransferError;

/// Write-side port over the Persistent Store. One `apply_transfer`
/// call is expected to be
/// atomic: decrement source, increment destination, insert the event
/// row, all-or-nothing.
pub trait PumpTransferStore: Send + Sync {
    fn event_exists(&self, date: NaiveDate, source_code: &str, dest_code: &str) -> Result<bool, String>;
    fn area_code_of(&self, facility_code: &str) -> Result<Option<String>, String>;
    fn apply_transfer(&self, transfer: &Transfer, actor: &str) -> Result<(), String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PilotGatingScope {
    Global,
    PilotArea,
}

/// `features.auto_apply_pump_transfers_scope` / `_pilot_areas`.
#[derive(Debug, Clone)]
pub struct PilotGating {
    pub scope: PilotGatingScope,
    pub pilot_areas: Vec<String>,
}

impl PilotGating {
    pub fn global() -> Self {
        Self { scope: PilotGatingScope::Global, pilot_areas: Vec::new() }
    }

    pub fn pilot_area(areas: Vec<String>) -> Self {
        Self { scope: PilotGatingScope::PilotArea, pilot_areas: areas }
    }

    fn allows(&self, area_code: &str) -> bool {
        match self.scope {
            PilotGatingScope::Global => true,
            PilotGatingScope::PilotArea => self.pilot_areas.iter().any(|a| a == area_code),
        }
    }
}

pub struct PumpTransferEngine<S> {
    store: S,
    write_lock: Mutex<()>,
    cache: Option<Arc<BalanceCache>>,
}

impl<S: PumpTransferStore> PumpTransferEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store, write_lock: Mutex::new(()), cache: None }
    }

    /// Same as `new`, but shares `cache` with the calculator so an
    /// applied transfer invalidates the balances it affects instead of
    /// leaving them stale until the next unrelated write.
    pub fn with_cache(store: S, cache: Arc<BalanceCache>) -> Self {
        Self { store, write_lock: Mutex::new(()), cache: Some(cache) }
    }

    /// `apply_transfers(date, transfers, actor) -> AppliedCount`.
    /// Skips transfers that are already recorded or whose source area
    /// is outside the pilot scope; a single transfer's store failure
    /// is logged and skipped, the remaining transfers are still
    /// attempted, with partial success across multiple transfers
    /// reported by count. Before returning, invalidates the balance
    /// cache for every calc date that actually changed and notifies
    /// `TransfersApplied` — both happen after every write this call
    /// makes, never before.
    #[instrument(skip(self, transfers))]
    pub fn apply_transfers(
        &self,
        transfers: &[Transfer],
        actor: &str,
        gating: &PilotGating,
    ) -> Result<usize, PumpTransferError> {
        let _guard = self.write_lock.lock().expect("lock poisoned");
        let mut applied = 0usize;
        let mut affected_dates: BTreeSet<NaiveDate> = BTreeSet::new();

        for transfer in transfers {
            if self
                .store
                .event_exists(transfer.calc_date, &transfer.source_code, &transfer.dest_code)
                .map_err(PumpTransferError::StoreFailed)?
            {
                info!("⏭️  [PUMP]: {} -> {} on {} already applied, skipping.", transfer.source_code, transfer.dest_code, transfer.calc_date);
                continue;
            }

            if gating.scope == PilotGatingScope::PilotArea {
                let area = self
                    .store
                    .area_code_of(&transfer.source_code)
                    .map_err(PumpTransferError::StoreFailed)?
                    .ok_or_else(|| PumpTransferError::UnknownFacility(transfer.source_code.clone()))?;
                if !gating.allows(&area) {
                    info!("🚫 [PUMP]: {} is outside pilot scope ({}), skipping.", transfer.source_code, area);
                    continue;
                }
            }

            match self.store.apply_transfer(transfer, actor) {
                Ok(()) => {
                    applied += 1;
                    affected_dates.insert(transfer.calc_date);
                    info!(
                        "✅ [PUMP]: applied {:.1} m3 {} -> {} on {}",
                        transfer.volume_m3, transfer.source_code, transfer.dest_code, transfer.calc_date
                    );
                }
                Err(fault) => {
                    warn!("⚠️  [PUMP]: transfer {} -> {} failed, rolled back: {}", transfer.source_code, transfer.dest_code, fault);
                }
            }
        }

        if let Some(cache) = &self.cache {
            for date in &affected_dates {
                cache.invalidate_balance(Some(*date));
            }
            if !affected_dates.is_empty() {
                cache.notify(CacheEvent::TransfersApplied);
            }
        }

        Ok(applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct StubStore {
        applied_events: StdMutex<HashSet<(NaiveDate, String, String)>>,
        areas: std::collections::HashMap<String, String>,
        fail_on: Option<String>,
    }

    impl PumpTransferStore for StubStore {
        fn event_exists(&self, date: NaiveDate, source_code: &str, dest_code: &str) -> Result<bool, String> {
            Ok(self.applied_events.lock().unwrap().contains(&(date, source_code.to_string(), dest_code.to_string())))
        }

        fn area_code_of(&self, facility_code: &str) -> Result<Option<String>, String> {
            Ok(self.areas.get(facility_code).cloned())
        }

        fn apply_transfer(&self, transfer: &Transfer, _actor: &str) -> Result<(), String> {
            if self.fail_on.as_deref() == Some(transfer.source_code.as_str()) {
                return Err("simulated store failure".into());
            }
            self.applied_events.lock().unwrap().insert((transfer.calc_date, transfer.source_code.clone(), transfer.dest_code.clone()));
            Ok(())
        }
    }

    fn transfer(date: NaiveDate, source: &str, dest: &str) -> Transfer {
        Transfer {
            calc_date: date,
            source_code: source.into(),
            dest_code: dest.into(),
            volume_m3: 5_000.0,
            source_level_before_pct: 80.0,
            dest_level_before_pct: 60.0,
            source_level_after_pct: 75.0,
            dest_level_after_pct: 65.0,
        }
    }

    #[test]
    fn applies_once_and_is_idempotent_on_retry() {
        let engine = PumpTransferEngine::new(StubStore::default());
        let date = NaiveDate::from_ymd_opt(2024, 12, 15).unwrap();
        let transfers = vec![transfer(date, "SRC", "DST")];

        let first = engine.apply_transfers(&transfers, "scheduler", &PilotGating::global()).unwrap();
        assert_eq!(first, 1);

        let second = engine.apply_transfers(&transfers, "scheduler", &PilotGating::global()).unwrap();
        assert_eq!(second, 0, "retry applies zero transfers, all already recorded");
    }

    #[test]
    fn pilot_gating_blocks_non_pilot_area() {
        let mut store = StubStore::default();
        store.areas.insert("SRC_M".into(), "MERM".into());
        store.areas.insert("SRC_U".into(), "UG2N".into());
        let engine = PumpTransferEngine::new(store);
        let date = NaiveDate::from_ymd_opt(2024, 12, 15).unwrap();
        let transfers = vec![transfer(date, "SRC_U", "DST_U"), transfer(date, "SRC_M", "DST_M")];

        let gating = PilotGating::pilot_area(vec!["UG2N".to_string()]);
        let applied = engine.apply_transfers(&transfers, "scheduler", &gating).unwrap();
        assert_eq!(applied, 1);
    }

    #[test]
    fn a_failed_transfer_does_not_block_the_rest() {
        let store = StubStore { fail_on: Some("BAD-SRC".to_string()), ..Default::default() };
        let engine = PumpTransferEngine::new(store);
        let date = NaiveDate::from_ymd_opt(2024, 12, 15).unwrap();
        let transfers = vec![transfer(date, "BAD-SRC", "DST"), transfer(date, "GOOD-SRC", "DST")];

        let applied = engine.apply_transfers(&transfers, "scheduler", &PilotGating::global()).unwrap();
        assert_eq!(applied, 1);
    }

    fn stub_balance(date: NaiveDate) -> wbe_domain_models::balance::Balance {
        wbe_domain_models::balance::Balance {
            calc_id: None,
            calc_date: date,
            calc_type: wbe_domain_models::balance::CalcType::Monthly,
            computed_at: chrono::Utc::now(),
            surface_water_m3: 0.0,
            groundwater_m3: 0.0,
            underground_water_m3: 0.0,
            rainfall_m3: 0.0,
            ore_moisture_m3: 0.0,
            aquifer_seepage_gain_m3: 0.0,
            tsf_return_m3: 0.0,
            total_inflows_m3: 0.0,
            fresh_inflows_m3: 0.0,
            evaporation_total_m3: 0.0,
            plant_consumption_net_m3: 0.0,
            plant_consumption_gross_m3: 0.0,
            auxiliary_uses_m3: 0.0,
            discharge_m3: 0.0,
            tailings_retention_m3: 0.0,
            total_outflows_m3: 0.0,
            seepage_loss_total_m3: 0.0,
            storage_change_m3: 0.0,
            closure_error_m3: 0.0,
            closure_error_pct: None,
            has_low_fresh_inflows: false,
            facilities: Vec::new(),
            pump_transfers: Vec::new(),
            capacity_warnings: Vec::new(),
            flags: Default::default(),
        }
    }

    #[test]
    fn successful_apply_invalidates_cache_and_notifies_transfers_applied() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let cache = Arc::new(BalanceCache::new());
        let date = NaiveDate::from_ymd_opt(2024, 12, 15).unwrap();
        cache.get_or_compute::<_, ()>(date, None, || Ok(stub_balance(date))).unwrap();

        let notified = Arc::new(AtomicBool::new(false));
        let notified_in_listener = Arc::clone(&notified);
        cache.register_listener(Box::new(move |event| {
            if event == CacheEvent::TransfersApplied {
                notified_in_listener.store(true, Ordering::SeqCst);
            }
        }));

        let engine = PumpTransferEngine::with_cache(StubStore::default(), Arc::clone(&cache));
        let transfers = vec![transfer(date, "SRC", "DST")];
        let applied = engine.apply_transfers(&transfers, "scheduler", &PilotGating::global()).unwrap();
        assert_eq!(applied, 1);
        assert!(notified.load(Ordering::SeqCst), "TransfersApplied must be notified after a successful apply");

        let mut recomputed = false;
        cache
            .get_or_compute::<_, ()>(date, None, || {
                recomputed = true;
                Ok(stub_balance(date))
            })
            .unwrap();
        assert!(recomputed, "the cached balance for the affected date must be invalidated");
    }

    #[test]
    fn no_transfers_applied_does_not_notify() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let cache = Arc::new(BalanceCache::new());
        let notified = Arc::new(AtomicBool::new(false));
        let notified_in_listener = Arc::clone(&notified);
        cache.register_listener(Box::new(move |event| {
            if event == CacheEvent::TransfersApplied {
                notified_in_listener.store(true, Ordering::SeqCst);
            }
        }));

        let date = NaiveDate::from_ymd_opt(2024, 12, 15).unwrap();
        let mut store = StubStore::default();
        store.applied_events.lock().unwrap().insert((date, "SRC".to_string(), "DST".to_string()));
        let engine = PumpTransferEngine::with_cache(store, Arc::clone(&cache));
        let transfers = vec![transfer(date, "SRC", "DST")];

        let applied = engine.apply_transfers(&transfers, "scheduler", &PilotGating::global()).unwrap();
        assert_eq!(applied, 0);
        assert!(!notified.load(Ordering::SeqCst), "an already-recorded transfer must not re-notify");
    }
}
