// [libs/core/cache/src/cache.rs]
/*!
 * APARATO: BALANCE MEMOIZATION CACHE
 * RESPONSABILIDAD: EVITAR RECALCULOS DEL BALANCE MENSUAL
 *
 * Keyed by the Calculator's semantic inputs — `(date, ore_tonnes)` —
 * not by a generic cache key. A calculation short-circuits only when the key matches
 * exactly; any input change upstream (override, facility, constant)
 * requires the caller to invalidate explicitly, there is no dependency
 * tracking here.
 */

use std::collections::HashMap;
use std::sync::RwLock;
use tracing::{debug, info, instrument};
use wbe_domain_models::balance::Balance;
use wbe_domain_models::cache_event::CacheEvent;

use crate::key::BalanceKey;
use crate::listener::{Listener, ListenerRegistry};
use crate::stats::{CacheStats, CacheStatsSnapshot};

#[derive(Default)]
pub struct BalanceCache {
    entries: RwLock<HashMap<BalanceKey, Balance>>,
    listeners: ListenerRegistry,
    stats: CacheStats,
}

impl BalanceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached `Balance` for `(date, ore_tonnes)` if present,
    /// otherwise invokes `compute` once, stores the result, and returns
    /// it. `compute` is not assumed thread-safe — calculation is a
    /// single-threaded task, so callers serialise entry into this
    /// method themselves (the composition root owns that discipline).
    #[instrument(skip(self, compute))]
    pub fn get_or_compute<F, E>(
        &self,
        date: chrono::NaiveDate,
        ore_tonnes: Option<f64>,
        compute: F,
    ) -> Result<Balance, E>
    where
        F: FnOnce() -> Result<Balance, E>,
    {
        let key = BalanceKey::new(date, ore_tonnes);
        if let Some(hit) = self.entries.read().expect("lock poisoned").get(&key) {
            self.stats.record_hit();
            debug!("🎯 [BALANCE_CACHE]: hit for {}", date);
            return Ok(hit.clone());
        }

        self.stats.record_miss();
        let balance = compute()?;
        self.entries.write().expect("lock poisoned").insert(key, balance.clone());
        Ok(balance)
    }

    /// Flushes the entire balance cache if `date` is `None`, else only
    /// the entries for that month.
    #[instrument(skip(self))]
    pub fn invalidate_balance(&self, date: Option<chrono::NaiveDate>) {
        let mut entries = self.entries.write().expect("lock poisoned");
        match date {
            None => {
                let removed = entries.len();
                entries.clear();
                info!("🧹 [BALANCE_CACHE]: full flush ({} entries removed).", removed);
            }
            Some(target) => {
                entries.retain(|key, _| key.date() != target);
                info!("🧹 [BALANCE_CACHE]: flushed entries for {}.", target);
            }
        }
    }

    pub fn register_listener(&self, listener: Listener) {
        self.listeners.register(listener);
    }

    pub fn notify(&self, event: CacheEvent) {
        self.listeners.notify(event);
    }

    pub fn stats_snapshot(&self) -> CacheStatsSnapshot {
        self.stats.snapshot(self.entries.read().expect("lock poisoned").len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use wbe_domain_models::balance::{Balance, CalcType};

    fn stub_balance(date: NaiveDate) -> Balance {
        Balance {
            calc_id: None,
            calc_date: date,
            calc_type: CalcType::Monthly,
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
    fn second_call_with_same_key_is_a_hit() {
        let cache = BalanceCache::new();
        let date = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap();
        let mut calls = 0;

        cache.get_or_compute::<_, ()>(date, None, || {
            calls += 1;
            Ok(stub_balance(date))
        }).unwrap();
        cache.get_or_compute::<_, ()>(date, None, || {
            calls += 1;
            Ok(stub_balance(date))
        }).unwrap();

        assert_eq!(calls, 1);
        assert_eq!(cache.stats_snapshot().hits, 1);
        assert_eq!(cache.stats_snapshot().misses, 1);
    }

    #[test]
    fn invalidating_one_month_does_not_evict_others() {
        let cache = BalanceCache::new();
        let nov = NaiveDate::from_ymd_opt(2024, 11, 1).unwrap();
        let dec = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap();
        cache.get_or_compute::<_, ()>(nov, None, || Ok(stub_balance(nov))).unwrap();
        cache.get_or_compute::<_, ()>(dec, None, || Ok(stub_balance(dec))).unwrap();

        cache.invalidate_balance(Some(dec));

        assert_eq!(cache.stats_snapshot().entries, 1);
        let mut recomputed = false;
        cache.get_or_compute::<_, ()>(dec, None, || {
            recomputed = true;
            Ok(stub_balance(dec))
        }).unwrap();
        assert!(recomputed);
    }

    #[test]
    fn changing_facility_capacity_requires_a_full_flush() {
        // A facility-capacity edit affects every month's calculation,
        // so callers MUST invalidate the whole cache, not one date.
        let cache = BalanceCache::new();
        let nov = NaiveDate::from_ymd_opt(2024, 11, 1).unwrap();
        let dec = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap();
        cache.get_or_compute::<_, ()>(nov, None, || Ok(stub_balance(nov))).unwrap();
        cache.get_or_compute::<_, ()>(dec, None, || Ok(stub_balance(dec))).unwrap();

        cache.invalidate_balance(None);

        assert_eq!(cache.stats_snapshot().entries, 0);
    }
}
