// [libs/core/cache/src/facility_cache.rs]
/*!
 * APARATO: FACILITY LIST CACHE
 * RESPONSABILIDAD: MEMOIZACION CON EXPIRACION TEMPORAL DEL CATALOGO DE INSTALACIONES
 *
 * The facility list changes rarely (capacity edits, commissioning a
 * new TSF) so it carries its own TTL independent of explicit
 * invalidation — five minutes by default, after which a stale read
 * auto-invalidates on its own.
 */

use chrono::{DateTime, Duration, Utc};
use std::sync::RwLock;
use tracing::{debug, instrument};
use wbe_domain_models::facility::Facility;

pub const DEFAULT_TTL_SECONDS: i64 = 300;

struct Entry {
    facilities: Vec<Facility>,
    fetched_at: DateTime<Utc>,
}

pub struct FacilityCache {
    ttl: Duration,
    entry: RwLock<Option<Entry>>,
}

impl FacilityCache {
    pub fn new() -> Self {
        Self::with_ttl_seconds(DEFAULT_TTL_SECONDS)
    }

    pub fn with_ttl_seconds(ttl_seconds: i64) -> Self {
        Self {
            ttl: Duration::seconds(ttl_seconds),
            entry: RwLock::new(None),
        }
    }

    /// Returns the cached facility list if present and not yet
    /// expired, otherwise invokes `fetch`, stores the result with a
    /// fresh timestamp, and returns it.
    #[instrument(skip(self, fetch))]
    pub fn get_or_fetch<F, E>(&self, fetch: F) -> Result<Vec<Facility>, E>
    where
        F: FnOnce() -> Result<Vec<Facility>, E>,
    {
        {
            let guard = self.entry.read().expect("lock poisoned");
            if let Some(entry) = guard.as_ref() {
                if Utc::now() - entry.fetched_at < self.ttl {
                    debug!("🎯 [FACILITY_CACHE]: serving TTL-fresh snapshot.");
                    return Ok(entry.facilities.clone());
                }
            }
        }

        let facilities = fetch()?;
        *self.entry.write().expect("lock poisoned") = Some(Entry {
            facilities: facilities.clone(),
            fetched_at: Utc::now(),
        });
        Ok(facilities)
    }

    /// Explicit flush.
    #[instrument(skip(self))]
    pub fn invalidate(&self) {
        *self.entry.write().expect("lock poisoned") = None;
    }

    pub fn is_populated(&self) -> bool {
        self.entry.read().expect("lock poisoned").is_some()
    }
}

impl Default for FacilityCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stub_facility(code: &str) -> Facility {
        Facility {
            facility_code: code.to_string(),
            total_capacity_m3: 100_000.0,
            surface_area_m2: 1_000.0,
            is_lined: true,
            evap_active: true,
            pump_start_pct: 70.0,
            pump_stop_pct: 70.0,
            feeds_to: Vec::new(),
            active: true,
            current_volume_m3: 50_000.0,
            minimum_volume_m3: 10_000.0,
            average_daily_consumption_m3: 100.0,
            area_code: "UG2N".to_string(),
        }
    }

    #[test]
    fn caches_until_invalidated() {
        let cache = FacilityCache::new();
        let mut calls = 0;
        cache.get_or_fetch::<_, ()>(|| {
            calls += 1;
            Ok(vec![stub_facility("TSF-N")])
        }).unwrap();
        cache.get_or_fetch::<_, ()>(|| {
            calls += 1;
            Ok(vec![stub_facility("TSF-N")])
        }).unwrap();
        assert_eq!(calls, 1);

        cache.invalidate();
        cache.get_or_fetch::<_, ()>(|| {
            calls += 1;
            Ok(vec![stub_facility("TSF-N")])
        }).unwrap();
        assert_eq!(calls, 2);
    }

    #[test]
    fn expired_ttl_forces_refetch() {
        let cache = FacilityCache::with_ttl_seconds(-1);
        let mut calls = 0;
        cache.get_or_fetch::<_, ()>(|| {
            calls += 1;
            Ok(vec![stub_facility("TSF-N")])
        }).unwrap();
        cache.get_or_fetch::<_, ()>(|| {
            calls += 1;
            Ok(vec![stub_facility("TSF-N")])
        }).unwrap();
        assert_eq!(calls, 2);
    }
}
