// [libs/core/calculator/src/lib.rs]
/*!
 * APARATO: WATER BALANCE CALCULATOR
 * RESPONSABILIDAD: COMPOSICION DE SUBMODELOS EN UN BALANCE MENSUAL
 *
 * The core-exposed `Calculator`: a pure function of its
 * inputs, composing the inflow/outflow/storage submodels into one
 * `Balance` record per `calculate` call, memoised through the Cache
 * Layer and persisted through a small `BalancePersistence` port the
 * composition root implements over the Store.
 */

pub mod diagnostics;
pub mod errors;
pub mod inflows;
pub mod inputs;
pub mod outflows;
pub mod storage;
pub mod txn;

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use tracing::{info, instrument};
use wbe_core_cache::{BalanceCache, Listener};
use wbe_domain_models::balance::{Balance, CalcType, CapacityWarning, FacilityBalanceSnapshot};
use wbe_domain_models::cache_event::CacheEvent;
use wbe_domain_models::source::SourceType;
use wbe_infra_timeseries::TimeSeriesRepository;

use crate::errors::CalculatorError;
use crate::inputs::CalculatorDataSource;
use crate::txn::with_rollback;

/// Write-side port the composition root implements over the
/// Persistent Store. Kept distinct from
/// `CalculatorDataSource`, which is read-only, so `calculate` itself
/// never needs it — only `save` does.
pub trait BalancePersistence: Send + Sync {
    /// The prior record for `(calc_date, calc_type)`, if one exists,
    /// carrying the facility opening snapshot `save` must restore
    /// before it overwrites.
    fn existing_balance(&self, calc_date: NaiveDate, calc_type: CalcType) -> Result<Option<Balance>, String>;
    /// Restores each facility's `current_volume_m3` from `snapshot`'s
    /// opening volumes, in preparation for a same-month overwrite.
    fn restore_facility_openings(&self, snapshot: &[FacilityBalanceSnapshot]) -> Result<(), String>;
    fn delete_balance(&self, calc_id: i64) -> Result<(), String>;
    /// Inserts the new record and returns its surrogate id.
    fn insert_balance(&self, balance: &Balance) -> Result<i64, String>;
}

/// The composed engine: wires a `CalculatorDataSource`, a
/// `TimeSeriesRepository`, and a `BalanceCache` together the way the
/// composition root is expected to.
pub struct Calculator<D, T, P> {
    data: D,
    ts_repo: T,
    persistence: P,
    cache: Arc<BalanceCache>,
    capacity_warnings: Mutex<Vec<CapacityWarning>>,
}

impl<D, T, P> Calculator<D, T, P>
where
    D: CalculatorDataSource,
    T: TimeSeriesRepository,
    P: BalancePersistence,
{
    pub fn new(data: D, ts_repo: T, persistence: P) -> Self {
        Self::with_cache(data, ts_repo, persistence, Arc::new(BalanceCache::new()))
    }

    /// Same as `new`, but shares `cache` with another owner (the pump
    /// transfer engine, typically) instead of keeping a private one —
    /// needed so a transfer applied outside the calculator still
    /// invalidates the balances it affects.
    pub fn with_cache(data: D, ts_repo: T, persistence: P, cache: Arc<BalanceCache>) -> Self {
        Self {
            data,
            ts_repo,
            persistence,
            cache,
            capacity_warnings: Mutex::new(Vec::new()),
        }
    }

    /// Handle to the balance cache this calculator reads and writes
    /// through, so other components can share invalidation with it.
    pub fn cache_handle(&self) -> Arc<BalanceCache> {
        Arc::clone(&self.cache)
    }

    /// `calculate(date, ore_tonnes?) -> Balance`. A cache hit
    /// short-circuits entirely; a miss recomputes from scratch, which
    /// always starts with an empty
    /// warnings list.
    #[instrument(skip(self))]
    pub fn calculate(&self, date: NaiveDate, ore_tonnes: Option<f64>) -> Result<Balance, CalculatorError> {
        self.cache
            .get_or_compute(date, ore_tonnes, || Ok(self.compute_uncached(date, ore_tonnes)))
    }

    fn compute_uncached(&self, date: NaiveDate, ore_tonnes: Option<f64>) -> Balance {
        let facilities = self.data.facilities();

        let plant_consumption_gross_m3 =
            crate::outflows::gross_plant_consumption_m3(date, ore_tonnes, &self.data, &self.ts_repo);

        let inflows = crate::inflows::compute(date, ore_tonnes, &facilities, &self.data, &self.ts_repo, plant_consumption_gross_m3);
        let outflows = crate::outflows::compute(date, ore_tonnes, None, &facilities, &self.data, &self.ts_repo, inflows.tsf_return_m3);

        let evap_by_facility: Vec<(String, f64)> = facilities
            .iter()
            .map(|f| (f.facility_code.clone(), crate::outflows::evaporation_loss_m3(f, date, &self.data, &self.ts_repo)))
            .collect();
        let seepage_by_facility: Vec<(String, f64)> = facilities
            .iter()
            .map(|f| (f.facility_code.clone(), crate::outflows::seepage_loss_m3(f, &self.data)))
            .collect();
        let rainfall_by_facility: Vec<(String, f64)> = facilities
            .iter()
            .map(|f| {
                let mm = crate::inputs::resolve_for_facility(
                    date,
                    crate::inflows::RAINFALL_FIELD,
                    &f.facility_code,
                    &self.data,
                    &self.ts_repo,
                    self.data.constant(wbe_domain_models::constant::keys::DEFAULT_MONTHLY_RAINFALL_MM)
                        .unwrap_or(wbe_domain_models::constant::keys::DEFAULT_RAINFALL_MM),
                );
                (f.facility_code.clone(), (mm / 1000.0 * f.surface_area_m2).max(0.0))
            })
            .collect();

        let storage = crate::storage::compute(
            date,
            &facilities,
            &inflows,
            &outflows,
            &self.data,
            &evap_by_facility,
            &seepage_by_facility,
            &rainfall_by_facility,
        );

        let fresh_inflows_m3 = inflows.fresh_inflows_m3();
        let closure = crate::diagnostics::compute_closure(fresh_inflows_m3, outflows.total_m3(), storage.storage_change_m3);

        let negative_quantity_detected = inflows.total_m3() < 0.0
            || outflows.total_m3() < 0.0
            || inflows.surface_water_m3 < 0.0
            || inflows.groundwater_m3 < 0.0
            || inflows.underground_water_m3 < 0.0;
        let any_facility_clamped = storage.snapshots.iter().any(|s| s.capacity_clamped);
        let any_facility_below_minimum = storage.snapshots.iter().any(|s| s.is_below_minimum);
        let any_input_substituted_with_zero = inflows.any_substituted_with_zero || outflows.any_substituted_with_zero;

        let flags = crate::diagnostics::collect_flags(
            &closure,
            negative_quantity_detected,
            any_facility_clamped,
            any_facility_below_minimum,
            any_input_substituted_with_zero,
            &self.data,
        );

        {
            let mut warnings = self.capacity_warnings.lock().expect("lock poisoned");
            *warnings = storage.capacity_warnings.clone();
        }

        Balance {
            calc_id: None,
            calc_date: date,
            calc_type: CalcType::Monthly,
            computed_at: chrono::Utc::now(),
            surface_water_m3: inflows.surface_water_m3,
            groundwater_m3: inflows.groundwater_m3,
            underground_water_m3: inflows.underground_water_m3,
            rainfall_m3: inflows.rainfall_m3,
            ore_moisture_m3: inflows.ore_moisture_m3,
            aquifer_seepage_gain_m3: inflows.aquifer_seepage_gain_m3,
            tsf_return_m3: inflows.tsf_return_m3,
            total_inflows_m3: inflows.total_m3(),
            fresh_inflows_m3,
            evaporation_total_m3: outflows.evaporation_total_m3,
            plant_consumption_net_m3: outflows.plant_consumption_net_m3,
            plant_consumption_gross_m3: outflows.plant_consumption_gross_m3,
            auxiliary_uses_m3: outflows.auxiliary_uses_m3,
            discharge_m3: outflows.discharge_m3,
            tailings_retention_m3: outflows.tailings_retention_m3,
            total_outflows_m3: outflows.total_m3(),
            seepage_loss_total_m3: outflows.seepage_loss_total_m3,
            storage_change_m3: storage.storage_change_m3,
            closure_error_m3: closure.closure_error_m3,
            closure_error_pct: closure.closure_error_pct,
            has_low_fresh_inflows: closure.has_low_fresh_inflows,
            facilities: storage.snapshots,
            pump_transfers: Vec::new(),
            capacity_warnings: storage.capacity_warnings,
            flags,
        }
    }

    /// `save(balance)`: before overwriting
    /// any existing `(calc_date, calc_type)` record, restores facility
    /// openings from its snapshot, *then* deletes it, then inserts the
    /// new one. If the delete-or-insert step fails after the openings
    /// were already restored, `with_rollback`'s undo puts facility
    /// volumes back to the prior record's closing snapshot — the last
    /// known-good state before the overwrite attempt began — rather
    /// than leaving them parked at the restored openings.
    #[instrument(skip(self, balance))]
    pub fn save(&self, balance: &Balance) -> Result<i64, CalculatorError> {
        let existing = self
            .persistence
            .existing_balance(balance.calc_date, balance.calc_type)
            .map_err(CalculatorError::SaveFailed)?;

        if let Some(prior) = existing {
            let opening_snapshot = prior.facilities.clone();
            let closing_snapshot: Vec<FacilityBalanceSnapshot> = prior
                .facilities
                .iter()
                .map(|entry| FacilityBalanceSnapshot { opening_volume_m3: entry.closing_volume_m3, ..entry.clone() })
                .collect();

            let result = with_rollback(
                || -> Result<i64, String> {
                    self.persistence.restore_facility_openings(&opening_snapshot)?;
                    self.persistence.delete_balance(prior.calc_id.ok_or_else(|| "prior balance missing id".to_string())?)?;
                    self.persistence.insert_balance(balance)
                },
                || self.persistence.restore_facility_openings(&closing_snapshot),
            );
            let calc_id = result.map_err(|(save_error, rollback_error)| match rollback_error {
                None => CalculatorError::SaveFailed(save_error),
                Some(rollback_error) => CalculatorError::RollbackFailed { save_error, rollback_error },
            })?;
            self.cache.invalidate_balance(Some(balance.calc_date));
            self.cache.notify(CacheEvent::BalanceWritten);
            info!("💾 [CALCULATOR]: replaced prior balance for {}", balance.calc_date);
            return Ok(calc_id);
        }

        let calc_id = self.persistence.insert_balance(balance).map_err(CalculatorError::SaveFailed)?;
        self.cache.invalidate_balance(Some(balance.calc_date));
        self.cache.notify(CacheEvent::BalanceWritten);
        Ok(calc_id)
    }

    pub fn clear_cache(&self) {
        self.cache.invalidate_balance(None);
        self.cache.notify(CacheEvent::FullClear);
    }

    pub fn register_cache_listener(&self, listener: Listener) {
        self.cache.register_listener(listener);
    }

    /// Capacity warnings from the most recent `calculate` call — reset
    /// at the start of every call, never accumulated.
    pub fn capacity_warnings(&self) -> Vec<CapacityWarning> {
        self.capacity_warnings.lock().expect("lock poisoned").clone()
    }

    pub fn active_source_count(&self, source_type: SourceType) -> usize {
        self.data.active_sources(source_type).len()
    }
}

#[cfg(test)]
mod calculate_tests {
    use super::*;
    use crate::inputs::test_support::{StubDataSource, StubTimeSeries};
    use wbe_domain_models::balance::DataQualityFlag;

    struct NoopPersistence;
    impl BalancePersistence for NoopPersistence {
        fn existing_balance(&self, _calc_date: NaiveDate, _calc_type: CalcType) -> Result<Option<Balance>, String> {
            Ok(None)
        }
        fn restore_facility_openings(&self, _snapshot: &[FacilityBalanceSnapshot]) -> Result<(), String> {
            Ok(())
        }
        fn delete_balance(&self, _calc_id: i64) -> Result<(), String> {
            Ok(())
        }
        fn insert_balance(&self, _balance: &Balance) -> Result<i64, String> {
            Ok(1)
        }
    }

    #[test]
    fn missing_required_field_flags_input_substituted_with_zero() {
        let calculator = Calculator::new(StubDataSource::default(), StubTimeSeries::default(), NoopPersistence);
        let balance = calculator.calculate(NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(), None).unwrap();
        assert!(balance.flags.contains(&DataQualityFlag::InputSubstitutedWithZero));
    }

    #[test]
    fn overridden_fields_do_not_flag_input_substituted_with_zero() {
        let mut data = StubDataSource::default();
        let date = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap();
        data.overrides.insert((date, crate::inflows::AQUIFER_SEEPAGE_GAIN_FIELD.into()), 0.0);
        data.overrides.insert((date, crate::outflows::DISCHARGE_FIELD.into()), 0.0);
        let calculator = Calculator::new(data, StubTimeSeries::default(), NoopPersistence);
        let balance = calculator.calculate(date, None).unwrap();
        assert!(!balance.flags.contains(&DataQualityFlag::InputSubstitutedWithZero));
    }
}

#[cfg(test)]
mod save_tests {
    use super::*;
    use crate::inputs::test_support::{StubDataSource, StubTimeSeries};
    use std::sync::Mutex as StdMutex;

    struct StubPersistence {
        existing: Option<Balance>,
        restored_calls: StdMutex<Vec<Vec<FacilityBalanceSnapshot>>>,
        fail_delete: bool,
    }

    impl BalancePersistence for StubPersistence {
        fn existing_balance(&self, _calc_date: NaiveDate, _calc_type: CalcType) -> Result<Option<Balance>, String> {
            Ok(self.existing.clone())
        }
        fn restore_facility_openings(&self, snapshot: &[FacilityBalanceSnapshot]) -> Result<(), String> {
            self.restored_calls.lock().unwrap().push(snapshot.to_vec());
            Ok(())
        }
        fn delete_balance(&self, _calc_id: i64) -> Result<(), String> {
            if self.fail_delete {
                Err("simulated delete failure".to_string())
            } else {
                Ok(())
            }
        }
        fn insert_balance(&self, _balance: &Balance) -> Result<i64, String> {
            Ok(99)
        }
    }

    fn prior_balance(facility_code: &str, opening: f64, closing: f64) -> Balance {
        let mut balance = test_balance();
        balance.calc_id = Some(1);
        balance.facilities = vec![FacilityBalanceSnapshot {
            facility_code: facility_code.to_string(),
            opening_volume_m3: opening,
            closing_volume_m3: closing,
            evaporation_loss_m3: 0.0,
            seepage_loss_m3: 0.0,
            is_below_minimum: false,
            days_to_minimum: 0.0,
            capacity_clamped: false,
        }];
        balance
    }

    fn test_balance() -> Balance {
        Balance {
            calc_id: None,
            calc_date: NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(),
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

    fn calculator_with(persistence: StubPersistence) -> Calculator<StubDataSource, StubTimeSeries, StubPersistence> {
        Calculator::new(StubDataSource::default(), StubTimeSeries::default(), persistence)
    }

    #[test]
    fn overwrite_restores_openings_before_delete_and_insert() {
        let prior = prior_balance("TSF-A", 10_000.0, 15_000.0);
        let persistence = StubPersistence { existing: Some(prior), restored_calls: StdMutex::new(Vec::new()), fail_delete: false };
        let calculator = calculator_with(persistence);

        let calc_id = calculator.save(&test_balance()).unwrap();
        assert_eq!(calc_id, 99);

        let calls = calculator.persistence.restored_calls.lock().unwrap();
        assert_eq!(calls.len(), 1, "openings restored exactly once on the success path");
        assert_eq!(calls[0][0].opening_volume_m3, 10_000.0, "restores to the prior record's opening, not its closing");
    }

    #[test]
    fn failed_overwrite_rolls_back_to_prior_closing_volumes() {
        let prior = prior_balance("TSF-A", 10_000.0, 15_000.0);
        let persistence = StubPersistence { existing: Some(prior), restored_calls: StdMutex::new(Vec::new()), fail_delete: true };
        let calculator = calculator_with(persistence);

        let result = calculator.save(&test_balance());
        assert!(matches!(result, Err(CalculatorError::SaveFailed(_))), "rollback itself succeeds in this stub, so only the original failure surfaces");

        let calls = calculator.persistence.restored_calls.lock().unwrap();
        assert_eq!(calls.len(), 2, "one restore-to-opening attempt, then one rollback-to-closing attempt");
        assert_eq!(calls[0][0].opening_volume_m3, 10_000.0);
        assert_eq!(calls[1][0].opening_volume_m3, 15_000.0, "rollback restores the prior closing, not a second opening restore");
    }
}
