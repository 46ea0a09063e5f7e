// [libs/infra/store/src/lib.rs]
/*!
 * APARATO: PERSISTENT STORE FACADE
 * RESPONSABILIDAD: PUENTE SINCRONO SOBRE LIBSQL PARA LOS PUERTOS DE DOMINIO
 *
 * The calculator, pump-transfer, and license crates each define a
 * small synchronous port over the Persistent Store
 * (`CalculatorDataSource`/`BalancePersistence`, `PumpTransferStore`,
 * `LicenseStore`) so their own logic stays free of any async runtime.
 * `libsql`, on the other hand, is async end to end. This crate is the
 * one place that bridges the two: every trait method here blocks the
 * calling thread on the underlying repository call via
 * `block_in_place` + `Handle::current().block_on`, which requires the
 * composition root to run a multi-threaded tokio runtime.
 *
 * Read-port methods that cannot fail in their trait signature
 * (`facilities`, `active_sources`, `manual_override`, ...) log and
 * fall back to an empty/`None` result on a Store fault rather than
 * panicking — a transient database hiccup degrades a single month's
 * calculation, it does not crash the process.
 */

pub mod client;
pub mod errors;
pub mod repositories;
pub mod schema;

use chrono::NaiveDate;
use tracing::error;

use wbe_core_calculator::inputs::CalculatorDataSource;
use wbe_core_calculator::BalancePersistence;
use wbe_domain_license::{LicenseManagerError, LicenseStore};
use wbe_domain_models::balance::{Balance, CalcType, FacilityBalanceSnapshot};
use wbe_domain_models::facility::Facility;
use wbe_domain_models::license::{AuditLogEntry, License};
use wbe_domain_models::source::{Source, SourceType};
use wbe_domain_models::transfer::Transfer;
use wbe_domain_pump_transfer::PumpTransferStore;

pub use client::StoreClient;
pub use errors::StoreError;
pub use repositories::*;

fn block_on<F: std::future::Future>(fut: F) -> F::Output {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(fut))
}

/// The composition root's single handle onto persistence: implements
/// every domain-layer port by constructing the matching repository
/// over a cloned `StoreClient` and bridging its async call to sync.
#[derive(Clone)]
pub struct Store {
    client: StoreClient,
}

impl Store {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    fn facilities_repo(&self) -> FacilityRepository {
        FacilityRepository::new(self.client.clone())
    }

    fn sources_repo(&self) -> SourceRepository {
        SourceRepository::new(self.client.clone())
    }

    fn constants_repo(&self) -> ConstantRepository {
        ConstantRepository::new(self.client.clone())
    }

    fn measurements_repo(&self) -> MeasurementRepository {
        MeasurementRepository::new(self.client.clone())
    }

    fn overrides_repo(&self) -> OverrideRepository {
        OverrideRepository::new(self.client.clone())
    }

    fn balances_repo(&self) -> BalanceRepository {
        BalanceRepository::new(self.client.clone())
    }

    fn transfers_repo(&self) -> TransferRepository {
        TransferRepository::new(self.client.clone())
    }

    fn license_repo(&self) -> LicenseRepository {
        LicenseRepository::new(self.client.clone())
    }

    fn audit_repo(&self) -> AuditRepository {
        AuditRepository::new(self.client.clone())
    }

    /// Seeds a source row directly; used by the CLI's setup path and
    /// by tests that need a populated store without a migration file.
    pub fn upsert_facility(&self, facility: &Facility) -> Result<(), StoreError> {
        block_on(self.facilities_repo().upsert(facility))
    }

    pub fn upsert_source(&self, source: &Source) -> Result<(), StoreError> {
        block_on(self.sources_repo().upsert(source))
    }

    pub fn upsert_constant(&self, constant: &wbe_domain_models::constant::Constant) -> Result<(), StoreError> {
        block_on(self.constants_repo().upsert(constant))
    }

    pub fn insert_measurement(&self, measurement: &wbe_domain_models::measurement::Measurement) -> Result<(), StoreError> {
        block_on(self.measurements_repo().insert(measurement))
    }

    pub fn set_manual_override(&self, date: NaiveDate, key: &str, value: f64) -> Result<(), StoreError> {
        block_on(self.overrides_repo().upsert(date, key, value))
    }
}

impl CalculatorDataSource for Store {
    fn facilities(&self) -> Vec<Facility> {
        block_on(self.facilities_repo().list()).unwrap_or_else(|fault| {
            error!("📛 [STORE]: facilities() fault, returning empty: {}", fault);
            Vec::new()
        })
    }

    fn active_sources(&self, source_type: SourceType) -> Vec<Source> {
        block_on(self.sources_repo().active_by_type(source_type)).unwrap_or_else(|fault| {
            error!("📛 [STORE]: active_sources() fault, returning empty: {}", fault);
            Vec::new()
        })
    }

    fn measurement_sum(&self, date: NaiveDate, source_type: SourceType) -> f64 {
        block_on(self.measurements_repo().sum_for_month(date, source_type)).unwrap_or_else(|fault| {
            error!("📛 [STORE]: measurement_sum() fault, treating as 0.0: {}", fault);
            0.0
        })
    }

    fn manual_override(&self, date: NaiveDate, key: &str) -> Option<f64> {
        block_on(self.overrides_repo().get(date, key)).unwrap_or_else(|fault| {
            error!("📛 [STORE]: manual_override() fault, treating as absent: {}", fault);
            None
        })
    }

    fn constant(&self, key: &str) -> Option<f64> {
        block_on(self.constants_repo().get(key)).unwrap_or_else(|fault| {
            error!("📛 [STORE]: constant() fault, treating as absent: {}", fault);
            None
        })
    }

    fn tailings_moisture_pct(&self, year: i32, month: u32) -> Option<f64> {
        block_on(self.overrides_repo().tailings_moisture_pct(year, month)).unwrap_or_else(|fault| {
            error!("📛 [STORE]: tailings_moisture_pct() fault, treating as absent: {}", fault);
            None
        })
    }

    fn previous_closing_volume(&self, facility_code: &str, date: NaiveDate) -> Option<f64> {
        block_on(self.balances_repo().previous_closing_volume(facility_code, date)).unwrap_or_else(|fault| {
            error!("📛 [STORE]: previous_closing_volume() fault, treating as absent: {}", fault);
            None
        })
    }
}

impl BalancePersistence for Store {
    fn existing_balance(&self, calc_date: NaiveDate, calc_type: CalcType) -> Result<Option<Balance>, String> {
        block_on(self.balances_repo().existing_balance(calc_date, calc_type)).map_err(StoreError::into)
    }

    fn restore_facility_openings(&self, snapshot: &[FacilityBalanceSnapshot]) -> Result<(), String> {
        block_on(self.balances_repo().restore_facility_openings(snapshot)).map_err(StoreError::into)
    }

    fn delete_balance(&self, calc_id: i64) -> Result<(), String> {
        block_on(self.balances_repo().delete_balance(calc_id)).map_err(StoreError::into)
    }

    fn insert_balance(&self, balance: &Balance) -> Result<i64, String> {
        block_on(self.balances_repo().insert_balance(balance)).map_err(StoreError::into)
    }
}

impl PumpTransferStore for Store {
    fn event_exists(&self, date: NaiveDate, source_code: &str, dest_code: &str) -> Result<bool, String> {
        block_on(self.transfers_repo().event_exists(date, source_code, dest_code)).map_err(StoreError::into)
    }

    fn area_code_of(&self, facility_code: &str) -> Result<Option<String>, String> {
        block_on(self.transfers_repo().area_code_of(facility_code)).map_err(StoreError::into)
    }

    fn apply_transfer(&self, transfer: &Transfer, actor: &str) -> Result<(), String> {
        block_on(self.transfers_repo().apply_transfer(transfer, actor)).map_err(StoreError::into)
    }
}

impl LicenseStore for Store {
    fn load(&self) -> Result<Option<License>, LicenseManagerError> {
        block_on(self.license_repo().load()).map_err(|fault| LicenseManagerError::StoreFailed(fault.to_string()))
    }

    fn save(&self, license: &License) -> Result<(), LicenseManagerError> {
        block_on(self.license_repo().save(license)).map_err(|fault| LicenseManagerError::StoreFailed(fault.to_string()))
    }

    fn append_audit(&self, entry: &AuditLogEntry) -> Result<(), LicenseManagerError> {
        block_on(self.audit_repo().append(entry)).map_err(|fault| LicenseManagerError::StoreFailed(fault.to_string()))
    }

    fn recent_audit(&self, limit: usize) -> Result<Vec<AuditLogEntry>, LicenseManagerError> {
        block_on(self.audit_repo().recent(limit)).map_err(|fault| LicenseManagerError::StoreFailed(fault.to_string()))
    }
}
