// [apps/engine/src/lib.rs]
/*!
 * APARATO: ENGINE COMPOSITION ROOT
 * RESPONSABILIDAD: ENSAMBLAJE DEL STORE, CALCULATOR, PUMP ENGINE Y LICENSE MANAGER
 *
 * The binary shells (`main.rs`, `bin/seed.rs`, `bin/migrator.rs`) are
 * kept thin on purpose — everything that wires a `Store` to the
 * domain crates lives here so the three entry points share one
 * construction path.
 */

pub mod config;
pub mod timeseries;

use std::sync::Arc;

use wbe_core_calculator::Calculator;
use wbe_domain_license::LicenseManager;
use wbe_domain_pump_transfer::PumpTransferEngine;
use wbe_infra_license_client::LicenseValidationClient;
use wbe_infra_store::{Store, StoreClient};
use wbe_infra_timeseries::InMemoryTimeSeriesRepository;

use crate::config::EngineConfig;
use crate::timeseries::EngineTimeSeries;

pub type EngineCalculator = Calculator<Store, EngineTimeSeries, Store>;
pub type EngineLicenseManager = LicenseManager<Store>;
pub type EnginePumpTransfer = PumpTransferEngine<Store>;

/// Everything a CLI invocation needs, built once per process.
pub struct Engine {
    pub store: Store,
    pub calculator: EngineCalculator,
    pub pump_transfer: EnginePumpTransfer,
    pub license_manager: Arc<EngineLicenseManager>,
}

impl Engine {
    pub async fn bootstrap(config: &EngineConfig) -> anyhow::Result<Self> {
        let client = StoreClient::connect(&config.database_url, config.database_token.clone()).await?;
        let store = Store::new(client);

        let ts_repo = match &config.time_series_csv_path {
            Some(path) => EngineTimeSeries::Csv(wbe_infra_timeseries::CsvTimeSeriesRepository::load(path)?),
            None => EngineTimeSeries::InMemory(InMemoryTimeSeriesRepository::new(String::new())),
        };

        let balance_cache = Arc::new(wbe_core_cache::BalanceCache::new());
        let calculator = Calculator::with_cache(store.clone(), ts_repo, store.clone(), Arc::clone(&balance_cache));
        let pump_transfer = PumpTransferEngine::with_cache(store.clone(), balance_cache);

        let license_client =
            LicenseValidationClient::new(config.license.webhook_url.clone(), config.license.api_key.clone(), config.license.request_timeout);
        let license_manager = Arc::new(LicenseManager::new(store.clone(), license_client, config.license.clone()));

        Ok(Self { store, calculator, pump_transfer, license_manager })
    }
}
