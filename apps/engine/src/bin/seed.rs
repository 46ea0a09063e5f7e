// [apps/engine/src/bin/seed.rs]
/*!
 * APARATO: DEMO DATA SEEDER
 * RESPONSABILIDAD: POBLAR UN STORE VACIO CON FACILITIES/SOURCES/CONSTANTS DE REFERENCIA
 *
 * Not part of the core engine — a convenience for spinning up a local
 * `DATABASE_URL` with enough rows that `wbe-engine calculate` and
 * `propose-transfers` have something to operate on. Mirrors the shape
 * against the seeded data exercises the same thresholds the unit
 * tests do.
 */

use dotenvy::dotenv;
use tracing::info;
use wbe_domain_models::constant::{keys, Constant};
use wbe_domain_models::facility::Facility;
use wbe_domain_models::source::{Source, SourceType};
use wbe_infra_store::{Store, StoreClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    wbe_shared_telemetry::init_tracing("wbe_engine_seed");

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let database_token = std::env::var("TURSO_AUTH_TOKEN").ok();
    let client = StoreClient::connect(&database_url, database_token).await?;
    let store = Store::new(client);

    info!("🌱 [SEED]: writing reference facilities...");
    for facility in demo_facilities() {
        store.upsert_facility(&facility)?;
    }

    info!("🌱 [SEED]: writing reference sources...");
    for source in demo_sources() {
        store.upsert_source(&source)?;
    }

    info!("🌱 [SEED]: writing reference constants...");
    for constant in demo_constants() {
        store.upsert_constant(&constant)?;
    }

    info!("✅ [SEED]: store populated with demo facilities/sources/constants.");
    Ok(())
}

/// Two facilities: one above its `pump_start_pct` feeding a second
/// facility below its own, plus an unlined
/// evaporation pond used to exercise seepage/evaporation in `calculate`.
fn demo_facilities() -> Vec<Facility> {
    vec![
        Facility {
            facility_code: "TSF-NORTH".into(),
            total_capacity_m3: 100_000.0,
            surface_area_m2: 12_000.0,
            is_lined: true,
            evap_active: true,
            pump_start_pct: 70.0,
            pump_stop_pct: 70.0,
            feeds_to: vec!["PIT-LAKE".into()],
            active: true,
            current_volume_m3: 80_000.0,
            minimum_volume_m3: 15_000.0,
            average_daily_consumption_m3: 150.0,
            area_code: "UG2N".into(),
        },
        Facility {
            facility_code: "PIT-LAKE".into(),
            total_capacity_m3: 100_000.0,
            surface_area_m2: 8_000.0,
            is_lined: false,
            evap_active: true,
            pump_start_pct: 70.0,
            pump_stop_pct: 70.0,
            feeds_to: Vec::new(),
            active: true,
            current_volume_m3: 60_000.0,
            minimum_volume_m3: 5_000.0,
            average_daily_consumption_m3: 50.0,
            area_code: "UG2N".into(),
        },
    ]
}

fn demo_sources() -> Vec<Source> {
    vec![
        Source { source_code: "BOREHOLE-1".into(), source_type: SourceType::Ground, active: true, area_code: "UG2N".into() },
        Source { source_code: "RIVER-INTAKE".into(), source_type: SourceType::Surface, active: true, area_code: "UG2N".into() },
        Source { source_code: "DECLINE-SUMP".into(), source_type: SourceType::Underground, active: true, area_code: "UG2N".into() },
    ]
}

fn demo_constants() -> Vec<Constant> {
    vec![
        numeric(keys::TSF_RETURN_RATE, keys::DEFAULT_TSF_RETURN_RATE),
        numeric(keys::MINING_WATER_RATE, keys::DEFAULT_MINING_WATER_RATE),
        numeric(keys::ORE_MOISTURE_PCT, keys::DEFAULT_ORE_MOISTURE_PCT),
        numeric(keys::ORE_DENSITY, keys::DEFAULT_ORE_DENSITY),
        numeric(keys::DEFAULT_MONTHLY_RAINFALL_MM, keys::DEFAULT_RAINFALL_MM),
        numeric(keys::UNLINED_SEEPAGE_RATE, keys::DEFAULT_UNLINED_SEEPAGE_RATE),
        numeric(keys::WATER_PER_TONNE, keys::DEFAULT_WATER_PER_TONNE),
        numeric(keys::DUST_SUPPRESSION_RATE, keys::DEFAULT_DUST_SUPPRESSION_RATE),
        numeric(keys::DOMESTIC_USE_RATE, keys::DEFAULT_DOMESTIC_USE_RATE),
        numeric(keys::CLOSURE_ERROR_ALERT_THRESHOLD_PCT, keys::DEFAULT_CLOSURE_ERROR_ALERT_THRESHOLD_PCT),
    ]
}

fn numeric(key: &str, value: f64) -> Constant {
    Constant { key: key.to_string(), numeric_value: Some(value), text_value: None }
}
