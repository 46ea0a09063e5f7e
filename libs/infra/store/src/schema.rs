/**
 * =================================================================
 * APARATO: SOVEREIGN DATABASE SCHEMA (V1.0 - WATER BALANCE STRATA)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: GOBERNANZA ESTRUCTURAL E IDEMPOTENCIA TOTAL
 *
 * VISION HIPER-HOLÍSTICA:
 * 1. PERSISTED STATE LAYOUT: facilities, sources, constants,
 *    measurements, overrides, tailings moisture, calculations,
 *    pump transfer events, license.
 * 2. IDEMPOTENCIA: migraciones en caliente tolerantes a reejecución.
 * 3. PERFORMANCE: índices de aceleración para las consultas del
 *    calculador (mes + tipo de fuente) y del motor de bombeo.
 * =================================================================
 */

use anyhow::{Context, Result};
use libsql::Connection;
use tracing::{debug, info, instrument, warn};

/**
 * ESTRATO 1: SOLIDIFICACIÓN (Génesis de Tablas)
 */
const TACTICAL_TABLES: &[(&str, &str)] = &[
    ("TABLE_FACILITIES", r#"
        CREATE TABLE IF NOT EXISTS facilities (
            facility_code TEXT PRIMARY KEY,
            total_capacity_m3 REAL NOT NULL,
            surface_area_m2 REAL NOT NULL,
            is_lined INTEGER NOT NULL DEFAULT 0,
            evap_active INTEGER NOT NULL DEFAULT 1,
            pump_start_pct REAL NOT NULL DEFAULT 100.0,
            pump_stop_pct REAL NOT NULL DEFAULT 100.0,
            feeds_to TEXT NOT NULL DEFAULT '',
            active INTEGER NOT NULL DEFAULT 1,
            current_volume_m3 REAL NOT NULL DEFAULT 0.0,
            minimum_volume_m3 REAL NOT NULL DEFAULT 0.0,
            average_daily_consumption_m3 REAL NOT NULL DEFAULT 0.0,
            area_code TEXT NOT NULL DEFAULT ''
        );
    "#),
    ("TABLE_SOURCES", r#"
        CREATE TABLE IF NOT EXISTS sources (
            source_code TEXT PRIMARY KEY,
            source_type TEXT NOT NULL,
            active INTEGER NOT NULL DEFAULT 1,
            area_code TEXT NOT NULL DEFAULT ''
        );
    "#),
    ("TABLE_CONSTANTS", r#"
        CREATE TABLE IF NOT EXISTS constants (
            key TEXT PRIMARY KEY,
            numeric_value REAL,
            text_value TEXT
        );
    "#),
    ("TABLE_MEASUREMENTS", r#"
        CREATE TABLE IF NOT EXISTS measurements (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL,
            field TEXT NOT NULL,
            source_code TEXT,
            facility_code TEXT,
            value REAL NOT NULL,
            quality TEXT NOT NULL DEFAULT 'ok'
        );
    "#),
    ("TABLE_MANUAL_OVERRIDES", r#"
        CREATE TABLE IF NOT EXISTS manual_overrides (
            date TEXT NOT NULL,
            key TEXT NOT NULL,
            value REAL NOT NULL,
            written_at TEXT NOT NULL,
            PRIMARY KEY (date, key)
        );
    "#),
    ("TABLE_TAILINGS_MOISTURE_MONTHLY", r#"
        CREATE TABLE IF NOT EXISTS tailings_moisture_monthly (
            year INTEGER NOT NULL,
            month INTEGER NOT NULL,
            tailings_moisture_pct REAL NOT NULL,
            PRIMARY KEY (year, month)
        );
    "#),
    ("TABLE_CALCULATIONS", r#"
        CREATE TABLE IF NOT EXISTS calculations (
            calc_id INTEGER PRIMARY KEY AUTOINCREMENT,
            calc_date TEXT NOT NULL,
            calc_type TEXT NOT NULL,
            computed_at TEXT NOT NULL,
            surface_water_m3 REAL NOT NULL,
            groundwater_m3 REAL NOT NULL,
            underground_water_m3 REAL NOT NULL,
            rainfall_m3 REAL NOT NULL,
            ore_moisture_m3 REAL NOT NULL,
            aquifer_seepage_gain_m3 REAL NOT NULL,
            tsf_return_m3 REAL NOT NULL,
            total_inflows_m3 REAL NOT NULL,
            fresh_inflows_m3 REAL NOT NULL,
            evaporation_total_m3 REAL NOT NULL,
            plant_consumption_net_m3 REAL NOT NULL,
            plant_consumption_gross_m3 REAL NOT NULL,
            auxiliary_uses_m3 REAL NOT NULL,
            discharge_m3 REAL NOT NULL,
            tailings_retention_m3 REAL NOT NULL,
            total_outflows_m3 REAL NOT NULL,
            seepage_loss_total_m3 REAL NOT NULL,
            storage_change_m3 REAL NOT NULL,
            closure_error_m3 REAL NOT NULL,
            closure_error_pct REAL,
            has_low_fresh_inflows INTEGER NOT NULL DEFAULT 0,
            facilities_json TEXT NOT NULL,
            pump_transfers_json TEXT NOT NULL,
            capacity_warnings_json TEXT NOT NULL,
            flags_json TEXT NOT NULL,
            UNIQUE (calc_date, calc_type)
        );
    "#),
    ("TABLE_PUMP_TRANSFER_EVENTS", r#"
        CREATE TABLE IF NOT EXISTS pump_transfer_events (
            event_id INTEGER PRIMARY KEY AUTOINCREMENT,
            calc_date TEXT NOT NULL,
            source_code TEXT NOT NULL,
            dest_code TEXT NOT NULL,
            volume_m3 REAL NOT NULL,
            applied_at TEXT NOT NULL,
            applied_by TEXT NOT NULL,
            UNIQUE (calc_date, source_code, dest_code)
        );
    "#),
    ("TABLE_LICENSE_INFO", r#"
        CREATE TABLE IF NOT EXISTS license_info (
            license_id INTEGER PRIMARY KEY AUTOINCREMENT,
            license_key TEXT NOT NULL UNIQUE,
            tier TEXT NOT NULL,
            status TEXT NOT NULL,
            expiry_date TEXT NOT NULL,
            hw_motherboard TEXT NOT NULL,
            hw_cpu TEXT NOT NULL,
            hw_mac TEXT NOT NULL,
            last_online_check TEXT,
            offline_grace_until TEXT,
            transfer_count INTEGER NOT NULL DEFAULT 0,
            activated_at TEXT NOT NULL
        );
    "#),
    ("TABLE_LICENSE_AUDIT_LOG", r#"
        CREATE TABLE IF NOT EXISTS license_audit_log (
            audit_id INTEGER PRIMARY KEY AUTOINCREMENT,
            license_id INTEGER NOT NULL,
            event_type TEXT NOT NULL,
            event_details TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
    "#),
];

/**
 * ESTRATO 2: EVOLUCIÓN (Mutaciones de Columna)
 * Vacío por ahora: no hay despliegues previos de este esquema que
 * requieran reparación incremental. Se conserva la fase para que una
 * futura migración en caliente tenga dónde vivir.
 */
const EVOLUTIONARY_STRATA: &[(&str, &str)] = &[];

/**
 * ESTRATO 3: ENDURECIMIENTO (Índices de Aceleración)
 */
const ACCELERATION_INDEXES: &[(&str, &str)] = &[
    ("IDX_MEASUREMENTS_LOOKUP", "CREATE INDEX IF NOT EXISTS idx_measurements_lookup ON measurements(date, source_code);"),
    ("IDX_MEASUREMENTS_FACILITY", "CREATE INDEX IF NOT EXISTS idx_measurements_facility ON measurements(date, facility_code);"),
    ("IDX_CALCULATIONS_DATE", "CREATE INDEX IF NOT EXISTS idx_calculations_date ON calculations(calc_date, calc_type);"),
    ("IDX_PUMP_EVENTS_DATE", "CREATE INDEX IF NOT EXISTS idx_pump_events_date ON pump_transfer_events(calc_date);"),
    ("IDX_AUDIT_LICENSE", "CREATE INDEX IF NOT EXISTS idx_audit_license ON license_audit_log(license_id, created_at);"),
];

/**
 * Ejecuta la secuencia maestra de sincronización del esquema estructural.
 *
 * # Errors:
 * Retorna error si alguna tabla base falla en solidificarse, indicando
 * un colapso en el enlace con libSQL.
 */
#[instrument(skip(database_connection))]
pub async fn apply_full_sovereign_schema(database_connection: &Connection) -> Result<()> {
    info!("🏗️ [SCHEMA_ENGINE]: Initiating structural synchronization V1.0...");

    solidify_base_strata(database_connection).await?;
    execute_evolutionary_repair(database_connection).await?;
    harden_access_layer(database_connection).await?;

    info!("✅ [SCHEMA_ENGINE]: Water balance ledger level and certified.");
    Ok(())
}

async fn solidify_base_strata(db: &Connection) -> Result<()> {
    for (identifier, sql) in TACTICAL_TABLES {
        debug!("  ↳ Solidifying: {}", identifier);
        db.execute(*sql, ()).await.with_context(|| format!("CRITICAL_SOLIDIFICATION_FAULT: {}", identifier))?;
    }
    Ok(())
}

async fn execute_evolutionary_repair(db: &Connection) -> Result<()> {
    for (identifier, sql) in EVOLUTIONARY_STRATA {
        match db.execute(*sql, ()).await {
            Ok(_) => info!("  🟢 [REPAIR_OK]: Applied evolutionary stratum {}", identifier),
            Err(e) => {
                let message = e.to_string();
                if message.contains("duplicate column name") {
                    debug!("  ⚪ [REPAIR_SKIP]: {} already level.", identifier);
                } else {
                    warn!("  ⚠️ [REPAIR_BYPASS]: {} check incomplete: {}", identifier, message);
                }
            }
        }
    }
    Ok(())
}

async fn harden_access_layer(db: &Connection) -> Result<()> {
    for (identifier, sql) in ACCELERATION_INDEXES {
        debug!("  ↳ Hardening: {}", identifier);
        db.execute(*sql, ()).await.with_context(|| format!("CRITICAL_HARDENING_FAULT: {}", identifier))?;
    }
    Ok(())
}
