// [apps/engine/src/bin/migrator.rs]
/*!
 * APARATO: DB MIGRATOR CLI
 * RESPONSABILIDAD: APLICACION IDEMPOTENTE DEL ESQUEMA DEL STORE
 *
 * A standalone entry point for running `wbe_infra_store::schema`'s
 * `CREATE TABLE IF NOT EXISTS` sequence against `DATABASE_URL` without
 * going through `Engine::bootstrap` — `StoreClient::connect` already
 * applies the schema on every connect, so this binary exists purely
 * to let an operator run the migration as an explicit, inspectable
 * step ahead of deploying a new engine version.
 */

use dotenvy::dotenv;
use tracing::{error, info};
use wbe_infra_store::StoreClient;

fn main() -> anyhow::Result<()> {
    dotenv().ok();
    wbe_shared_telemetry::init_tracing("wbe_engine_migrator");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_stack_size(4 * 1024 * 1024)
        .build()?;

    runtime.block_on(async {
        info!("🛠️  [MIGRATOR]: applying schema to the configured store...");

        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let database_token = std::env::var("TURSO_AUTH_TOKEN").ok();

        match StoreClient::connect(&database_url, database_token).await {
            Ok(_client) => {
                info!("✅ [MIGRATOR]: schema is current.");
                Ok(())
            }
            Err(fault) => {
                error!("❌ [MIGRATOR]: schema application failed: {}", fault);
                Err(anyhow::anyhow!(fault))
            }
        }
    })
}
