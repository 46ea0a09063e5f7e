// [apps/engine/src/main.rs]
/*!
 * APARATO: ENGINE CLI ENTRY POINT
 * RESPONSABILIDAD: SUPERFICIE OPERATIVA DEL MOTOR DE BALANCE HIDRICO
 *
 * A thin clap-derive shell over `wbe_engine::Engine`: every
 * subcommand builds the engine, performs one operation, and exits.
 * There is no long-lived server here — the license ticker is spawned
 * only for subcommands that need continuous revalidation.
 */

use std::sync::Arc;

use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use tracing::{error, info, warn};
use wbe_engine::config::{observed_hardware, EngineConfig};
use wbe_engine::Engine;

#[derive(Parser)]
#[command(name = "wbe-engine", about = "Monthly water mass balance engine for a mining operation")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Computes the monthly balance for a given date.
    Calculate {
        #[arg(long)]
        date: chrono::NaiveDate,
        #[arg(long)]
        ore_tonnes: Option<f64>,
        /// Persists the computed balance after printing it.
        #[arg(long)]
        save: bool,
    },
    /// Prints the pump transfers the policy would propose for a date.
    ProposeTransfers {
        #[arg(long)]
        date: chrono::NaiveDate,
    },
    /// Proposes and applies pump transfers for a date.
    ApplyTransfers {
        #[arg(long)]
        date: chrono::NaiveDate,
        #[arg(long)]
        actor: String,
        /// Restricts application to these pilot area codes; omit for global scope.
        #[arg(long, value_delimiter = ',')]
        pilot_areas: Option<Vec<String>>,
    },
    #[command(subcommand)]
    License(LicenseCommand),
    /// Runs the license ticker in the foreground until interrupted,
    /// revalidating on its configured cadence.
    Watch,
}

#[derive(Subcommand)]
enum LicenseCommand {
    /// Activates a license key against this machine's hardware fingerprint.
    Activate {
        #[arg(long)]
        key: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// Prints the current locally-cached license state.
    Status,
    /// Forces an online revalidation check.
    Check,
}

fn main() -> anyhow::Result<()> {
    dotenv().ok();
    wbe_shared_telemetry::init_tracing("wbe_engine");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_stack_size(4 * 1024 * 1024)
        .build()?;

    runtime.block_on(run())
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = EngineConfig::from_env()?;
    let engine = Engine::bootstrap(&config).await?;

    match cli.command {
        Command::Calculate { date, ore_tonnes, save } => {
            let balance = engine.calculator.calculate(date, ore_tonnes)?;
            info!("📊 [CALCULATE]: {}", balance.summary_line());
            println!("{}", serde_json::to_string_pretty(&balance)?);

            if save {
                let calc_id = engine.calculator.save(&balance)?;
                info!("💾 [CALCULATE]: persisted as calc_id={}", calc_id);
            }
        }

        Command::ProposeTransfers { date } => {
            let facilities = engine.store.facilities();
            let transfers = wbe_domain_pump_transfer::propose_transfers(date, &facilities);
            info!("🚰 [PROPOSE]: {} candidate transfer(s) for {}", transfers.len(), date);
            println!("{}", serde_json::to_string_pretty(&transfers)?);
        }

        Command::ApplyTransfers { date, actor, pilot_areas } => {
            let facilities = engine.store.facilities();
            let transfers = wbe_domain_pump_transfer::propose_transfers(date, &facilities);
            let gating = match pilot_areas {
                Some(areas) => wbe_domain_pump_transfer::PilotGating::pilot_area(areas),
                None => wbe_domain_pump_transfer::PilotGating::global(),
            };
            let applied = engine.pump_transfer.apply_transfers(&transfers, &actor, &gating)?;
            info!("🚰 [APPLY]: {}/{} transfer(s) applied by '{}'", applied, transfers.len(), actor);
        }

        Command::License(license_command) => run_license_command(&engine, license_command).await?,

        Command::Watch => run_watch(&engine).await?,
    }

    Ok(())
}

/// The one long-running path in this binary: hosts the license ticker
/// until the host asks us to stop, so GRACE_OFFLINE recovery and
/// revoke-within-one-tick actually have a clock to run against.
async fn run_watch(engine: &Engine) -> anyhow::Result<()> {
    let hw = observed_hardware();
    let initial_state = match engine.license_manager.validate_startup(&hw).await {
        Ok(state) => state,
        Err(fault) => {
            error!("❌ [WATCH]: startup validation failed: {}", fault);
            return Err(anyhow::anyhow!(fault));
        }
    };
    info!("🕰️ [WATCH]: license ticker starting, initial state={:?}", initial_state);

    let ticker = wbe_domain_license::spawn_ticker(Arc::clone(&engine.license_manager), hw, initial_state);
    let mut state_rx = ticker.state_rx.clone();

    let watcher = tokio::spawn(async move {
        while state_rx.changed().await.is_ok() {
            info!("🕰️ [WATCH]: license state transitioned to {:?}", *state_rx.borrow());
        }
    });

    if tokio::signal::ctrl_c().await.is_ok() {
        warn!("⚠️ [WATCH]: termination requested by host, stopping license ticker.");
    }

    ticker.shutdown().await;
    watcher.abort();

    Ok(())
}

async fn run_license_command(engine: &Engine, command: LicenseCommand) -> anyhow::Result<()> {
    let hw = observed_hardware();

    match command {
        LicenseCommand::Activate { key, name, email } => {
            let user_info = wbe_domain_license::UserInfo { licensee_name: name, licensee_email: email };
            match engine.license_manager.activate(&key, &hw, user_info).await {
                Ok(state) => info!("🔑 [LICENSE]: activation result {:?}", state),
                Err(fault) => {
                    error!("❌ [LICENSE]: activation failed: {}", fault);
                    return Err(anyhow::anyhow!(fault));
                }
            }
        }

        LicenseCommand::Status => {
            let snapshot = engine.license_manager.status_snapshot(Some(&hw));
            println!(
                "state={:?} tier={:?} expiry={:?} days_remaining={:?} transfers={} hw_match={:?}",
                snapshot.state,
                snapshot.tier,
                snapshot.expiry_date,
                snapshot.days_remaining,
                snapshot.transfer_count,
                snapshot.hardware_match_score
            );
        }

        LicenseCommand::Check => match engine.license_manager.check(&hw).await {
            Ok(state) => info!("🔁 [LICENSE]: check complete, state={:?}", state),
            Err(fault) => {
                error!("❌ [LICENSE]: check failed: {}", fault);
                return Err(anyhow::anyhow!(fault));
            }
        },
    }

    Ok(())
}
