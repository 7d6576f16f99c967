//! Cierra una vez los viajes abandonados (pensado para cron)

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use dotenvy::dotenv;
use tracing::info;

use fleet_management::config::{EnvironmentConfig, StorageBackend};
use fleet_management::database::open_store;
use fleet_management::services::{ChainAuthenticator, Notifier, StoreNotifier, TracingNotifier};
use fleet_management::{init_tracing, AppState};

#[derive(Debug, Parser)]
#[command(name = "auto_end_trips", about = "Automatically end trips that have been ongoing for too long")]
struct Args {
    /// Horas tras las que un viaje en curso se considera abandonado
    #[arg(long)]
    hours: Option<i64>,

    /// Muestra lo que se cerraría sin modificar nada
    #[arg(long)]
    dry_run: bool,

    /// Distancia (km) usada cuando el vehículo no tiene historial
    #[arg(long)]
    default_distance: Option<i64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args = Args::parse();
    let config = EnvironmentConfig::from_env().context("invalid configuration")?;
    init_tracing(&config.log_level);

    let store = open_store(&config).await.context("could not open the fleet store")?;
    let authenticator = Arc::new(ChainAuthenticator::from_config(&config).context("invalid HR client configuration")?);
    // El almacén en memoria muere con el proceso: basta con el log
    let notifier: Arc<dyn Notifier> = match config.storage_backend {
        StorageBackend::Postgres => Arc::new(StoreNotifier::new(store.clone())),
        StorageBackend::Memory => Arc::new(TracingNotifier),
    };
    let state = AppState::new(config, store, authenticator, notifier);

    let mut options = state.sweep_options(args.dry_run);
    if let Some(hours) = args.hours {
        options.timeout_hours = hours;
    }
    if let Some(distance) = args.default_distance {
        options.default_distance = distance;
    }

    info!(
        "⏰ Buscando viajes en curso de más de {} horas{}",
        options.timeout_hours,
        if options.dry_run { " (dry-run)" } else { "" }
    );
    let report = state.auto_end.run_sweep(options).await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    if report.failed > 0 {
        anyhow::bail!("{} trips could not be ended", report.failed);
    }
    Ok(())
}
