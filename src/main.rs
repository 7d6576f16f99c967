use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use tokio::signal;
use tracing::{error, info};

use fleet_management::config::EnvironmentConfig;
use fleet_management::database::open_store;
use fleet_management::services::{ChainAuthenticator, StoreNotifier};
use fleet_management::{create_router, init_tracing, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();
    let config = EnvironmentConfig::from_env().context("invalid configuration")?;
    init_tracing(&config.log_level);

    info!("🚗 Fleet Management API");
    info!("================================================");
    info!("🌍 Entorno: {}", config.environment);

    let store = match open_store(&config).await {
        Ok(store) => store,
        Err(e) => {
            error!("❌ Error inicializando el almacén: {}", e);
            return Err(anyhow::anyhow!("Error de base de datos: {}", e));
        }
    };

    let authenticator = Arc::new(ChainAuthenticator::from_config(&config).context("invalid HR client configuration")?);
    let notifier = Arc::new(StoreNotifier::new(store.clone()));
    let state = AppState::new(config.clone(), store, authenticator, notifier);

    if config.trip_auto_end_interval_minutes > 0 {
        spawn_auto_end_sweep(state.clone(), config.trip_auto_end_interval_minutes);
    } else {
        info!("⏸️ Barrido automático de viajes desactivado");
    }

    let app = create_router(state);
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    info!("🌐 Servidor iniciando en {}", config.server_url());
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health");
    info!("   POST /api/auth/login  |  GET /api/auth/me");
    info!("   /api/vehicles  /api/trips  /api/maintenance  /api/accidents");
    info!("   /api/users  /api/notifications  /api/reports");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!("❌ Error del servidor: {}", e);
            e
        })?;

    info!("👋 Servidor terminado");
    Ok(())
}

/// Barrido periódico de viajes abandonados
fn spawn_auto_end_sweep(state: AppState, interval_minutes: u64) {
    let options = state.sweep_options(false);
    info!(
        "⏰ Barrido de viajes cada {} min (umbral {} h)",
        interval_minutes, options.timeout_hours
    );

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_minutes * 60));
        loop {
            interval.tick().await;
            if let Err(e) = state.auto_end.run_sweep(options).await {
                error!("❌ Error en el barrido de viajes: {}", e);
            }
        }
    });
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo instalar el handler de Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo instalar el handler de SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
