//! Módulo de base de datos
//!
//! Maneja la conexión y migraciones con PostgreSQL

pub mod connection;

use std::sync::Arc;

use tracing::{info, warn};

pub use connection::{create_pool, run_migrations};

use crate::config::{EnvironmentConfig, StorageBackend};
use crate::repositories::{FleetStore, MemoryFleetStore, PgFleetStore};

/// Abre el almacén configurado; en PostgreSQL aplica las migraciones pendientes
pub async fn open_store(config: &EnvironmentConfig) -> Result<Arc<dyn FleetStore>, sqlx::Error> {
    match config.storage_backend {
        StorageBackend::Postgres => {
            let pool = create_pool(config).await?;
            run_migrations(&pool).await?;
            Ok(Arc::new(PgFleetStore::new(pool)))
        }
        StorageBackend::Memory => {
            warn!("⚠️ Usando almacén en memoria: los datos se pierden al reiniciar");
            info!("✅ Almacén en memoria inicializado");
            Ok(Arc::new(MemoryFleetStore::new()))
        }
    }
}
