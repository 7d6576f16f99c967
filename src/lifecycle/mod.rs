//! Núcleo de ciclo de vida
//!
//! Reglas de transición de vehículos, viajes, mantenimientos y accidentes,
//! más la validación de repostajes contra el odómetro.
//! Todo aquí es puro y síncrono: cada función valida primero y solo muta
//! cuando todas las comprobaciones pasaron, así que un error nunca deja
//! la entidad o el vehículo a medio actualizar.
//!
//! La persistencia atómica (bloqueo de fila + transacción) vive en
//! `repositories` y la orquestación en `services`.

pub mod accident_lifecycle;
pub mod fuel_lifecycle;
pub mod holds;
pub mod maintenance_lifecycle;
pub mod trip_lifecycle;
pub mod vehicle_lifecycle;

use thiserror::Error;
use uuid::Uuid;

pub use holds::{derive_status, Hold, VehicleHolds};

/// Lectura de odómetro más alta que se acepta (km)
pub const MAX_ODOMETER_KM: i64 = 10_000_000;

/// Errores de transición. Todos son recuperables en el borde de la request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// Operación desde un estado terminal o incorrecto
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// El odómetro final no supera al inicial (o retrocede)
    #[error("Invalid odometer: {reading} must be greater than {minimum}")]
    InvalidOdometer { reading: i64, minimum: i64 },

    /// Lectura por encima del máximo permitido
    #[error("Invalid odometer: {reading} exceeds {maximum}")]
    OdometerOutOfRange { reading: i64, maximum: i64 },

    /// El vehículo no está disponible para la operación
    #[error("Vehicle {vehicle_id} is unavailable (status: {status})")]
    VehicleUnavailable { vehicle_id: Uuid, status: String },

    /// La versión esperada del vehículo ya no es la actual
    #[error("Concurrent modification of vehicle {vehicle_id}: expected version {expected}, found {found}")]
    ConcurrencyConflict { vehicle_id: Uuid, expected: i64, found: i64 },
}

impl LifecycleError {
    pub fn invalid_state(message: impl Into<String>) -> Self {
        LifecycleError::InvalidState(message.into())
    }

    pub fn ensure_odometer_in_range(reading: i64) -> LifecycleResult<()> {
        if reading > MAX_ODOMETER_KM {
            return Err(LifecycleError::OdometerOutOfRange {
                reading,
                maximum: MAX_ODOMETER_KM,
            });
        }
        Ok(())
    }

    pub fn code(&self) -> &'static str {
        match self {
            LifecycleError::InvalidState(_) => "INVALID_STATE",
            LifecycleError::InvalidOdometer { .. } | LifecycleError::OdometerOutOfRange { .. } => "INVALID_ODOMETER",
            LifecycleError::VehicleUnavailable { .. } => "VEHICLE_UNAVAILABLE",
            LifecycleError::ConcurrencyConflict { .. } => "CONCURRENCY_CONFLICT",
        }
    }
}

pub type LifecycleResult<T> = Result<T, LifecycleError>;
