//! Modelo de Vehicle
//!
//! Este módulo contiene el struct Vehicle y su estado de disponibilidad.
//! Mapea exactamente a la tabla `vehicles` del schema PostgreSQL.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

/// Estado del vehículo - mapea al ENUM vehicle_status
///
/// Nunca se escribe directamente: siempre es el resultado de
/// [`crate::lifecycle::holds::derive_status`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[sqlx(type_name = "vehicle_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VehicleStatus {
    Available,
    InUse,
    Maintenance,
    Retired,
}

impl VehicleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleStatus::Available => "available",
            VehicleStatus::InUse => "in_use",
            VehicleStatus::Maintenance => "maintenance",
            VehicleStatus::Retired => "retired",
        }
    }

    pub fn all() -> [VehicleStatus; 4] {
        [
            VehicleStatus::Available,
            VehicleStatus::InUse,
            VehicleStatus::Maintenance,
            VehicleStatus::Retired,
        ]
    }
}

impl std::fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Vehicle principal - mapea exactamente a la tabla vehicles
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Vehicle {
    pub id: Uuid,
    pub license_plate: String,
    pub vin: String,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub color: Option<String>,
    pub fuel_type: Option<String>,
    pub status: VehicleStatus,
    pub current_odometer: i64,
    pub acquisition_date: Option<NaiveDate>,
    pub notes: String,
    /// Versión para compare-and-swap en cada escritura
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Datos para registrar un vehículo nuevo (ya validados)
#[derive(Debug, Clone)]
pub struct NewVehicle {
    pub license_plate: String,
    pub vin: String,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub color: Option<String>,
    pub fuel_type: Option<String>,
    pub current_odometer: i64,
    pub acquisition_date: Option<NaiveDate>,
    pub notes: String,
}

impl Vehicle {
    /// Crear un vehículo disponible a partir de los datos de alta
    pub fn register(new: NewVehicle, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            license_plate: new.license_plate,
            vin: new.vin,
            make: new.make,
            model: new.model,
            year: new.year,
            color: new.color,
            fuel_type: new.fuel_type,
            status: VehicleStatus::Available,
            current_odometer: new.current_odometer,
            acquisition_date: new.acquisition_date,
            notes: new.notes,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == VehicleStatus::Available
    }

    pub fn is_in_use(&self) -> bool {
        self.status == VehicleStatus::InUse
    }

    pub fn is_under_maintenance(&self) -> bool {
        self.status == VehicleStatus::Maintenance
    }

    pub fn is_retired(&self) -> bool {
        self.status == VehicleStatus::Retired
    }

    /// Vehículo eléctrico: carga en kWh en lugar de litros
    pub fn is_electric(&self) -> bool {
        self.fuel_type
            .as_deref()
            .is_some_and(|f| f.trim().eq_ignore_ascii_case("electric"))
    }

    pub fn display_name(&self) -> String {
        format!("{} {} ({})", self.make, self.model, self.license_plate)
    }
}

/// Filtros para búsqueda de vehículos
#[derive(Debug, Default, Clone, Deserialize)]
pub struct VehicleFilters {
    pub status: Option<VehicleStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
