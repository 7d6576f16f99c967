//! Modelo de Trip
//!
//! Un viaje referencia un vehículo y un conductor. Mapea a la tabla `trips`.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::models::user::User;

/// Estado del viaje - mapea al ENUM trip_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "trip_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TripStatus {
    Ongoing,
    Completed,
    Cancelled,
}

impl TripStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripStatus::Ongoing => "ongoing",
            TripStatus::Completed => "completed",
            TripStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, TripStatus::Ongoing)
    }
}

impl std::fmt::Display for TripStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Trip {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub driver_id: Uuid,
    pub status: TripStatus,
    pub origin: String,
    pub destination: String,
    pub purpose: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub start_odometer: i64,
    pub end_odometer: Option<i64>,
    pub notes: String,
    /// Terminado por el barrido automático y no por el conductor
    pub auto_ended: bool,
    pub created_at: DateTime<Utc>,
}

/// Datos de arranque de un viaje
#[derive(Debug, Clone)]
pub struct NewTrip {
    pub vehicle_id: Uuid,
    pub driver_id: Uuid,
    pub start_odometer: i64,
    pub origin: String,
    pub destination: String,
    pub purpose: String,
}

impl Trip {
    pub fn is_active(&self) -> bool {
        self.status == TripStatus::Ongoing
    }

    pub fn distance_traveled(&self) -> i64 {
        self.end_odometer
            .map(|end| (end - self.start_odometer).max(0))
            .unwrap_or(0)
    }

    /// Duración del viaje; para viajes en curso se mide hasta `now`
    pub fn elapsed(&self, now: DateTime<Utc>) -> Option<Duration> {
        match (self.end_time, self.status) {
            (Some(end), _) => Some(end - self.start_time),
            (None, TripStatus::Ongoing) => Some(now - self.start_time),
            _ => None,
        }
    }

    /// Duración con formato "1d 2h 5m", "5m" o "30s"
    pub fn duration(&self, now: DateTime<Utc>) -> Option<String> {
        let total_seconds = self.elapsed(now)?.num_seconds().max(0);
        let days = total_seconds / (24 * 3600);
        let hours = (total_seconds / 3600) % 24;
        let minutes = (total_seconds / 60) % 60;
        let seconds = total_seconds % 60;

        let mut parts = Vec::new();
        if days > 0 {
            parts.push(format!("{}d", days));
        }
        if hours > 0 {
            parts.push(format!("{}h", hours));
        }
        if minutes > 0 {
            parts.push(format!("{}m", minutes));
        }
        if parts.is_empty() {
            if seconds > 0 {
                parts.push(format!("{}s", seconds));
            } else {
                parts.push("0m".to_string());
            }
        }
        Some(parts.join(" "))
    }

    /// Solo el conductor del viaje o un gestor de flota puede cerrarlo
    pub fn can_be_ended_by(&self, user: &User) -> bool {
        user.id == self.driver_id || user.user_type.is_fleet_manager()
    }

    pub fn route_summary(&self) -> String {
        format!("{} → {}", self.origin, self.destination)
    }
}

/// Filtros para el listado de viajes
#[derive(Debug, Default, Clone, Deserialize)]
pub struct TripFilters {
    pub status: Option<TripStatus>,
    pub vehicle_id: Option<Uuid>,
    pub driver_id: Option<Uuid>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
