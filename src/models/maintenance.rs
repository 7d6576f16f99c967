//! Modelo de Maintenance
//!
//! Registros de mantenimiento de un vehículo. Mapea a `maintenance_records`.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Estado del mantenimiento - mapea al ENUM maintenance_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "maintenance_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl MaintenanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaintenanceStatus::Scheduled => "scheduled",
            MaintenanceStatus::InProgress => "in_progress",
            MaintenanceStatus::Completed => "completed",
            MaintenanceStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, MaintenanceStatus::Completed | MaintenanceStatus::Cancelled)
    }
}

impl std::fmt::Display for MaintenanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Maintenance {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub reported_by: Uuid,
    pub maintenance_type: String,
    pub provider: Option<String>,
    pub description: String,
    pub odometer_reading: i64,
    pub status: MaintenanceStatus,
    pub scheduled_date: Option<NaiveDate>,
    pub completion_date: Option<NaiveDate>,
    pub cost: Option<Decimal>,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMaintenance {
    pub vehicle_id: Uuid,
    pub reported_by: Uuid,
    pub maintenance_type: String,
    pub provider: Option<String>,
    pub description: String,
    pub odometer_reading: i64,
    pub status: MaintenanceStatus,
    pub scheduled_date: Option<NaiveDate>,
    pub cost: Option<Decimal>,
    pub notes: String,
}

impl Maintenance {
    pub fn is_active(&self) -> bool {
        self.status == MaintenanceStatus::InProgress
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct MaintenanceFilters {
    pub status: Option<MaintenanceStatus>,
    pub vehicle_id: Option<Uuid>,
}
