//! Modelo de Accident

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Estado del accidente - mapea al ENUM accident_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "accident_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AccidentStatus {
    Reported,
    UnderInvestigation,
    RepairScheduled,
    RepairInProgress,
    Resolved,
}

impl AccidentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccidentStatus::Reported => "reported",
            AccidentStatus::UnderInvestigation => "under_investigation",
            AccidentStatus::RepairScheduled => "repair_scheduled",
            AccidentStatus::RepairInProgress => "repair_in_progress",
            AccidentStatus::Resolved => "resolved",
        }
    }

    pub fn is_resolved(&self) -> bool {
        *self == AccidentStatus::Resolved
    }

    pub fn is_repair(&self) -> bool {
        matches!(self, AccidentStatus::RepairScheduled | AccidentStatus::RepairInProgress)
    }
}

impl std::fmt::Display for AccidentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Accident {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub driver_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub location: String,
    pub description: String,
    pub damage_description: String,
    pub third_party_involved: bool,
    pub injuries: bool,
    pub police_report_number: Option<String>,
    pub estimated_cost: Option<Decimal>,
    pub actual_cost: Option<Decimal>,
    pub status: AccidentStatus,
    /// El accidente mantiene el vehículo fuera de servicio mientras no se resuelva
    pub grounds_vehicle: bool,
    pub resolution_date: Option<NaiveDate>,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAccident {
    pub vehicle_id: Uuid,
    pub driver_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub location: String,
    pub description: String,
    pub damage_description: String,
    pub third_party_involved: bool,
    pub injuries: bool,
    pub police_report_number: Option<String>,
    pub estimated_cost: Option<Decimal>,
    pub notes: String,
}

impl Accident {
    pub fn holds_vehicle(&self) -> bool {
        self.grounds_vehicle && !self.status.is_resolved()
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct AccidentFilters {
    pub status: Option<AccidentStatus>,
    pub vehicle_id: Option<Uuid>,
}
