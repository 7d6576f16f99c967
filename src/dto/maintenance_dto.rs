use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::models::MaintenanceStatus;
use crate::services::{CreateMaintenance, MaintenanceStatusChange};
use crate::utils::validation::clean_optional;

fn default_status() -> MaintenanceStatus {
    MaintenanceStatus::Scheduled
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateMaintenanceRequest {
    pub vehicle_id: Uuid,
    #[validate(length(min = 1, max = 100))]
    pub maintenance_type: String,
    #[validate(length(max = 100))]
    pub provider: Option<String>,
    #[validate(length(min = 1, max = 2000))]
    pub description: String,
    #[validate(range(min = 0, max = 10000000))]
    pub odometer_reading: Option<i64>,
    #[serde(default = "default_status")]
    pub status: MaintenanceStatus,
    pub scheduled_date: Option<NaiveDate>,
    pub cost: Option<Decimal>,
    #[serde(default)]
    pub notes: String,
}

impl From<CreateMaintenanceRequest> for CreateMaintenance {
    fn from(request: CreateMaintenanceRequest) -> Self {
        CreateMaintenance {
            vehicle_id: request.vehicle_id,
            maintenance_type: request.maintenance_type.trim().to_string(),
            provider: clean_optional(request.provider),
            description: request.description,
            odometer_reading: request.odometer_reading,
            status: request.status,
            scheduled_date: request.scheduled_date,
            cost: request.cost,
            notes: request.notes,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct MaintenanceStatusRequest {
    pub status: MaintenanceStatus,
    pub cost: Option<Decimal>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

impl From<MaintenanceStatusRequest> for MaintenanceStatusChange {
    fn from(request: MaintenanceStatusRequest) -> Self {
        MaintenanceStatusChange {
            status: request.status,
            cost: request.cost,
            notes: request.notes,
        }
    }
}
