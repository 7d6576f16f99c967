use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::models::AccidentStatus;
use crate::services::{AccidentStatusChange, ReportAccident};
use crate::utils::validation::clean_optional;

#[derive(Debug, Deserialize, Validate)]
pub struct ReportAccidentRequest {
    pub vehicle_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub occurred_at: DateTime<Utc>,
    #[validate(length(min = 1, max = 255))]
    pub location: String,
    #[validate(length(min = 1, max = 4000))]
    pub description: String,
    #[validate(length(min = 1, max = 4000))]
    pub damage_description: String,
    #[serde(default)]
    pub third_party_involved: bool,
    #[serde(default)]
    pub injuries: bool,
    #[validate(length(max = 100))]
    pub police_report_number: Option<String>,
    pub estimated_cost: Option<Decimal>,
    #[serde(default)]
    pub notes: String,
}

impl From<ReportAccidentRequest> for ReportAccident {
    fn from(request: ReportAccidentRequest) -> Self {
        ReportAccident {
            vehicle_id: request.vehicle_id,
            driver_id: request.driver_id,
            occurred_at: request.occurred_at,
            location: request.location.trim().to_string(),
            description: request.description,
            damage_description: request.damage_description,
            third_party_involved: request.third_party_involved,
            injuries: request.injuries,
            police_report_number: clean_optional(request.police_report_number),
            estimated_cost: request.estimated_cost,
            notes: request.notes,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct AccidentStatusRequest {
    pub status: AccidentStatus,
    pub actual_cost: Option<Decimal>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

impl From<AccidentStatusRequest> for AccidentStatusChange {
    fn from(request: AccidentStatusRequest) -> Self {
        AccidentStatusChange {
            status: request.status,
            actual_cost: request.actual_cost,
            notes: request.notes,
        }
    }
}
