use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::services::RecordFuel;
use crate::utils::validation::{clean_optional, validate_positive_amount};

#[derive(Debug, Deserialize, Validate)]
pub struct RecordFuelRequest {
    pub vehicle_id: Uuid,
    pub driver_id: Option<Uuid>,
    /// Por defecto, hoy
    pub date: Option<NaiveDate>,
    #[validate(length(max = 50))]
    pub fuel_type: Option<String>,
    #[validate(custom = "validate_positive_amount")]
    pub quantity: Option<Decimal>,
    #[validate(custom = "validate_positive_amount")]
    pub cost_per_liter: Option<Decimal>,
    #[validate(custom = "validate_positive_amount")]
    pub energy_consumed: Option<Decimal>,
    #[validate(custom = "validate_positive_amount")]
    pub cost_per_kwh: Option<Decimal>,
    #[validate(custom = "validate_positive_amount")]
    pub total_cost: Option<Decimal>,
    #[validate(range(min = 0, max = 10000000))]
    pub odometer_reading: i64,
    #[validate(length(max = 100))]
    pub station_name: Option<String>,
    #[serde(default)]
    pub notes: String,
}

impl From<RecordFuelRequest> for RecordFuel {
    fn from(request: RecordFuelRequest) -> Self {
        RecordFuel {
            vehicle_id: request.vehicle_id,
            driver_id: request.driver_id,
            date: request.date,
            fuel_type: clean_optional(request.fuel_type),
            quantity: request.quantity,
            cost_per_liter: request.cost_per_liter,
            energy_consumed: request.energy_consumed,
            cost_per_kwh: request.cost_per_kwh,
            total_cost: request.total_cost,
            odometer_reading: request.odometer_reading,
            station_name: clean_optional(request.station_name),
            notes: request.notes,
        }
    }
}
