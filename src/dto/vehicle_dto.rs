use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::lifecycle::{Hold, VehicleHolds};
use crate::models::{NewVehicle, Vehicle};
use crate::services::VehicleUpdate;
use crate::utils::validation::{clean_optional, validate_license_plate, validate_not_empty, validate_vin};

// Request para registrar un vehículo
#[derive(Debug, Deserialize, Validate)]
pub struct CreateVehicleRequest {
    #[validate(custom = "validate_license_plate")]
    pub license_plate: String,
    #[validate(custom = "validate_vin")]
    pub vin: String,
    #[validate(length(min = 1, max = 100), custom = "validate_not_empty")]
    pub make: String,
    #[validate(length(min = 1, max = 100), custom = "validate_not_empty")]
    pub model: String,
    #[validate(range(min = 1950, max = 2100))]
    pub year: i32,
    #[validate(length(max = 50))]
    pub color: Option<String>,
    #[validate(length(max = 50))]
    pub fuel_type: Option<String>,
    #[validate(range(min = 0, max = 10000000))]
    #[serde(default)]
    pub current_odometer: i64,
    pub acquisition_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: String,
}

impl From<CreateVehicleRequest> for NewVehicle {
    fn from(request: CreateVehicleRequest) -> Self {
        NewVehicle {
            license_plate: request.license_plate,
            vin: request.vin,
            make: request.make.trim().to_string(),
            model: request.model.trim().to_string(),
            year: request.year,
            color: clean_optional(request.color),
            fuel_type: clean_optional(request.fuel_type),
            current_odometer: request.current_odometer,
            acquisition_date: request.acquisition_date,
            notes: request.notes,
        }
    }
}

// Request para actualizar un vehículo. El estado no es editable.
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateVehicleRequest {
    #[validate(custom = "validate_license_plate")]
    pub license_plate: Option<String>,
    #[validate(custom = "validate_vin")]
    pub vin: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub make: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub model: Option<String>,
    #[validate(range(min = 1950, max = 2100))]
    pub year: Option<i32>,
    #[validate(length(max = 50))]
    pub color: Option<String>,
    #[validate(length(max = 50))]
    pub fuel_type: Option<String>,
    #[validate(range(min = 0, max = 10000000))]
    pub current_odometer: Option<i64>,
    pub acquisition_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub expected_version: Option<i64>,
}

impl From<UpdateVehicleRequest> for VehicleUpdate {
    fn from(request: UpdateVehicleRequest) -> Self {
        VehicleUpdate {
            license_plate: request.license_plate,
            vin: request.vin,
            make: request.make,
            model: request.model,
            year: request.year,
            color: clean_optional(request.color),
            fuel_type: clean_optional(request.fuel_type),
            current_odometer: request.current_odometer,
            acquisition_date: request.acquisition_date,
            notes: request.notes,
            expected_version: request.expected_version,
        }
    }
}

// Response de vehículo con sus retenciones activas
#[derive(Debug, Serialize)]
pub struct VehicleResponse {
    #[serde(flatten)]
    pub vehicle: Vehicle,
    pub display_name: String,
    pub holds: Vec<Hold>,
}

impl VehicleResponse {
    pub fn new(vehicle: Vehicle, holds: &VehicleHolds) -> Self {
        Self {
            display_name: vehicle.display_name(),
            holds: holds.iter().copied().collect(),
            vehicle,
        }
    }
}
