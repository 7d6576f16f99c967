use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::Trip;
use crate::services::StartTrip;

#[derive(Debug, Deserialize, Validate)]
pub struct StartTripRequest {
    pub vehicle_id: Uuid,
    #[validate(range(min = 0, max = 10000000))]
    pub start_odometer: i64,
    #[validate(length(min = 1, max = 255))]
    pub origin: String,
    #[validate(length(min = 1, max = 255))]
    pub destination: String,
    #[validate(length(min = 1, max = 255))]
    pub purpose: String,
}

impl From<StartTripRequest> for StartTrip {
    fn from(request: StartTripRequest) -> Self {
        StartTrip {
            vehicle_id: request.vehicle_id,
            start_odometer: request.start_odometer,
            origin: request.origin.trim().to_string(),
            destination: request.destination.trim().to_string(),
            purpose: request.purpose.trim().to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct EndTripRequest {
    #[validate(range(min = 0, max = 10000000))]
    pub end_odometer: i64,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct CancelTripRequest {
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

// Response de viaje con datos calculados
#[derive(Debug, Serialize)]
pub struct TripResponse {
    #[serde(flatten)]
    pub trip: Trip,
    pub distance_traveled: i64,
    pub duration: Option<String>,
}

impl From<Trip> for TripResponse {
    fn from(trip: Trip) -> Self {
        Self {
            distance_traveled: trip.distance_traveled(),
            duration: trip.duration(Utc::now()),
            trip,
        }
    }
}
