//! Gestor de ciclo de vida del viaje
//!
//! `ongoing` → `completed` | `cancelled`. Los dos últimos son terminales.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::holds::VehicleHolds;
use super::vehicle_lifecycle;
use super::{LifecycleError, LifecycleResult, MAX_ODOMETER_KM};
use crate::models::{NewTrip, Trip, TripStatus, Vehicle};

/// Distancia media por defecto (km) cuando no hay historial
pub const DEFAULT_TRIP_DISTANCE_KM: i64 = 50;

/// Cantidad de viajes completados usados para estimar la distancia media
pub const ESTIMATE_HISTORY_LEN: i64 = 10;

fn ensure_ongoing(trip: &Trip, action: &str) -> LifecycleResult<()> {
    if trip.status != TripStatus::Ongoing {
        return Err(LifecycleError::invalid_state(format!(
            "Can only {} ongoing trips (trip {} is {})",
            action, trip.id, trip.status
        )));
    }
    Ok(())
}

/// Arranca un viaje sobre un vehículo disponible
pub fn begin(
    vehicle: &mut Vehicle,
    holds: &mut VehicleHolds,
    new: NewTrip,
    now: DateTime<Utc>,
) -> LifecycleResult<Trip> {
    if new.vehicle_id != vehicle.id {
        return Err(LifecycleError::invalid_state("Trip vehicle does not match the locked vehicle"));
    }
    // Primero la disponibilidad: un vehículo ocupado siempre es VehicleUnavailable
    vehicle_lifecycle::ensure_available(vehicle, holds)?;
    LifecycleError::ensure_odometer_in_range(new.start_odometer)?;
    if new.start_odometer < vehicle.current_odometer {
        return Err(LifecycleError::InvalidOdometer {
            reading: new.start_odometer,
            minimum: vehicle.current_odometer,
        });
    }

    let trip = Trip {
        id: Uuid::new_v4(),
        vehicle_id: new.vehicle_id,
        driver_id: new.driver_id,
        status: TripStatus::Ongoing,
        origin: new.origin,
        destination: new.destination,
        purpose: new.purpose,
        start_time: now,
        end_time: None,
        start_odometer: new.start_odometer,
        end_odometer: None,
        notes: String::new(),
        auto_ended: false,
        created_at: now,
    };

    vehicle_lifecycle::on_trip_start(vehicle, holds, trip.id)?;
    vehicle.current_odometer = vehicle.current_odometer.max(trip.start_odometer);
    Ok(trip)
}

pub fn end(
    trip: &mut Trip,
    vehicle: &mut Vehicle,
    holds: &mut VehicleHolds,
    end_odometer: i64,
    notes: Option<String>,
    now: DateTime<Utc>,
) -> LifecycleResult<()> {
    ensure_ongoing(trip, "end")?;
    vehicle_lifecycle::on_trip_end(vehicle, holds, trip.id, trip.start_odometer, end_odometer)?;

    trip.status = TripStatus::Completed;
    trip.end_odometer = Some(end_odometer);
    trip.end_time = Some(now);
    if let Some(notes) = notes.filter(|n| !n.trim().is_empty()) {
        trip.notes = notes;
    }
    Ok(())
}

pub fn cancel(
    trip: &mut Trip,
    vehicle: &mut Vehicle,
    holds: &mut VehicleHolds,
    reason: Option<String>,
    now: DateTime<Utc>,
) -> LifecycleResult<()> {
    ensure_ongoing(trip, "cancel")?;
    vehicle_lifecycle::on_trip_cancel(vehicle, holds, trip.id);

    trip.status = TripStatus::Cancelled;
    trip.end_time = Some(now);
    if let Some(reason) = reason.filter(|r| !r.trim().is_empty()) {
        trip.notes = if trip.notes.is_empty() {
            format!("Trip cancelled: {}", reason)
        } else {
            format!("Trip cancelled: {}\n{}", reason, trip.notes)
        };
    }
    Ok(())
}

/// Estima el odómetro final de un viaje abandonado.
///
/// Si el vehículo ya registra un odómetro superior al de inicio, se usa ese.
/// Si no, inicio + media de las distancias recientes (o `default_distance`).
/// El resultado siempre supera al odómetro inicial; si se saldría del rango
/// válido devuelve `OdometerOutOfRange`.
pub fn estimate_end_odometer(
    trip: &Trip,
    vehicle: &Vehicle,
    recent_distances: &[i64],
    default_distance: i64,
) -> LifecycleResult<i64> {
    if vehicle.current_odometer > trip.start_odometer {
        return Ok(vehicle.current_odometer);
    }

    let out_of_range = LifecycleError::OdometerOutOfRange {
        reading: trip.start_odometer,
        maximum: MAX_ODOMETER_KM,
    };
    let valid: Vec<i64> = recent_distances.iter().copied().filter(|d| *d > 0).collect();
    let average = if valid.is_empty() {
        default_distance
    } else {
        valid
            .iter()
            .try_fold(0i64, |total, d| total.checked_add(*d))
            .ok_or_else(|| out_of_range.clone())?
            / valid.len() as i64
    };

    let estimate = trip
        .start_odometer
        .checked_add(average.max(1))
        .ok_or_else(|| out_of_range.clone())?;
    if estimate > MAX_ODOMETER_KM {
        return Err(out_of_range);
    }
    Ok(estimate)
}
