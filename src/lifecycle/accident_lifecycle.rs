//! Ciclo de vida del accidente
//!
//! Cualquier cambio entre estados sin resolver está permitido; `resolved`
//! es terminal. Las reparaciones siempre inmovilizan el vehículo.
//!
//! Un vehículo inmovilizado por un accidente queda retenido por todos sus
//! accidentes abiertos, así que solo vuelve a estar disponible cuando se
//! resuelve el último.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::holds::VehicleHolds;
use super::vehicle_lifecycle;
use super::{LifecycleError, LifecycleResult};
use crate::models::{Accident, AccidentStatus, NewAccident, Vehicle};

pub fn report(
    vehicle: &mut Vehicle,
    holds: &mut VehicleHolds,
    new: NewAccident,
    now: DateTime<Utc>,
) -> LifecycleResult<Accident> {
    if new.vehicle_id != vehicle.id {
        return Err(LifecycleError::invalid_state("Accident vehicle does not match the locked vehicle"));
    }

    let mut accident = Accident {
        id: Uuid::new_v4(),
        vehicle_id: new.vehicle_id,
        driver_id: new.driver_id,
        occurred_at: new.occurred_at,
        location: new.location,
        description: new.description,
        damage_description: new.damage_description,
        third_party_involved: new.third_party_involved,
        injuries: new.injuries,
        police_report_number: new.police_report_number,
        estimated_cost: new.estimated_cost,
        actual_cost: None,
        status: AccidentStatus::Reported,
        grounds_vehicle: false,
        resolution_date: None,
        notes: new.notes,
        created_at: now,
        updated_at: now,
    };

    accident.grounds_vehicle = vehicle_lifecycle::on_accident_reported(vehicle, holds, accident.id);
    Ok(accident)
}

pub fn transition(
    accident: &mut Accident,
    vehicle: &mut Vehicle,
    holds: &mut VehicleHolds,
    to: AccidentStatus,
    now: DateTime<Utc>,
) -> LifecycleResult<()> {
    if accident.status.is_resolved() {
        return Err(LifecycleError::invalid_state(format!(
            "Accident {} is already resolved",
            accident.id
        )));
    }
    if accident.status == to {
        return Err(LifecycleError::invalid_state(format!(
            "Accident {} is already {}",
            accident.id, to
        )));
    }

    if to.is_resolved() {
        vehicle_lifecycle::on_accident_resolved(vehicle, holds, accident.id);
        accident.resolution_date = Some(now.date_naive());
    } else if to.is_repair() {
        vehicle_lifecycle::on_accident_repair(vehicle, holds, accident.id);
        accident.grounds_vehicle = true;
    }

    accident.status = to;
    accident.updated_at = now;
    Ok(())
}

/// Extiende la inmovilización de `trigger` a los demás accidentes abiertos
/// del vehículo. Devuelve los ids de los accidentes que cambiaron y que hay
/// que volver a escribir.
pub fn ground_open_accidents(
    trigger: &Accident,
    vehicle: &mut Vehicle,
    holds: &mut VehicleHolds,
    open: &mut [Accident],
    now: DateTime<Utc>,
) -> Vec<Uuid> {
    if !trigger.holds_vehicle() {
        return Vec::new();
    }

    let mut grounded = Vec::new();
    for other in open.iter_mut() {
        let skip = other.id == trigger.id
            || other.vehicle_id != vehicle.id
            || other.grounds_vehicle
            || other.status.is_resolved();
        if skip {
            continue;
        }
        vehicle_lifecycle::on_accident_repair(vehicle, holds, other.id);
        other.grounds_vehicle = true;
        other.updated_at = now;
        grounded.push(other.id);
    }
    grounded
}
