//! Ciclo de vida del mantenimiento
//!
//! `scheduled` → `in_progress` → `completed` | `cancelled`, y también
//! `scheduled` → `completed` | `cancelled`. Entrar en `in_progress` retiene el
//! vehículo; salir de `in_progress` lo libera.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::holds::VehicleHolds;
use super::vehicle_lifecycle;
use super::{LifecycleError, LifecycleResult};
use crate::models::{Maintenance, MaintenanceStatus, NewMaintenance, Vehicle};

fn is_allowed(from: MaintenanceStatus, to: MaintenanceStatus) -> bool {
    use MaintenanceStatus::*;
    matches!(
        (from, to),
        (Scheduled, InProgress) | (Scheduled, Completed) | (Scheduled, Cancelled) | (InProgress, Completed) | (InProgress, Cancelled)
    )
}

/// Crea un registro en `scheduled` o directamente en `in_progress`
pub fn open(
    vehicle: &mut Vehicle,
    holds: &mut VehicleHolds,
    new: NewMaintenance,
    now: DateTime<Utc>,
) -> LifecycleResult<Maintenance> {
    if !matches!(new.status, MaintenanceStatus::Scheduled | MaintenanceStatus::InProgress) {
        return Err(LifecycleError::invalid_state(format!(
            "Maintenance cannot be created as {}",
            new.status
        )));
    }
    if new.vehicle_id != vehicle.id {
        return Err(LifecycleError::invalid_state("Maintenance vehicle does not match the locked vehicle"));
    }

    let record = Maintenance {
        id: Uuid::new_v4(),
        vehicle_id: new.vehicle_id,
        reported_by: new.reported_by,
        maintenance_type: new.maintenance_type,
        provider: new.provider,
        description: new.description,
        odometer_reading: new.odometer_reading,
        status: new.status,
        scheduled_date: new.scheduled_date,
        completion_date: None,
        cost: new.cost,
        notes: new.notes,
        created_at: now,
        updated_at: now,
    };

    if record.status == MaintenanceStatus::InProgress {
        vehicle_lifecycle::on_maintenance_start(vehicle, holds, record.id)?;
    }
    Ok(record)
}

pub fn transition(
    record: &mut Maintenance,
    vehicle: &mut Vehicle,
    holds: &mut VehicleHolds,
    to: MaintenanceStatus,
    now: DateTime<Utc>,
) -> LifecycleResult<()> {
    let from = record.status;
    if !is_allowed(from, to) {
        return Err(LifecycleError::invalid_state(format!(
            "Maintenance {} cannot move from {} to {}",
            record.id, from, to
        )));
    }

    if to == MaintenanceStatus::InProgress {
        vehicle_lifecycle::on_maintenance_start(vehicle, holds, record.id)?;
    } else if from == MaintenanceStatus::InProgress {
        vehicle_lifecycle::on_maintenance_complete(vehicle, holds, record.id);
    }

    record.status = to;
    if to == MaintenanceStatus::Completed {
        record.completion_date = Some(now.date_naive());
    }
    record.updated_at = now;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::vehicle_lifecycle::tests::vehicle;
    use crate::models::VehicleStatus;

    fn new_record(vehicle: &Vehicle, status: MaintenanceStatus) -> NewMaintenance {
        NewMaintenance {
            vehicle_id: vehicle.id,
            reported_by: Uuid::new_v4(),
            maintenance_type: "Oil Change".to_string(),
            provider: None,
            description: "Periodic service".to_string(),
            odometer_reading: vehicle.current_odometer,
            status,
            scheduled_date: None,
            cost: None,
            notes: String::new(),
        }
    }

    #[test]
    fn test_scheduled_then_in_progress_then_completed() {
        let mut v = vehicle(5000);
        let mut holds = VehicleHolds::new();
        let now = Utc::now();

        let input = new_record(&v, MaintenanceStatus::Scheduled);
        let mut m = open(&mut v, &mut holds, input, now).unwrap();
        assert_eq!(v.status, VehicleStatus::Available);

        transition(&mut m, &mut v, &mut holds, MaintenanceStatus::InProgress, now).unwrap();
        assert_eq!(v.status, VehicleStatus::Maintenance);

        transition(&mut m, &mut v, &mut holds, MaintenanceStatus::Completed, now).unwrap();
        assert_eq!(v.status, VehicleStatus::Available);
        assert_eq!(m.completion_date, Some(now.date_naive()));
    }

    #[test]
    fn test_create_in_progress_grounds_vehicle() {
        let mut v = vehicle(0);
        let mut holds = VehicleHolds::new();
        let input = new_record(&v, MaintenanceStatus::InProgress);
        let mut m = open(&mut v, &mut holds, input, Utc::now()).unwrap();
        assert_eq!(v.status, VehicleStatus::Maintenance);

        transition(&mut m, &mut v, &mut holds, MaintenanceStatus::Cancelled, Utc::now()).unwrap();
        assert_eq!(v.status, VehicleStatus::Available);
        assert!(m.completion_date.is_none());
    }

    #[test]
    fn test_terminal_states_reject_transitions() {
        let mut v = vehicle(0);
        let mut holds = VehicleHolds::new();
        let input = new_record(&v, MaintenanceStatus::Scheduled);
        let mut m = open(&mut v, &mut holds, input, Utc::now()).unwrap();
        transition(&mut m, &mut v, &mut holds, MaintenanceStatus::Cancelled, Utc::now()).unwrap();

        let err = transition(&mut m, &mut v, &mut holds, MaintenanceStatus::InProgress, Utc::now()).unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidState(_)));
        assert_eq!(m.status, MaintenanceStatus::Cancelled);
        assert_eq!(v.status, VehicleStatus::Available);
    }

    #[test]
    fn test_cannot_create_completed_record() {
        let mut v = vehicle(0);
        let mut holds = VehicleHolds::new();
        let input = new_record(&v, MaintenanceStatus::Completed);
        assert!(open(&mut v, &mut holds, input, Utc::now()).is_err());
    }
}
