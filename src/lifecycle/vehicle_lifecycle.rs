//! Gestor de ciclo de vida del vehículo
//!
//! Recibe los eventos de viajes, mantenimientos y accidentes, adquiere o
//! libera la retención correspondiente y recalcula `Vehicle.status`.

use tracing::debug;
use uuid::Uuid;

use super::holds::{derive_status, Hold, VehicleHolds};
use super::{LifecycleError, LifecycleResult};
use crate::models::{Vehicle, VehicleStatus};

fn apply(vehicle: &mut Vehicle, holds: &VehicleHolds) {
    let next = derive_status(vehicle.is_retired(), holds);
    if next != vehicle.status {
        debug!("🚗 Vehículo {}: {} → {}", vehicle.id, vehicle.status, next);
    }
    vehicle.status = next;
}

fn unavailable(vehicle: &Vehicle) -> LifecycleError {
    LifecycleError::VehicleUnavailable {
        vehicle_id: vehicle.id,
        status: vehicle.status.to_string(),
    }
}

/// El vehículo debe estar libre: sin retenciones y no retirado
pub fn ensure_available(vehicle: &Vehicle, holds: &VehicleHolds) -> LifecycleResult<()> {
    if vehicle.status != VehicleStatus::Available || !holds.is_empty() {
        return Err(unavailable(vehicle));
    }
    Ok(())
}

pub fn on_trip_start(vehicle: &mut Vehicle, holds: &mut VehicleHolds, trip_id: Uuid) -> LifecycleResult<()> {
    ensure_available(vehicle, holds)?;
    holds.acquire(Hold::Trip(trip_id));
    apply(vehicle, holds);
    Ok(())
}

pub fn on_trip_end(
    vehicle: &mut Vehicle,
    holds: &mut VehicleHolds,
    trip_id: Uuid,
    start_odometer: i64,
    end_odometer: i64,
) -> LifecycleResult<()> {
    if end_odometer <= start_odometer {
        return Err(LifecycleError::InvalidOdometer {
            reading: end_odometer,
            minimum: start_odometer,
        });
    }
    LifecycleError::ensure_odometer_in_range(end_odometer)?;
    holds.release(&Hold::Trip(trip_id));
    vehicle.current_odometer = vehicle.current_odometer.max(end_odometer);
    apply(vehicle, holds);
    Ok(())
}

pub fn on_trip_cancel(vehicle: &mut Vehicle, holds: &mut VehicleHolds, trip_id: Uuid) {
    holds.release(&Hold::Trip(trip_id));
    apply(vehicle, holds);
}

pub fn on_maintenance_start(vehicle: &mut Vehicle, holds: &mut VehicleHolds, maintenance_id: Uuid) -> LifecycleResult<()> {
    if vehicle.is_retired() {
        return Err(LifecycleError::invalid_state(format!(
            "Vehicle {} is retired and cannot enter maintenance",
            vehicle.license_plate
        )));
    }
    holds.acquire(Hold::Maintenance(maintenance_id));
    apply(vehicle, holds);
    Ok(())
}

/// Libera el mantenimiento (completado o cancelado). El vehículo solo queda
/// disponible si no queda ninguna otra retención.
pub fn on_maintenance_complete(vehicle: &mut Vehicle, holds: &mut VehicleHolds, maintenance_id: Uuid) {
    holds.release(&Hold::Maintenance(maintenance_id));
    apply(vehicle, holds);
}

/// Devuelve si el accidente inmoviliza el vehículo.
///
/// Un vehículo en uso (o ya retenido) queda en mantenimiento; un accidente
/// declarado sobre un vehículo disponible se registra sin inmovilizarlo
/// hasta que entre en reparación.
pub fn on_accident_reported(vehicle: &mut Vehicle, holds: &mut VehicleHolds, accident_id: Uuid) -> bool {
    let grounds = matches!(vehicle.status, VehicleStatus::InUse | VehicleStatus::Maintenance);
    if grounds {
        holds.acquire(Hold::Accident(accident_id));
        apply(vehicle, holds);
    }
    grounds
}

/// El accidente entra en reparación: siempre inmoviliza
pub fn on_accident_repair(vehicle: &mut Vehicle, holds: &mut VehicleHolds, accident_id: Uuid) {
    holds.acquire(Hold::Accident(accident_id));
    apply(vehicle, holds);
}

pub fn on_accident_resolved(vehicle: &mut Vehicle, holds: &mut VehicleHolds, accident_id: Uuid) {
    holds.release(&Hold::Accident(accident_id));
    apply(vehicle, holds);
}

/// Retirar exige que no quede ninguna retención
pub fn retire(vehicle: &mut Vehicle, holds: &VehicleHolds) -> LifecycleResult<()> {
    if vehicle.is_retired() {
        return Err(LifecycleError::invalid_state(format!(
            "Vehicle {} is already retired",
            vehicle.license_plate
        )));
    }
    if !holds.is_empty() {
        return Err(unavailable(vehicle));
    }
    vehicle.status = VehicleStatus::Retired;
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::NewVehicle;
    use chrono::Utc;

    pub(crate) fn vehicle(odometer: i64) -> Vehicle {
        Vehicle::register(
            NewVehicle {
                license_plate: "KA01AB1234".to_string(),
                vin: "MA3EWDE1S00123456".to_string(),
                make: "Tata".to_string(),
                model: "Ace".to_string(),
                year: 2021,
                color: Some("White".to_string()),
                fuel_type: Some("Diesel".to_string()),
                current_odometer: odometer,
                acquisition_date: None,
                notes: String::new(),
            },
            Utc::now(),
        )
    }

    #[test]
    fn test_trip_start_and_end() {
        let mut v = vehicle(1000);
        let mut holds = VehicleHolds::new();
        let trip = Uuid::new_v4();

        on_trip_start(&mut v, &mut holds, trip).unwrap();
        assert_eq!(v.status, VehicleStatus::InUse);

        on_trip_end(&mut v, &mut holds, trip, 1000, 1050).unwrap();
        assert_eq!(v.status, VehicleStatus::Available);
        assert_eq!(v.current_odometer, 1050);
    }

    #[test]
    fn test_trip_end_rejects_regression_without_mutation() {
        let mut v = vehicle(1000);
        let mut holds = VehicleHolds::new();
        let trip = Uuid::new_v4();
        on_trip_start(&mut v, &mut holds, trip).unwrap();

        let err = on_trip_end(&mut v, &mut holds, trip, 1000, 1000).unwrap_err();
        assert_eq!(err, LifecycleError::InvalidOdometer { reading: 1000, minimum: 1000 });
        assert_eq!(v.status, VehicleStatus::InUse);
        assert_eq!(v.current_odometer, 1000);
        assert!(holds.contains(&Hold::Trip(trip)));
    }

    #[test]
    fn test_odometer_never_decreases() {
        let mut v = vehicle(2000);
        let mut holds = VehicleHolds::from_holds([Hold::Trip(Uuid::nil())]);
        v.status = VehicleStatus::InUse;
        on_trip_end(&mut v, &mut holds, Uuid::nil(), 1000, 1500).unwrap();
        assert_eq!(v.current_odometer, 2000);
    }

    #[test]
    fn test_trip_start_on_grounded_vehicle_fails() {
        let mut v = vehicle(0);
        let mut holds = VehicleHolds::new();
        on_maintenance_start(&mut v, &mut holds, Uuid::new_v4()).unwrap();

        let err = on_trip_start(&mut v, &mut holds, Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, LifecycleError::VehicleUnavailable { .. }));
        assert_eq!(v.status, VehicleStatus::Maintenance);
        assert_eq!(holds.len(), 1);
    }

    #[test]
    fn test_maintenance_completion_respects_accident_hold() {
        let mut v = vehicle(0);
        let mut holds = VehicleHolds::new();
        let m = Uuid::new_v4();
        on_maintenance_start(&mut v, &mut holds, m).unwrap();
        assert!(on_accident_reported(&mut v, &mut holds, Uuid::new_v4()));

        on_maintenance_complete(&mut v, &mut holds, m);
        assert_eq!(v.status, VehicleStatus::Maintenance);
    }

    #[test]
    fn test_accident_on_available_vehicle_does_not_ground() {
        let mut v = vehicle(0);
        let mut holds = VehicleHolds::new();
        let a = Uuid::new_v4();
        assert!(!on_accident_reported(&mut v, &mut holds, a));
        assert_eq!(v.status, VehicleStatus::Available);

        on_accident_repair(&mut v, &mut holds, a);
        assert_eq!(v.status, VehicleStatus::Maintenance);
        on_accident_resolved(&mut v, &mut holds, a);
        assert_eq!(v.status, VehicleStatus::Available);
    }

    #[test]
    fn test_retire_requires_no_holds() {
        let mut v = vehicle(0);
        let holds = VehicleHolds::from_holds([Hold::Trip(Uuid::new_v4())]);
        assert!(retire(&mut v, &holds).is_err());

        retire(&mut v, &VehicleHolds::new()).unwrap();
        assert_eq!(v.status, VehicleStatus::Retired);
        assert!(matches!(
            retire(&mut v, &VehicleHolds::new()),
            Err(LifecycleError::InvalidState(_))
        ));
        assert!(on_maintenance_start(&mut v, &mut VehicleHolds::new(), Uuid::new_v4()).is_err());
    }
}
