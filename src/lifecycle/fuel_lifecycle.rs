//! Registro de repostajes
//!
//! Un repostaje no cambia el estado del vehículo, pero su lectura de
//! odómetro nunca puede adelantarse a la del vehículo.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::{LifecycleError, LifecycleResult};
use crate::models::{FuelTransaction, NewFuelTransaction, Vehicle, ELECTRIC_FUEL_TYPE};

pub fn record(
    vehicle: &Vehicle,
    new: NewFuelTransaction,
    total_cost: Decimal,
    now: DateTime<Utc>,
) -> LifecycleResult<FuelTransaction> {
    if new.vehicle_id != vehicle.id {
        return Err(LifecycleError::invalid_state("Fuel transaction vehicle does not match the locked vehicle"));
    }
    if vehicle.is_retired() {
        return Err(LifecycleError::invalid_state(format!(
            "Vehicle {} is retired and cannot be refueled",
            vehicle.id
        )));
    }
    if new.odometer_reading > vehicle.current_odometer {
        return Err(LifecycleError::OdometerOutOfRange {
            reading: new.odometer_reading,
            maximum: vehicle.current_odometer,
        });
    }

    let fuel_type = match new.fuel_type.filter(|f| !f.trim().is_empty()) {
        Some(fuel_type) => fuel_type,
        None if vehicle.is_electric() => ELECTRIC_FUEL_TYPE.to_string(),
        None => vehicle.fuel_type.clone().unwrap_or_default(),
    };

    Ok(FuelTransaction {
        id: Uuid::new_v4(),
        vehicle_id: new.vehicle_id,
        driver_id: new.driver_id,
        date: new.date,
        fuel_type,
        quantity: new.quantity,
        cost_per_liter: new.cost_per_liter,
        energy_consumed: new.energy_consumed,
        cost_per_kwh: new.cost_per_kwh,
        total_cost,
        odometer_reading: new.odometer_reading,
        station_name: new.station_name,
        notes: new.notes,
        created_at: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewVehicle, VehicleStatus};
    use chrono::NaiveDate;

    fn vehicle(fuel_type: Option<&str>) -> Vehicle {
        Vehicle::register(
            NewVehicle {
                license_plate: "FUEL-1".to_string(),
                vin: "VINFUEL1".to_string(),
                make: "Nissan".to_string(),
                model: "Leaf".to_string(),
                year: 2022,
                color: None,
                fuel_type: fuel_type.map(str::to_string),
                current_odometer: 5_000,
                acquisition_date: None,
                notes: String::new(),
            },
            Utc::now(),
        )
    }

    fn refuel(vehicle: &Vehicle, odometer_reading: i64) -> NewFuelTransaction {
        NewFuelTransaction {
            vehicle_id: vehicle.id,
            driver_id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(),
            fuel_type: None,
            quantity: None,
            cost_per_liter: None,
            energy_consumed: None,
            cost_per_kwh: None,
            total_cost: None,
            odometer_reading,
            station_name: None,
            notes: String::new(),
        }
    }

    #[test]
    fn test_reading_cannot_pass_vehicle_odometer() {
        let v = vehicle(Some("Diesel"));
        let err = record(&v, refuel(&v, 5_001), Decimal::ONE, Utc::now()).unwrap_err();
        assert_eq!(
            err,
            LifecycleError::OdometerOutOfRange {
                reading: 5_001,
                maximum: 5_000
            }
        );

        let tx = record(&v, refuel(&v, 5_000), Decimal::ONE, Utc::now()).unwrap();
        assert_eq!(tx.fuel_type, "Diesel");
        assert_eq!(tx.odometer_reading, 5_000);
    }

    #[test]
    fn test_electric_vehicle_defaults_fuel_type() {
        let v = vehicle(Some("electric"));
        let tx = record(&v, refuel(&v, 4_900), Decimal::TEN, Utc::now()).unwrap();
        assert_eq!(tx.fuel_type, ELECTRIC_FUEL_TYPE);
        assert!(tx.is_electric());
    }

    #[test]
    fn test_retired_vehicle_rejected() {
        let mut v = vehicle(None);
        v.status = VehicleStatus::Retired;
        let err = record(&v, refuel(&v, 100), Decimal::ONE, Utc::now()).unwrap_err();
        assert_eq!(err.code(), "INVALID_STATE");
    }
}
