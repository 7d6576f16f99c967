//! Servicio de vehículos
//!
//! Alta, consulta, edición de datos descriptivos y retiro. El estado del
//! vehículo nunca se escribe desde aquí: lo deriva el ciclo de vida.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::info;
use uuid::Uuid;

use super::require_fleet_manager;
use crate::lifecycle::{vehicle_lifecycle, LifecycleError, VehicleHolds};
use crate::models::{NewVehicle, User, Vehicle, VehicleFilters};
use crate::repositories::FleetStore;
use crate::utils::errors::{not_found_error, AppResult};
use crate::utils::validation::{normalize_license_plate, normalize_vin};

/// Cambios parciales sobre los datos descriptivos
#[derive(Debug, Clone, Default)]
pub struct VehicleUpdate {
    pub license_plate: Option<String>,
    pub vin: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub color: Option<String>,
    pub fuel_type: Option<String>,
    pub current_odometer: Option<i64>,
    pub acquisition_date: Option<NaiveDate>,
    pub notes: Option<String>,
    /// Versión leída por el cliente; si no coincide ⇒ `ConcurrencyConflict`
    pub expected_version: Option<i64>,
}

#[derive(Clone)]
pub struct VehicleService {
    store: Arc<dyn FleetStore>,
}

impl VehicleService {
    pub fn new(store: Arc<dyn FleetStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, actor: &User, mut new: NewVehicle) -> AppResult<Vehicle> {
        require_fleet_manager(actor, "register vehicles")?;
        new.license_plate = normalize_license_plate(&new.license_plate);
        new.vin = normalize_vin(&new.vin);
        LifecycleError::ensure_odometer_in_range(new.current_odometer)?;

        let vehicle = Vehicle::register(new, Utc::now());
        let mut tx = self.store.begin().await?;
        tx.insert_vehicle(&vehicle).await?;
        tx.commit().await?;

        info!("🚗 Vehículo registrado: {} ({})", vehicle.display_name(), vehicle.id);
        Ok(vehicle)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Vehicle> {
        self.store
            .find_vehicle(id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", id))
    }

    pub async fn holds(&self, id: Uuid) -> AppResult<VehicleHolds> {
        self.store.vehicle_holds(id).await
    }

    pub async fn list(&self, filters: &VehicleFilters) -> AppResult<Vec<Vehicle>> {
        self.store.list_vehicles(filters).await
    }

    pub async fn update(&self, actor: &User, id: Uuid, changes: VehicleUpdate) -> AppResult<Vehicle> {
        require_fleet_manager(actor, "edit vehicles")?;

        let mut tx = self.store.begin().await?;
        let mut vehicle = tx.lock_vehicle(id).await?.ok_or_else(|| not_found_error("Vehicle", id))?;
        let expected = changes.expected_version.unwrap_or(vehicle.version);
        if expected != vehicle.version {
            return Err(LifecycleError::ConcurrencyConflict {
                vehicle_id: id,
                expected,
                found: vehicle.version,
            }
            .into());
        }

        if let Some(odometer) = changes.current_odometer {
            LifecycleError::ensure_odometer_in_range(odometer)?;
            // El odómetro nunca retrocede
            if odometer < vehicle.current_odometer {
                return Err(LifecycleError::InvalidOdometer {
                    reading: odometer,
                    minimum: vehicle.current_odometer,
                }
                .into());
            }
            vehicle.current_odometer = odometer;
        }
        if let Some(plate) = changes.license_plate {
            vehicle.license_plate = normalize_license_plate(&plate);
        }
        if let Some(vin) = changes.vin {
            vehicle.vin = normalize_vin(&vin);
        }
        if let Some(make) = changes.make {
            vehicle.make = make;
        }
        if let Some(model) = changes.model {
            vehicle.model = model;
        }
        if let Some(year) = changes.year {
            vehicle.year = year;
        }
        if changes.color.is_some() {
            vehicle.color = changes.color;
        }
        if changes.fuel_type.is_some() {
            vehicle.fuel_type = changes.fuel_type;
        }
        if changes.acquisition_date.is_some() {
            vehicle.acquisition_date = changes.acquisition_date;
        }
        if let Some(notes) = changes.notes {
            vehicle.notes = notes;
        }

        let saved = tx.save_vehicle(&vehicle, expected).await?;
        tx.commit().await?;

        info!("✏️ Vehículo {} actualizado (versión {})", saved.id, saved.version);
        Ok(saved)
    }

    pub async fn retire(&self, actor: &User, id: Uuid) -> AppResult<Vehicle> {
        require_fleet_manager(actor, "retire vehicles")?;

        let mut tx = self.store.begin().await?;
        let mut vehicle = tx.lock_vehicle(id).await?.ok_or_else(|| not_found_error("Vehicle", id))?;
        let holds = tx.vehicle_holds(id).await?;
        let expected = vehicle.version;

        vehicle_lifecycle::retire(&mut vehicle, &holds)?;
        let saved = tx.save_vehicle(&vehicle, expected).await?;
        tx.commit().await?;

        info!("🏁 Vehículo {} retirado", saved.license_plate);
        Ok(saved)
    }
}
