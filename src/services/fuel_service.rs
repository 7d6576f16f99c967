//! Servicio de repostajes
//!
//! Cualquier usuario aprobado registra repostajes; los conductores solo a
//! su nombre. La lectura del odómetro se compara con la del vehículo con
//! la fila bloqueada, para que un cierre de viaje concurrente no la adelante.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use super::require_approved;
use crate::lifecycle::fuel_lifecycle;
use crate::models::{FuelFilters, FuelTransaction, NewFuelTransaction, User};
use crate::repositories::FleetStore;
use crate::utils::errors::{forbidden_error, not_found_error, AppError, AppResult};

#[derive(Debug, Clone)]
pub struct RecordFuel {
    pub vehicle_id: Uuid,
    /// Solo un gestor puede registrar a nombre de otro conductor
    pub driver_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
    pub fuel_type: Option<String>,
    pub quantity: Option<Decimal>,
    pub cost_per_liter: Option<Decimal>,
    pub energy_consumed: Option<Decimal>,
    pub cost_per_kwh: Option<Decimal>,
    pub total_cost: Option<Decimal>,
    pub odometer_reading: i64,
    pub station_name: Option<String>,
    pub notes: String,
}

#[derive(Clone)]
pub struct FuelService {
    store: Arc<dyn FleetStore>,
}

impl FuelService {
    pub fn new(store: Arc<dyn FleetStore>) -> Self {
        Self { store }
    }

    pub async fn record(&self, actor: &User, input: RecordFuel) -> AppResult<FuelTransaction> {
        require_approved(actor, "record fuel")?;
        let driver_id = input.driver_id.unwrap_or(actor.id);
        if driver_id != actor.id {
            if !actor.user_type.is_fleet_manager() {
                return Err(forbidden_error("record fuel", "drivers can only record their own fuel"));
            }
            self.store
                .find_user(driver_id)
                .await?
                .ok_or_else(|| not_found_error("User", driver_id))?;
        }
        let now = Utc::now();

        let mut tx = self.store.begin().await?;
        let vehicle = tx
            .lock_vehicle(input.vehicle_id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", input.vehicle_id))?;

        let new = NewFuelTransaction {
            vehicle_id: input.vehicle_id,
            driver_id,
            date: input.date.unwrap_or_else(|| now.date_naive()),
            fuel_type: input.fuel_type,
            quantity: input.quantity,
            cost_per_liter: input.cost_per_liter,
            energy_consumed: input.energy_consumed,
            cost_per_kwh: input.cost_per_kwh,
            total_cost: input.total_cost,
            odometer_reading: input.odometer_reading,
            station_name: input.station_name,
            notes: input.notes,
        };
        let total_cost = new.resolve_total_cost(vehicle.is_electric()).ok_or_else(|| {
            let unit = if vehicle.is_electric() { "energy and cost per kWh" } else { "quantity and cost per liter" };
            AppError::BadRequest(format!("total_cost is required unless {} are given", unit))
        })?;

        let transaction = fuel_lifecycle::record(&vehicle, new, total_cost, now)?;
        tx.insert_fuel_transaction(&transaction).await?;
        tx.commit().await?;

        info!(
            "⛽ Repostaje {} registrado para {}: {} ({} km)",
            transaction.id, vehicle.license_plate, transaction.total_cost, transaction.odometer_reading
        );
        Ok(transaction)
    }

    pub async fn get(&self, actor: &User, id: Uuid) -> AppResult<FuelTransaction> {
        let transaction = self
            .store
            .find_fuel_transaction(id)
            .await?
            .ok_or_else(|| not_found_error("FuelTransaction", id))?;
        if transaction.driver_id != actor.id && !actor.user_type.is_fleet_manager() {
            return Err(forbidden_error("view fuel transaction", "transaction belongs to another driver"));
        }
        Ok(transaction)
    }

    pub async fn list(&self, actor: &User, mut filters: FuelFilters) -> AppResult<Vec<FuelTransaction>> {
        if !actor.user_type.is_fleet_manager() {
            filters.driver_id = Some(actor.id);
        }
        self.store.list_fuel_transactions(&filters).await
    }
}
