//! Servicio de mantenimiento

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use super::notification_service::{NotificationMessage, NotificationService};
use super::require_fleet_manager;
use crate::lifecycle::maintenance_lifecycle;
use crate::models::{Maintenance, MaintenanceFilters, MaintenanceStatus, NewMaintenance, NotificationLevel, User};
use crate::repositories::FleetStore;
use crate::utils::errors::{not_found_error, AppResult};

#[derive(Debug, Clone)]
pub struct CreateMaintenance {
    pub vehicle_id: Uuid,
    pub maintenance_type: String,
    pub provider: Option<String>,
    pub description: String,
    /// Por defecto, el odómetro actual del vehículo
    pub odometer_reading: Option<i64>,
    pub status: MaintenanceStatus,
    pub scheduled_date: Option<NaiveDate>,
    pub cost: Option<Decimal>,
    pub notes: String,
}

#[derive(Debug, Clone)]
pub struct MaintenanceStatusChange {
    pub status: MaintenanceStatus,
    pub cost: Option<Decimal>,
    pub notes: Option<String>,
}

#[derive(Clone)]
pub struct MaintenanceService {
    store: Arc<dyn FleetStore>,
    notifications: NotificationService,
}

impl MaintenanceService {
    pub fn new(store: Arc<dyn FleetStore>, notifications: NotificationService) -> Self {
        Self { store, notifications }
    }

    pub async fn create(&self, actor: &User, input: CreateMaintenance) -> AppResult<Maintenance> {
        require_fleet_manager(actor, "record maintenance")?;
        let now = Utc::now();

        let mut tx = self.store.begin().await?;
        let mut vehicle = tx
            .lock_vehicle(input.vehicle_id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", input.vehicle_id))?;
        let mut holds = tx.vehicle_holds(vehicle.id).await?;
        let expected = vehicle.version;

        let odometer_reading = input.odometer_reading.unwrap_or(vehicle.current_odometer);
        let record = maintenance_lifecycle::open(
            &mut vehicle,
            &mut holds,
            NewMaintenance {
                vehicle_id: input.vehicle_id,
                reported_by: actor.id,
                maintenance_type: input.maintenance_type,
                provider: input.provider,
                description: input.description,
                odometer_reading,
                status: input.status,
                scheduled_date: input.scheduled_date,
                cost: input.cost,
                notes: input.notes,
            },
            now,
        )?;
        tx.insert_maintenance(&record).await?;
        let vehicle = tx.save_vehicle(&vehicle, expected).await?;
        tx.commit().await?;

        info!(
            "🔧 Mantenimiento {} ({}) registrado para {} (vehículo {})",
            record.id, record.status, vehicle.license_plate, vehicle.status
        );
        self.notifications
            .notify_fleet_managers(
                &NotificationMessage::new(
                    format!("{} maintenance {} for {}", record.maintenance_type, record.status, vehicle.display_name()),
                    format!("/maintenance/{}", record.id),
                    "wrench",
                    NotificationLevel::Info,
                ),
                Some(actor.id),
            )
            .await;
        Ok(record)
    }

    pub async fn change_status(&self, actor: &User, id: Uuid, change: MaintenanceStatusChange) -> AppResult<Maintenance> {
        require_fleet_manager(actor, "update maintenance")?;
        let current = self
            .store
            .find_maintenance(id)
            .await?
            .ok_or_else(|| not_found_error("Maintenance", id))?;
        let now = Utc::now();

        let mut tx = self.store.begin().await?;
        let mut vehicle = tx
            .lock_vehicle(current.vehicle_id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", current.vehicle_id))?;
        let mut record = tx
            .lock_maintenance(id)
            .await?
            .ok_or_else(|| not_found_error("Maintenance", id))?;
        let mut holds = tx.vehicle_holds(vehicle.id).await?;
        let expected = vehicle.version;

        maintenance_lifecycle::transition(&mut record, &mut vehicle, &mut holds, change.status, now)?;
        if change.cost.is_some() {
            record.cost = change.cost;
        }
        if let Some(notes) = change.notes.filter(|n| !n.trim().is_empty()) {
            record.notes = notes;
        }
        tx.update_maintenance(&record).await?;
        let vehicle = tx.save_vehicle(&vehicle, expected).await?;
        tx.commit().await?;

        info!(
            "🔧 Mantenimiento {} → {} (vehículo {} → {})",
            record.id, record.status, vehicle.id, vehicle.status
        );
        Ok(record)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Maintenance> {
        self.store
            .find_maintenance(id)
            .await?
            .ok_or_else(|| not_found_error("Maintenance", id))
    }

    pub async fn list(&self, filters: &MaintenanceFilters) -> AppResult<Vec<Maintenance>> {
        self.store.list_maintenance(filters).await
    }
}
