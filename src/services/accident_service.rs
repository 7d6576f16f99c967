//! Servicio de accidentes
//!
//! Cualquier usuario aprobado puede declarar un accidente; solo los gestores
//! de flota cambian su estado. Cada declaración avisa a los gestores.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::notification_service::{NotificationMessage, NotificationService};
use super::{require_approved, require_fleet_manager};
use crate::lifecycle::accident_lifecycle;
use crate::models::{Accident, AccidentFilters, AccidentStatus, NewAccident, NotificationLevel, User};
use crate::repositories::{FleetStore, FleetTx};
use crate::utils::errors::{forbidden_error, not_found_error, AppResult};

#[derive(Debug, Clone)]
pub struct ReportAccident {
    pub vehicle_id: Uuid,
    /// Solo un gestor puede declarar en nombre de otro conductor
    pub driver_id: Option<Uuid>,
    pub occurred_at: DateTime<Utc>,
    pub location: String,
    pub description: String,
    pub damage_description: String,
    pub third_party_involved: bool,
    pub injuries: bool,
    pub police_report_number: Option<String>,
    pub estimated_cost: Option<Decimal>,
    pub notes: String,
}

#[derive(Debug, Clone)]
pub struct AccidentStatusChange {
    pub status: AccidentStatus,
    pub actual_cost: Option<Decimal>,
    pub notes: Option<String>,
}

#[derive(Clone)]
pub struct AccidentService {
    store: Arc<dyn FleetStore>,
    notifications: NotificationService,
}

impl AccidentService {
    pub fn new(store: Arc<dyn FleetStore>, notifications: NotificationService) -> Self {
        Self { store, notifications }
    }

    pub async fn report(&self, actor: &User, input: ReportAccident) -> AppResult<Accident> {
        require_approved(actor, "report accidents")?;
        let driver_id = match input.driver_id {
            Some(id) if id != actor.id && !actor.user_type.is_fleet_manager() => {
                return Err(forbidden_error("report accident", "drivers can only report their own accidents"));
            }
            Some(id) => id,
            None => actor.id,
        };
        let now = Utc::now();

        let mut tx = self.store.begin().await?;
        let mut vehicle = tx
            .lock_vehicle(input.vehicle_id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", input.vehicle_id))?;
        let mut open = tx.lock_open_accidents(vehicle.id).await?;
        let mut holds = tx.vehicle_holds(vehicle.id).await?;
        let expected = vehicle.version;

        let accident = accident_lifecycle::report(
            &mut vehicle,
            &mut holds,
            NewAccident {
                vehicle_id: input.vehicle_id,
                driver_id,
                occurred_at: input.occurred_at,
                location: input.location,
                description: input.description,
                damage_description: input.damage_description,
                third_party_involved: input.third_party_involved,
                injuries: input.injuries,
                police_report_number: input.police_report_number,
                estimated_cost: input.estimated_cost,
                notes: input.notes,
            },
            now,
        )?;
        let grounded = accident_lifecycle::ground_open_accidents(&accident, &mut vehicle, &mut holds, &mut open, now);
        tx.insert_accident(&accident).await?;
        write_grounded(tx.as_mut(), &open, &grounded).await?;
        let vehicle = tx.save_vehicle(&vehicle, expected).await?;
        tx.commit().await?;

        warn!(
            "💥 Accidente {} declarado para {} (inmoviliza: {}, vehículo {})",
            accident.id, vehicle.license_plate, accident.grounds_vehicle, vehicle.status
        );
        let level = if accident.injuries {
            NotificationLevel::Danger
        } else {
            NotificationLevel::Warning
        };
        self.notifications
            .notify_fleet_managers(
                &NotificationMessage::new(
                    format!(
                        "Accident reported for {} by {} at {}",
                        vehicle.display_name(),
                        actor.display_name(),
                        accident.location
                    ),
                    format!("/accidents/{}", accident.id),
                    "car-crash",
                    level,
                ),
                Some(actor.id),
            )
            .await;
        Ok(accident)
    }

    pub async fn change_status(&self, actor: &User, id: Uuid, change: AccidentStatusChange) -> AppResult<Accident> {
        require_fleet_manager(actor, "update accidents")?;
        let current = self
            .store
            .find_accident(id)
            .await?
            .ok_or_else(|| not_found_error("Accident", id))?;
        let now = Utc::now();

        let mut tx = self.store.begin().await?;
        let mut vehicle = tx
            .lock_vehicle(current.vehicle_id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", current.vehicle_id))?;
        let mut accident = tx
            .lock_accident(id)
            .await?
            .ok_or_else(|| not_found_error("Accident", id))?;
        let mut open = tx.lock_open_accidents(vehicle.id).await?;
        let mut holds = tx.vehicle_holds(vehicle.id).await?;
        let expected = vehicle.version;

        accident_lifecycle::transition(&mut accident, &mut vehicle, &mut holds, change.status, now)?;
        let grounded = accident_lifecycle::ground_open_accidents(&accident, &mut vehicle, &mut holds, &mut open, now);
        if change.actual_cost.is_some() {
            accident.actual_cost = change.actual_cost;
        }
        if let Some(notes) = change.notes.filter(|n| !n.trim().is_empty()) {
            accident.notes = notes;
        }
        tx.update_accident(&accident).await?;
        write_grounded(tx.as_mut(), &open, &grounded).await?;
        let vehicle = tx.save_vehicle(&vehicle, expected).await?;
        tx.commit().await?;

        info!(
            "📋 Accidente {} → {} (vehículo {} → {})",
            accident.id, accident.status, vehicle.id, vehicle.status
        );
        Ok(accident)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Accident> {
        self.store
            .find_accident(id)
            .await?
            .ok_or_else(|| not_found_error("Accident", id))
    }

    pub async fn list(&self, filters: &AccidentFilters) -> AppResult<Vec<Accident>> {
        self.store.list_accidents(filters).await
    }
}

async fn write_grounded(tx: &mut dyn FleetTx, open: &[Accident], grounded: &[Uuid]) -> AppResult<()> {
    for accident in open.iter().filter(|a| grounded.contains(&a.id)) {
        debug!("🔗 Accidente {} retiene ahora el vehículo {}", accident.id, accident.vehicle_id);
        tx.update_accident(accident).await?;
    }
    Ok(())
}
