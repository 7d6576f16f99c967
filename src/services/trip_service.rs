//! Servicio de viajes
//!
//! Cada operación: abrir transacción → bloquear vehículo → bloquear viaje →
//! regla pura → escribir viaje y vehículo → commit → notificar.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use super::notification_service::{NotificationMessage, NotificationService};
use super::require_approved;
use crate::lifecycle::trip_lifecycle::{self, ESTIMATE_HISTORY_LEN};
use crate::models::{NewTrip, NotificationLevel, Trip, TripFilters, User, Vehicle};
use crate::repositories::FleetStore;
use crate::utils::errors::{forbidden_error, not_found_error, AppResult};

#[derive(Debug, Clone)]
pub struct StartTrip {
    pub vehicle_id: Uuid,
    pub start_odometer: i64,
    pub origin: String,
    pub destination: String,
    pub purpose: String,
}

/// Cómo se cierra un viaje dentro de la transacción bloqueada
#[derive(Debug, Clone)]
pub(crate) enum TripClosing {
    End { end_odometer: i64, notes: Option<String> },
    AutoEnd { timeout_hours: i64, default_distance: i64 },
    Cancel { reason: Option<String> },
}

#[derive(Clone)]
pub struct TripService {
    store: Arc<dyn FleetStore>,
    notifications: NotificationService,
}

impl TripService {
    pub fn new(store: Arc<dyn FleetStore>, notifications: NotificationService) -> Self {
        Self { store, notifications }
    }

    pub async fn start_trip(&self, driver: &User, input: StartTrip) -> AppResult<Trip> {
        require_approved(driver, "start trips")?;
        let now = Utc::now();

        let mut tx = self.store.begin().await?;
        let mut vehicle = tx
            .lock_vehicle(input.vehicle_id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", input.vehicle_id))?;
        let mut holds = tx.vehicle_holds(vehicle.id).await?;
        let expected = vehicle.version;

        let trip = trip_lifecycle::begin(
            &mut vehicle,
            &mut holds,
            NewTrip {
                vehicle_id: input.vehicle_id,
                driver_id: driver.id,
                start_odometer: input.start_odometer,
                origin: input.origin,
                destination: input.destination,
                purpose: input.purpose,
            },
            now,
        )?;
        tx.insert_trip(&trip).await?;
        let vehicle = tx.save_vehicle(&vehicle, expected).await?;
        tx.commit().await?;

        info!(
            "🚀 Viaje {} iniciado por {} en {} (vehículo {})",
            trip.id,
            driver.display_name(),
            vehicle.license_plate,
            vehicle.status
        );
        self.notifications
            .notify_fleet_managers(
                &NotificationMessage::new(
                    format!(
                        "{} started a trip with {}: {}",
                        driver.display_name(),
                        vehicle.display_name(),
                        trip.route_summary()
                    ),
                    format!("/trips/{}", trip.id),
                    "car",
                    NotificationLevel::Info,
                ),
                Some(driver.id),
            )
            .await;
        Ok(trip)
    }

    pub async fn end_trip(&self, actor: &User, trip_id: Uuid, end_odometer: i64, notes: Option<String>) -> AppResult<Trip> {
        let trip = self.authorize_closing(actor, trip_id).await?;
        let (trip, vehicle) = self
            .close_trip(&trip, TripClosing::End { end_odometer, notes })
            .await?;

        info!(
            "🏁 Viaje {} finalizado: {} km (vehículo {} → {})",
            trip.id,
            trip.distance_traveled(),
            vehicle.id,
            vehicle.status
        );
        if actor.id != trip.driver_id {
            self.notifications
                .notify_user(
                    trip.driver_id,
                    &NotificationMessage::new(
                        format!("Your trip {} was ended by {}", trip.route_summary(), actor.display_name()),
                        format!("/trips/{}", trip.id),
                        "flag-checkered",
                        NotificationLevel::Info,
                    ),
                )
                .await;
        }
        Ok(trip)
    }

    pub async fn cancel_trip(&self, actor: &User, trip_id: Uuid, reason: Option<String>) -> AppResult<Trip> {
        let trip = self.authorize_closing(actor, trip_id).await?;
        let (trip, vehicle) = self.close_trip(&trip, TripClosing::Cancel { reason }).await?;

        info!("🚫 Viaje {} cancelado (vehículo {} → {})", trip.id, vehicle.id, vehicle.status);
        Ok(trip)
    }

    pub async fn get(&self, actor: &User, trip_id: Uuid) -> AppResult<Trip> {
        let trip = self
            .store
            .find_trip(trip_id)
            .await?
            .ok_or_else(|| not_found_error("Trip", trip_id))?;
        if trip.driver_id != actor.id && !actor.user_type.is_fleet_manager() {
            return Err(forbidden_error("view trip", "trip belongs to another driver"));
        }
        Ok(trip)
    }

    /// Los conductores solo ven sus propios viajes
    pub async fn list(&self, actor: &User, mut filters: TripFilters) -> AppResult<Vec<Trip>> {
        if !actor.user_type.is_fleet_manager() {
            filters.driver_id = Some(actor.id);
        }
        self.store.list_trips(&filters).await
    }

    async fn authorize_closing(&self, actor: &User, trip_id: Uuid) -> AppResult<Trip> {
        let trip = self
            .store
            .find_trip(trip_id)
            .await?
            .ok_or_else(|| not_found_error("Trip", trip_id))?;
        if !trip.can_be_ended_by(actor) {
            return Err(forbidden_error("close trip", "only the driver or a fleet manager can close it"));
        }
        if actor.id == trip.driver_id && !actor.user_type.is_fleet_manager() {
            require_approved(actor, "close trips")?;
        }
        Ok(trip)
    }

    /// Estimación de odómetro para un viaje abandonado, sin escribir nada
    pub(crate) async fn preview_auto_end(&self, trip: &Trip, default_distance: i64) -> AppResult<i64> {
        let mut tx = self.store.begin().await?;
        let vehicle = tx
            .lock_vehicle(trip.vehicle_id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", trip.vehicle_id))?;
        let distances = tx.recent_trip_distances(trip.vehicle_id, ESTIMATE_HISTORY_LEN).await?;
        Ok(trip_lifecycle::estimate_end_odometer(trip, &vehicle, &distances, default_distance)?)
    }

    /// Camino bloqueado común para finalizar, cancelar y auto-finalizar.
    ///
    /// El viaje se vuelve a leer bajo bloqueo: si otro proceso ya lo cerró,
    /// la regla pura devuelve `InvalidState` y no se escribe nada.
    pub(crate) async fn close_trip(&self, trip: &Trip, closing: TripClosing) -> AppResult<(Trip, Vehicle)> {
        let now = Utc::now();
        let mut tx = self.store.begin().await?;
        let mut vehicle = tx
            .lock_vehicle(trip.vehicle_id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", trip.vehicle_id))?;
        let mut locked = tx
            .lock_trip(trip.id)
            .await?
            .ok_or_else(|| not_found_error("Trip", trip.id))?;
        let mut holds = tx.vehicle_holds(vehicle.id).await?;
        let expected = vehicle.version;

        match closing {
            TripClosing::End { end_odometer, notes } => {
                trip_lifecycle::end(&mut locked, &mut vehicle, &mut holds, end_odometer, notes, now)?;
            }
            TripClosing::AutoEnd {
                timeout_hours,
                default_distance,
            } => {
                let distances = tx.recent_trip_distances(vehicle.id, ESTIMATE_HISTORY_LEN).await?;
                let estimate = trip_lifecycle::estimate_end_odometer(&locked, &vehicle, &distances, default_distance)?;
                let note = format!(
                    "Automatically ended after {} hours of inactivity (estimated end odometer {})",
                    timeout_hours, estimate
                );
                trip_lifecycle::end(&mut locked, &mut vehicle, &mut holds, estimate, Some(note), now)?;
                locked.auto_ended = true;
            }
            TripClosing::Cancel { reason } => {
                trip_lifecycle::cancel(&mut locked, &mut vehicle, &mut holds, reason, now)?;
            }
        }

        tx.update_trip(&locked).await?;
        let vehicle = tx.save_vehicle(&vehicle, expected).await?;
        tx.commit().await?;
        Ok((locked, vehicle))
    }
}
