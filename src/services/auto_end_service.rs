//! Barrido de viajes abandonados
//!
//! Los viajes `ongoing` más antiguos que el umbral se cierran por el mismo
//! camino bloqueado que `end_trip`, con un odómetro final estimado. Un viaje
//! que el conductor cerró entre la selección y el bloqueo se omite.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::notification_service::{NotificationMessage, NotificationService};
use super::trip_service::{TripClosing, TripService};
use crate::lifecycle::LifecycleError;
use crate::models::{NotificationLevel, Trip};
use crate::repositories::FleetStore;
use crate::utils::errors::{AppError, AppResult};

#[derive(Debug, Clone, Copy)]
pub struct SweepOptions {
    pub timeout_hours: i64,
    pub default_distance: i64,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SweepEntry {
    pub trip_id: Uuid,
    pub vehicle_id: Uuid,
    pub driver_id: Uuid,
    pub start_odometer: i64,
    pub end_odometer: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct SweepReport {
    pub examined: usize,
    pub ended: usize,
    pub skipped: usize,
    pub failed: usize,
    pub dry_run: bool,
    pub entries: Vec<SweepEntry>,
}

#[derive(Clone)]
pub struct AutoEndService {
    store: Arc<dyn FleetStore>,
    trips: TripService,
    notifications: NotificationService,
}

impl AutoEndService {
    pub fn new(store: Arc<dyn FleetStore>, trips: TripService, notifications: NotificationService) -> Self {
        Self {
            store,
            trips,
            notifications,
        }
    }

    pub async fn run_sweep(&self, options: SweepOptions) -> AppResult<SweepReport> {
        if options.timeout_hours <= 0 {
            return Err(AppError::BadRequest("timeout hours must be positive".to_string()));
        }
        let cutoff = Utc::now() - Duration::hours(options.timeout_hours);
        let stale = self.store.stale_trips(cutoff).await?;

        let mut report = SweepReport {
            examined: stale.len(),
            dry_run: options.dry_run,
            ..SweepReport::default()
        };
        if stale.is_empty() {
            info!("✅ No hay viajes abandonados (más de {} horas)", options.timeout_hours);
            return Ok(report);
        }
        info!("⏰ {} viajes abandonados encontrados", stale.len());

        for trip in stale {
            if options.dry_run {
                let estimate = match self.trips.preview_auto_end(&trip, options.default_distance).await {
                    Ok(estimate) => Some(estimate),
                    Err(e) => {
                        warn!("⚠️ No se pudo estimar el viaje {}: {}", trip.id, e);
                        None
                    }
                };
                info!("🔍 [dry-run] Viaje {} se cerraría con odómetro {:?}", trip.id, estimate);
                report.entries.push(entry(&trip, estimate));
                continue;
            }

            let closing = TripClosing::AutoEnd {
                timeout_hours: options.timeout_hours,
                default_distance: options.default_distance,
            };
            match self.trips.close_trip(&trip, closing).await {
                Ok((ended, vehicle)) => {
                    report.ended += 1;
                    info!(
                        "🤖 Viaje {} auto-finalizado con odómetro {:?} (vehículo {} → {})",
                        ended.id, ended.end_odometer, vehicle.id, vehicle.status
                    );
                    report.entries.push(entry(&ended, ended.end_odometer));
                    self.notify(&ended, options.timeout_hours).await;
                }
                Err(AppError::Lifecycle(LifecycleError::InvalidState(reason))) => {
                    report.skipped += 1;
                    info!("⏭️ Viaje {} omitido: {}", trip.id, reason);
                }
                Err(e) => {
                    report.failed += 1;
                    error!("❌ Error auto-finalizando el viaje {}: {}", trip.id, e);
                }
            }
        }

        info!(
            "📊 Barrido terminado: {} examinados, {} finalizados, {} omitidos, {} fallidos",
            report.examined, report.ended, report.skipped, report.failed
        );
        Ok(report)
    }

    async fn notify(&self, trip: &Trip, timeout_hours: i64) {
        self.notifications
            .notify_user(
                trip.driver_id,
                &NotificationMessage::new(
                    format!(
                        "Your trip {} was automatically ended due to inactivity ({} hours)",
                        trip.route_summary(),
                        timeout_hours
                    ),
                    format!("/trips/{}", trip.id),
                    "clock",
                    NotificationLevel::Warning,
                ),
            )
            .await;

        let driver = match self.store.find_user(trip.driver_id).await {
            Ok(Some(user)) => user.display_name().to_string(),
            _ => trip.driver_id.to_string(),
        };
        self.notifications
            .notify_fleet_managers(
                &NotificationMessage::new(
                    format!(
                        "Trip by {} ({}) was automatically ended due to inactivity",
                        driver,
                        trip.route_summary()
                    ),
                    format!("/trips/{}", trip.id),
                    "clock",
                    NotificationLevel::Warning,
                ),
                Some(trip.driver_id),
            )
            .await;
    }
}

fn entry(trip: &Trip, end_odometer: Option<i64>) -> SweepEntry {
    SweepEntry {
        trip_id: trip.id,
        vehicle_id: trip.vehicle_id,
        driver_id: trip.driver_id,
        start_odometer: trip.start_odometer,
        end_odometer,
    }
}
