//! Informes de flota
//!
//! Resumen de estado y auditoría de calidad de datos. La auditoría compara
//! el estado guardado de cada vehículo con el derivado de sus retenciones.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use super::require_fleet_manager;
use crate::lifecycle::derive_status;
use crate::models::{
    AccidentFilters, MaintenanceFilters, MaintenanceStatus, TripFilters, TripStatus, User, VehicleFilters,
    VehicleStatus, EXPIRY_WARNING_DAYS,
};
use crate::repositories::FleetStore;
use crate::utils::errors::AppResult;

#[derive(Debug, Clone, Serialize)]
pub struct FleetStatusReport {
    pub total_vehicles: usize,
    pub vehicles_by_status: BTreeMap<String, usize>,
    pub ongoing_trips: usize,
    pub active_maintenance: usize,
    pub unresolved_accidents: usize,
    pub expired_documents: usize,
    /// Caducan en los próximos `EXPIRY_WARNING_DAYS` días
    pub documents_expiring_soon: usize,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StatusDrift {
    pub vehicle_id: Uuid,
    pub stored: VehicleStatus,
    pub derived: VehicleStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct DataQualityReport {
    /// Viajes completados sin hora u odómetro final
    pub incomplete_completed_trips: Vec<Uuid>,
    /// Vehículos `in_use` sin exactamente un viaje en curso
    pub in_use_without_single_trip: Vec<Uuid>,
    /// Viajes en curso sobre vehículos disponibles o retirados
    pub ongoing_trips_on_idle_vehicles: Vec<Uuid>,
    pub status_drift: Vec<StatusDrift>,
    pub issues: usize,
    pub generated_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct ReportService {
    store: Arc<dyn FleetStore>,
}

impl ReportService {
    pub fn new(store: Arc<dyn FleetStore>) -> Self {
        Self { store }
    }

    pub async fn fleet_status(&self, actor: &User) -> AppResult<FleetStatusReport> {
        require_fleet_manager(actor, "view fleet reports")?;
        let vehicles = self.store.list_vehicles(&VehicleFilters::default()).await?;

        let mut vehicles_by_status: BTreeMap<String, usize> =
            VehicleStatus::all().iter().map(|s| (s.to_string(), 0)).collect();
        for vehicle in &vehicles {
            *vehicles_by_status.entry(vehicle.status.to_string()).or_default() += 1;
        }

        let ongoing_trips = self
            .store
            .list_trips(&TripFilters {
                status: Some(TripStatus::Ongoing),
                ..TripFilters::default()
            })
            .await?
            .len();
        let active_maintenance = self
            .store
            .list_maintenance(&MaintenanceFilters {
                status: Some(MaintenanceStatus::InProgress),
                ..MaintenanceFilters::default()
            })
            .await?
            .len();
        let unresolved_accidents = self
            .store
            .list_accidents(&AccidentFilters::default())
            .await?
            .iter()
            .filter(|a| !a.status.is_resolved())
            .count();

        let now = Utc::now();
        let today = now.date_naive();
        let due = self
            .store
            .documents_expiring_by(today + Duration::days(EXPIRY_WARNING_DAYS))
            .await?;
        let expired_documents = due.iter().filter(|d| d.is_expired(today)).count();

        Ok(FleetStatusReport {
            total_vehicles: vehicles.len(),
            vehicles_by_status,
            ongoing_trips,
            active_maintenance,
            unresolved_accidents,
            expired_documents,
            documents_expiring_soon: due.len() - expired_documents,
            generated_at: now,
        })
    }

    pub async fn data_quality(&self, actor: &User) -> AppResult<DataQualityReport> {
        require_fleet_manager(actor, "view fleet reports")?;
        let vehicles = self.store.list_vehicles(&VehicleFilters::default()).await?;
        let trips = self.store.list_trips(&TripFilters::default()).await?;

        let incomplete_completed_trips: Vec<Uuid> = trips
            .iter()
            .filter(|t| t.status == TripStatus::Completed && (t.end_time.is_none() || t.end_odometer.is_none()))
            .map(|t| t.id)
            .collect();

        let mut in_use_without_single_trip = Vec::new();
        let mut ongoing_trips_on_idle_vehicles = Vec::new();
        let mut status_drift = Vec::new();

        for vehicle in &vehicles {
            let ongoing: Vec<Uuid> = trips
                .iter()
                .filter(|t| t.vehicle_id == vehicle.id && t.status == TripStatus::Ongoing)
                .map(|t| t.id)
                .collect();

            if vehicle.status == VehicleStatus::InUse && ongoing.len() != 1 {
                in_use_without_single_trip.push(vehicle.id);
            }
            // Un accidente durante el viaje deja el vehículo en mantenimiento
            // con el viaje abierto; eso es un estado válido
            if matches!(vehicle.status, VehicleStatus::Available | VehicleStatus::Retired) {
                ongoing_trips_on_idle_vehicles.extend(ongoing.iter().copied());
            }

            let holds = self.store.vehicle_holds(vehicle.id).await?;
            let derived = derive_status(vehicle.is_retired(), &holds);
            if derived != vehicle.status {
                status_drift.push(StatusDrift {
                    vehicle_id: vehicle.id,
                    stored: vehicle.status,
                    derived,
                });
            }
        }

        let issues = incomplete_completed_trips.len()
            + in_use_without_single_trip.len()
            + ongoing_trips_on_idle_vehicles.len()
            + status_drift.len();
        if issues > 0 {
            warn!("⚠️ Auditoría de datos: {} incidencias", issues);
        }

        Ok(DataQualityReport {
            incomplete_completed_trips,
            in_use_without_single_trip,
            ongoing_trips_on_idle_vehicles,
            status_drift,
            issues,
            generated_at: Utc::now(),
        })
    }
}
