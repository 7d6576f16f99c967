//! Persistencia de la flota
//!
//! `FleetStore` expone las lecturas y abre unidades de trabajo (`FleetTx`).
//! Toda transición de ciclo de vida ocurre dentro de una `FleetTx`:
//! se bloquea primero la fila del vehículo y después la de la entidad,
//! se aplica la regla pura y se escribe todo junto en `commit`.
//! Una `FleetTx` descartada sin `commit` no deja rastro.

pub mod memory_fleet_store;
pub mod pg_fleet_store;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::lifecycle::VehicleHolds;
use crate::models::{
    Accident, AccidentFilters, Document, DocumentFilters, FuelFilters, FuelTransaction, Maintenance,
    MaintenanceFilters, Notification, Trip, TripFilters, User, UserFilters, Vehicle, VehicleFilters,
};
use crate::utils::errors::AppResult;

pub use memory_fleet_store::MemoryFleetStore;
pub use pg_fleet_store::PgFleetStore;

#[async_trait]
pub trait FleetStore: Send + Sync {
    /// Abre una unidad de trabajo
    async fn begin(&self) -> AppResult<Box<dyn FleetTx>>;

    // Vehículos
    async fn find_vehicle(&self, id: Uuid) -> AppResult<Option<Vehicle>>;
    async fn list_vehicles(&self, filters: &VehicleFilters) -> AppResult<Vec<Vehicle>>;
    async fn vehicle_holds(&self, vehicle_id: Uuid) -> AppResult<VehicleHolds>;

    // Viajes
    async fn find_trip(&self, id: Uuid) -> AppResult<Option<Trip>>;
    async fn list_trips(&self, filters: &TripFilters) -> AppResult<Vec<Trip>>;
    /// Viajes `ongoing` iniciados antes de `cutoff`, los más antiguos primero
    async fn stale_trips(&self, cutoff: DateTime<Utc>) -> AppResult<Vec<Trip>>;

    // Mantenimiento y accidentes
    async fn find_maintenance(&self, id: Uuid) -> AppResult<Option<Maintenance>>;
    async fn list_maintenance(&self, filters: &MaintenanceFilters) -> AppResult<Vec<Maintenance>>;
    async fn find_accident(&self, id: Uuid) -> AppResult<Option<Accident>>;
    async fn list_accidents(&self, filters: &AccidentFilters) -> AppResult<Vec<Accident>>;

    // Repostajes y documentación
    async fn find_fuel_transaction(&self, id: Uuid) -> AppResult<Option<FuelTransaction>>;
    async fn list_fuel_transactions(&self, filters: &FuelFilters) -> AppResult<Vec<FuelTransaction>>;
    async fn find_document(&self, id: Uuid) -> AppResult<Option<Document>>;
    async fn list_documents(&self, filters: &DocumentFilters) -> AppResult<Vec<Document>>;
    /// Documentos con caducidad en o antes de `date` (incluye los ya caducados), los más urgentes primero
    async fn documents_expiring_by(&self, date: NaiveDate) -> AppResult<Vec<Document>>;

    // Usuarios
    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>>;
    async fn list_users(&self, filters: &UserFilters) -> AppResult<Vec<User>>;
    /// Usuarios activos con rol de gestión de flota
    async fn fleet_managers(&self) -> AppResult<Vec<User>>;

    // Notificaciones
    async fn list_notifications(&self, user_id: Uuid, unread_only: bool) -> AppResult<Vec<Notification>>;
}

/// Unidad de trabajo con bloqueo de filas
#[async_trait]
pub trait FleetTx: Send {
    /// Bloquea la fila del vehículo hasta el fin de la transacción
    async fn lock_vehicle(&mut self, id: Uuid) -> AppResult<Option<Vehicle>>;
    /// Retenciones activas reconstruidas a partir de las filas persistidas
    async fn vehicle_holds(&mut self, vehicle_id: Uuid) -> AppResult<VehicleHolds>;
    async fn insert_vehicle(&mut self, vehicle: &Vehicle) -> AppResult<()>;
    /// Compare-and-swap sobre `version`; devuelve el vehículo con la versión nueva
    async fn save_vehicle(&mut self, vehicle: &Vehicle, expected_version: i64) -> AppResult<Vehicle>;

    async fn lock_trip(&mut self, id: Uuid) -> AppResult<Option<Trip>>;
    async fn insert_trip(&mut self, trip: &Trip) -> AppResult<()>;
    async fn update_trip(&mut self, trip: &Trip) -> AppResult<()>;
    /// Distancias de los últimos viajes completados del vehículo
    async fn recent_trip_distances(&mut self, vehicle_id: Uuid, limit: i64) -> AppResult<Vec<i64>>;

    async fn lock_maintenance(&mut self, id: Uuid) -> AppResult<Option<Maintenance>>;
    async fn insert_maintenance(&mut self, record: &Maintenance) -> AppResult<()>;
    async fn update_maintenance(&mut self, record: &Maintenance) -> AppResult<()>;

    async fn lock_accident(&mut self, id: Uuid) -> AppResult<Option<Accident>>;
    /// Bloquea los accidentes sin resolver del vehículo
    async fn lock_open_accidents(&mut self, vehicle_id: Uuid) -> AppResult<Vec<Accident>>;
    async fn insert_accident(&mut self, accident: &Accident) -> AppResult<()>;
    async fn update_accident(&mut self, accident: &Accident) -> AppResult<()>;

    async fn insert_fuel_transaction(&mut self, transaction: &FuelTransaction) -> AppResult<()>;

    async fn lock_document(&mut self, id: Uuid) -> AppResult<Option<Document>>;
    async fn insert_document(&mut self, document: &Document) -> AppResult<()>;
    async fn update_document(&mut self, document: &Document) -> AppResult<()>;

    async fn lock_user(&mut self, id: Uuid) -> AppResult<Option<User>>;
    async fn lock_user_by_username(&mut self, username: &str) -> AppResult<Option<User>>;
    async fn insert_user(&mut self, user: &User) -> AppResult<()>;
    async fn update_user(&mut self, user: &User) -> AppResult<()>;

    async fn insert_notifications(&mut self, notifications: &[Notification]) -> AppResult<()>;
    /// Devuelve cuántas notificaciones se marcaron como leídas
    async fn mark_notifications_read(&mut self, user_id: Uuid, ids: Option<&[Uuid]>) -> AppResult<u64>;

    async fn commit(self: Box<Self>) -> AppResult<()>;
}
