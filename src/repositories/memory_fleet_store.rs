//! Backend en memoria
//!
//! Un único mutex serializa las unidades de trabajo: `begin` toma el candado
//! y clona el estado; `commit` reemplaza el estado por la copia de trabajo.
//! Si la transacción se descarta, la copia se pierde y nada cambia.
//!
//! Mientras una `FleetTx` está abierta no se deben hacer lecturas por el
//! `FleetStore` desde la misma tarea: esperarían al mismo candado.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{FleetStore, FleetTx};
use crate::lifecycle::{Hold, LifecycleError, VehicleHolds};
use crate::models::{
    Accident, AccidentFilters, Document, DocumentFilters, FuelFilters, FuelTransaction, Maintenance,
    MaintenanceFilters, MaintenanceStatus, Notification, Trip, TripFilters, TripStatus, User, UserFilters, Vehicle,
    VehicleFilters,
};
use crate::utils::errors::{conflict_error, not_found_error, AppError, AppResult};

#[derive(Debug, Clone, Default)]
struct FleetData {
    vehicles: HashMap<Uuid, Vehicle>,
    trips: HashMap<Uuid, Trip>,
    maintenance: HashMap<Uuid, Maintenance>,
    accidents: HashMap<Uuid, Accident>,
    fuel_transactions: HashMap<Uuid, FuelTransaction>,
    documents: HashMap<Uuid, Document>,
    users: HashMap<Uuid, User>,
    notifications: Vec<Notification>,
}

impl FleetData {
    fn holds(&self, vehicle_id: Uuid) -> VehicleHolds {
        let trips = self
            .trips
            .values()
            .filter(|t| t.vehicle_id == vehicle_id && t.status == TripStatus::Ongoing)
            .map(|t| Hold::Trip(t.id));
        let maintenance = self
            .maintenance
            .values()
            .filter(|m| m.vehicle_id == vehicle_id && m.status == MaintenanceStatus::InProgress)
            .map(|m| Hold::Maintenance(m.id));
        let accidents = self
            .accidents
            .values()
            .filter(|a| a.vehicle_id == vehicle_id && a.holds_vehicle())
            .map(|a| Hold::Accident(a.id));
        VehicleHolds::from_holds(trips.chain(maintenance).chain(accidents))
    }
}

fn paginate<T>(items: Vec<T>, limit: Option<i64>, offset: Option<i64>) -> Vec<T> {
    let offset = offset.unwrap_or(0).max(0) as usize;
    let iter = items.into_iter().skip(offset);
    match limit {
        Some(limit) => iter.take(limit.max(0) as usize).collect(),
        None => iter.collect(),
    }
}

#[derive(Clone, Default)]
pub struct MemoryFleetStore {
    data: Arc<Mutex<FleetData>>,
}

impl MemoryFleetStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FleetStore for MemoryFleetStore {
    async fn begin(&self) -> AppResult<Box<dyn FleetTx>> {
        let guard = self.data.clone().lock_owned().await;
        let working = (*guard).clone();
        Ok(Box::new(MemoryFleetTx { guard, working }))
    }

    async fn find_vehicle(&self, id: Uuid) -> AppResult<Option<Vehicle>> {
        Ok(self.data.lock().await.vehicles.get(&id).cloned())
    }

    async fn list_vehicles(&self, filters: &VehicleFilters) -> AppResult<Vec<Vehicle>> {
        let data = self.data.lock().await;
        let mut vehicles: Vec<Vehicle> = data
            .vehicles
            .values()
            .filter(|v| filters.status.map_or(true, |s| v.status == s))
            .cloned()
            .collect();
        vehicles.sort_by(|a, b| a.license_plate.cmp(&b.license_plate));
        Ok(paginate(vehicles, filters.limit, filters.offset))
    }

    async fn vehicle_holds(&self, vehicle_id: Uuid) -> AppResult<VehicleHolds> {
        Ok(self.data.lock().await.holds(vehicle_id))
    }

    async fn find_trip(&self, id: Uuid) -> AppResult<Option<Trip>> {
        Ok(self.data.lock().await.trips.get(&id).cloned())
    }

    async fn list_trips(&self, filters: &TripFilters) -> AppResult<Vec<Trip>> {
        let data = self.data.lock().await;
        let mut trips: Vec<Trip> = data
            .trips
            .values()
            .filter(|t| filters.status.map_or(true, |s| t.status == s))
            .filter(|t| filters.vehicle_id.map_or(true, |id| t.vehicle_id == id))
            .filter(|t| filters.driver_id.map_or(true, |id| t.driver_id == id))
            .cloned()
            .collect();
        trips.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        Ok(paginate(trips, filters.limit, filters.offset))
    }

    async fn stale_trips(&self, cutoff: DateTime<Utc>) -> AppResult<Vec<Trip>> {
        let data = self.data.lock().await;
        let mut trips: Vec<Trip> = data
            .trips
            .values()
            .filter(|t| t.status == TripStatus::Ongoing && t.start_time < cutoff)
            .cloned()
            .collect();
        trips.sort_by_key(|t| t.start_time);
        Ok(trips)
    }

    async fn find_maintenance(&self, id: Uuid) -> AppResult<Option<Maintenance>> {
        Ok(self.data.lock().await.maintenance.get(&id).cloned())
    }

    async fn list_maintenance(&self, filters: &MaintenanceFilters) -> AppResult<Vec<Maintenance>> {
        let data = self.data.lock().await;
        let mut records: Vec<Maintenance> = data
            .maintenance
            .values()
            .filter(|m| filters.status.map_or(true, |s| m.status == s))
            .filter(|m| filters.vehicle_id.map_or(true, |id| m.vehicle_id == id))
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn find_accident(&self, id: Uuid) -> AppResult<Option<Accident>> {
        Ok(self.data.lock().await.accidents.get(&id).cloned())
    }

    async fn list_accidents(&self, filters: &AccidentFilters) -> AppResult<Vec<Accident>> {
        let data = self.data.lock().await;
        let mut accidents: Vec<Accident> = data
            .accidents
            .values()
            .filter(|a| filters.status.map_or(true, |s| a.status == s))
            .filter(|a| filters.vehicle_id.map_or(true, |id| a.vehicle_id == id))
            .cloned()
            .collect();
        accidents.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
        Ok(accidents)
    }

    async fn find_fuel_transaction(&self, id: Uuid) -> AppResult<Option<FuelTransaction>> {
        Ok(self.data.lock().await.fuel_transactions.get(&id).cloned())
    }

    async fn list_fuel_transactions(&self, filters: &FuelFilters) -> AppResult<Vec<FuelTransaction>> {
        let data = self.data.lock().await;
        let mut transactions: Vec<FuelTransaction> = data
            .fuel_transactions
            .values()
            .filter(|t| filters.vehicle_id.map_or(true, |id| t.vehicle_id == id))
            .filter(|t| filters.driver_id.map_or(true, |id| t.driver_id == id))
            .cloned()
            .collect();
        transactions.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
        Ok(transactions)
    }

    async fn find_document(&self, id: Uuid) -> AppResult<Option<Document>> {
        Ok(self.data.lock().await.documents.get(&id).cloned())
    }

    async fn list_documents(&self, filters: &DocumentFilters) -> AppResult<Vec<Document>> {
        let data = self.data.lock().await;
        let mut documents: Vec<Document> = data
            .documents
            .values()
            .filter(|d| filters.vehicle_id.map_or(true, |id| d.vehicle_id == id))
            .filter(|d| {
                filters
                    .document_type
                    .as_deref()
                    .map_or(true, |t| d.document_type.eq_ignore_ascii_case(t))
            })
            .cloned()
            .collect();
        documents.sort_by_key(|d| d.expiry_date);
        Ok(documents)
    }

    async fn documents_expiring_by(&self, date: NaiveDate) -> AppResult<Vec<Document>> {
        let data = self.data.lock().await;
        let mut documents: Vec<Document> = data
            .documents
            .values()
            .filter(|d| d.expiry_date <= date)
            .cloned()
            .collect();
        documents.sort_by_key(|d| d.expiry_date);
        Ok(documents)
    }

    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.data.lock().await.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let data = self.data.lock().await;
        Ok(data.users.values().find(|u| u.username == username).cloned())
    }

    async fn list_users(&self, filters: &UserFilters) -> AppResult<Vec<User>> {
        let data = self.data.lock().await;
        let mut users: Vec<User> = data
            .users
            .values()
            .filter(|u| filters.approval_status.map_or(true, |s| u.approval_status == s))
            .filter(|u| filters.user_type.map_or(true, |t| u.user_type == t))
            .cloned()
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn fleet_managers(&self) -> AppResult<Vec<User>> {
        let data = self.data.lock().await;
        let mut users: Vec<User> = data
            .users
            .values()
            .filter(|u| u.is_active && u.user_type.is_fleet_manager())
            .cloned()
            .collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    async fn list_notifications(&self, user_id: Uuid, unread_only: bool) -> AppResult<Vec<Notification>> {
        let data = self.data.lock().await;
        let mut notifications: Vec<Notification> = data
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id && (!unread_only || !n.read))
            .cloned()
            .collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        notifications.truncate(100);
        Ok(notifications)
    }
}

pub struct MemoryFleetTx {
    guard: OwnedMutexGuard<FleetData>,
    working: FleetData,
}

impl MemoryFleetTx {
    fn require_vehicle(&self, vehicle_id: Uuid) -> AppResult<()> {
        if self.working.vehicles.contains_key(&vehicle_id) {
            Ok(())
        } else {
            Err(not_found_error("Vehicle", vehicle_id))
        }
    }

    /// Mismo número de documento del mismo tipo en el mismo vehículo
    fn ensure_unique_document(&self, document: &Document) -> AppResult<()> {
        let duplicate = self.working.documents.values().any(|d| {
            d.id != document.id
                && d.vehicle_id == document.vehicle_id
                && d.document_type == document.document_type
                && d.document_number == document.document_number
        });
        if duplicate {
            return Err(conflict_error("Document", "number", &document.document_number));
        }
        Ok(())
    }
}

#[async_trait]
impl FleetTx for MemoryFleetTx {
    async fn lock_vehicle(&mut self, id: Uuid) -> AppResult<Option<Vehicle>> {
        Ok(self.working.vehicles.get(&id).cloned())
    }

    async fn vehicle_holds(&mut self, vehicle_id: Uuid) -> AppResult<VehicleHolds> {
        Ok(self.working.holds(vehicle_id))
    }

    async fn insert_vehicle(&mut self, vehicle: &Vehicle) -> AppResult<()> {
        let vehicles = &self.working.vehicles;
        if vehicles.values().any(|v| v.license_plate == vehicle.license_plate) {
            return Err(conflict_error("Vehicle", "license plate", &vehicle.license_plate));
        }
        if vehicles.values().any(|v| v.vin == vehicle.vin) {
            return Err(conflict_error("Vehicle", "VIN", &vehicle.vin));
        }
        self.working.vehicles.insert(vehicle.id, vehicle.clone());
        Ok(())
    }

    async fn save_vehicle(&mut self, vehicle: &Vehicle, expected_version: i64) -> AppResult<Vehicle> {
        let duplicate = self.working.vehicles.values().find(|v| {
            v.id != vehicle.id && (v.license_plate == vehicle.license_plate || v.vin == vehicle.vin)
        });
        if let Some(other) = duplicate {
            return Err(if other.license_plate == vehicle.license_plate {
                conflict_error("Vehicle", "license plate", &vehicle.license_plate)
            } else {
                conflict_error("Vehicle", "VIN", &vehicle.vin)
            });
        }

        let stored = self
            .working
            .vehicles
            .get_mut(&vehicle.id)
            .ok_or_else(|| not_found_error("Vehicle", vehicle.id))?;
        if stored.version != expected_version {
            return Err(LifecycleError::ConcurrencyConflict {
                vehicle_id: vehicle.id,
                expected: expected_version,
                found: stored.version,
            }
            .into());
        }

        let mut next = vehicle.clone();
        next.version = expected_version + 1;
        next.created_at = stored.created_at;
        next.updated_at = Utc::now();
        *stored = next.clone();
        Ok(next)
    }

    async fn lock_trip(&mut self, id: Uuid) -> AppResult<Option<Trip>> {
        Ok(self.working.trips.get(&id).cloned())
    }

    async fn insert_trip(&mut self, trip: &Trip) -> AppResult<()> {
        self.require_vehicle(trip.vehicle_id)?;
        let second_ongoing = trip.status == TripStatus::Ongoing
            && self
                .working
                .trips
                .values()
                .any(|t| t.vehicle_id == trip.vehicle_id && t.status == TripStatus::Ongoing);
        if second_ongoing {
            return Err(AppError::Conflict(format!(
                "Vehicle {} already has an ongoing trip",
                trip.vehicle_id
            )));
        }
        self.working.trips.insert(trip.id, trip.clone());
        Ok(())
    }

    async fn update_trip(&mut self, trip: &Trip) -> AppResult<()> {
        let stored = self
            .working
            .trips
            .get_mut(&trip.id)
            .ok_or_else(|| not_found_error("Trip", trip.id))?;
        *stored = trip.clone();
        Ok(())
    }

    async fn recent_trip_distances(&mut self, vehicle_id: Uuid, limit: i64) -> AppResult<Vec<i64>> {
        let mut completed: Vec<&Trip> = self
            .working
            .trips
            .values()
            .filter(|t| t.vehicle_id == vehicle_id && t.status == TripStatus::Completed && t.end_odometer.is_some())
            .collect();
        completed.sort_by(|a, b| b.end_time.cmp(&a.end_time));
        Ok(completed
            .into_iter()
            .take(limit.max(0) as usize)
            .map(Trip::distance_traveled)
            .collect())
    }

    async fn lock_maintenance(&mut self, id: Uuid) -> AppResult<Option<Maintenance>> {
        Ok(self.working.maintenance.get(&id).cloned())
    }

    async fn insert_maintenance(&mut self, record: &Maintenance) -> AppResult<()> {
        self.require_vehicle(record.vehicle_id)?;
        self.working.maintenance.insert(record.id, record.clone());
        Ok(())
    }

    async fn update_maintenance(&mut self, record: &Maintenance) -> AppResult<()> {
        let stored = self
            .working
            .maintenance
            .get_mut(&record.id)
            .ok_or_else(|| not_found_error("Maintenance", record.id))?;
        *stored = record.clone();
        Ok(())
    }

    async fn lock_accident(&mut self, id: Uuid) -> AppResult<Option<Accident>> {
        Ok(self.working.accidents.get(&id).cloned())
    }

    async fn lock_open_accidents(&mut self, vehicle_id: Uuid) -> AppResult<Vec<Accident>> {
        let mut open: Vec<Accident> = self
            .working
            .accidents
            .values()
            .filter(|a| a.vehicle_id == vehicle_id && !a.status.is_resolved())
            .cloned()
            .collect();
        open.sort_by_key(|a| a.occurred_at);
        Ok(open)
    }

    async fn insert_accident(&mut self, accident: &Accident) -> AppResult<()> {
        self.require_vehicle(accident.vehicle_id)?;
        self.working.accidents.insert(accident.id, accident.clone());
        Ok(())
    }

    async fn update_accident(&mut self, accident: &Accident) -> AppResult<()> {
        let stored = self
            .working
            .accidents
            .get_mut(&accident.id)
            .ok_or_else(|| not_found_error("Accident", accident.id))?;
        *stored = accident.clone();
        Ok(())
    }

    async fn insert_fuel_transaction(&mut self, transaction: &FuelTransaction) -> AppResult<()> {
        self.require_vehicle(transaction.vehicle_id)?;
        self.working.fuel_transactions.insert(transaction.id, transaction.clone());
        Ok(())
    }

    async fn lock_document(&mut self, id: Uuid) -> AppResult<Option<Document>> {
        Ok(self.working.documents.get(&id).cloned())
    }

    async fn insert_document(&mut self, document: &Document) -> AppResult<()> {
        self.require_vehicle(document.vehicle_id)?;
        self.ensure_unique_document(document)?;
        self.working.documents.insert(document.id, document.clone());
        Ok(())
    }

    async fn update_document(&mut self, document: &Document) -> AppResult<()> {
        self.ensure_unique_document(document)?;
        let stored = self
            .working
            .documents
            .get_mut(&document.id)
            .ok_or_else(|| not_found_error("Document", document.id))?;
        *stored = document.clone();
        Ok(())
    }

    async fn lock_user(&mut self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.working.users.get(&id).cloned())
    }

    async fn lock_user_by_username(&mut self, username: &str) -> AppResult<Option<User>> {
        Ok(self.working.users.values().find(|u| u.username == username).cloned())
    }

    async fn insert_user(&mut self, user: &User) -> AppResult<()> {
        let users = &self.working.users;
        if users.values().any(|u| u.username == user.username) {
            return Err(conflict_error("User", "username", &user.username));
        }
        if let Some(employee_id) = &user.employee_id {
            if users.values().any(|u| u.employee_id.as_ref() == Some(employee_id)) {
                return Err(conflict_error("User", "employee id", employee_id));
            }
        }
        self.working.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn update_user(&mut self, user: &User) -> AppResult<()> {
        let stored = self
            .working
            .users
            .get_mut(&user.id)
            .ok_or_else(|| not_found_error("User", user.id))?;
        *stored = user.clone();
        Ok(())
    }

    async fn insert_notifications(&mut self, notifications: &[Notification]) -> AppResult<()> {
        self.working.notifications.extend_from_slice(notifications);
        Ok(())
    }

    async fn mark_notifications_read(&mut self, user_id: Uuid, ids: Option<&[Uuid]>) -> AppResult<u64> {
        let mut marked = 0;
        for notification in self.working.notifications.iter_mut() {
            let selected = ids.map_or(true, |ids| ids.contains(&notification.id));
            if notification.user_id == user_id && !notification.read && selected {
                notification.read = true;
                marked += 1;
            }
        }
        Ok(marked)
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let MemoryFleetTx { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewVehicle, VehicleStatus};

    fn new_vehicle(plate: &str, vin: &str) -> Vehicle {
        Vehicle::register(
            NewVehicle {
                license_plate: plate.to_string(),
                vin: vin.to_string(),
                make: "Tata".to_string(),
                model: "Ace".to_string(),
                year: 2022,
                color: None,
                fuel_type: Some("Diesel".to_string()),
                current_odometer: 1000,
                acquisition_date: None,
                notes: String::new(),
            },
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_dropped_transaction_rolls_back() {
        let store = MemoryFleetStore::new();
        let vehicle = new_vehicle("KA01AB1234", "MA3EWDE1S00123456");

        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_vehicle(&vehicle).await.unwrap();
            // sin commit
        }

        assert!(store.find_vehicle(vehicle.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_vehicle_compare_and_swap() {
        let store = MemoryFleetStore::new();
        let vehicle = new_vehicle("KA01AB1234", "MA3EWDE1S00123456");
        let mut tx = store.begin().await.unwrap();
        tx.insert_vehicle(&vehicle).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let mut locked = tx.lock_vehicle(vehicle.id).await.unwrap().unwrap();
        locked.status = VehicleStatus::InUse;
        let saved = tx.save_vehicle(&locked, 0).await.unwrap();
        assert_eq!(saved.version, 1);

        let err = tx.save_vehicle(&locked, 0).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Lifecycle(LifecycleError::ConcurrencyConflict { expected: 0, found: 1, .. })
        ));
        tx.commit().await.unwrap();

        let stored = store.find_vehicle(vehicle.id).await.unwrap().unwrap();
        assert_eq!(stored.status, VehicleStatus::InUse);
        assert_eq!(stored.version, 1);
    }

    #[tokio::test]
    async fn test_unique_plate_and_vin() {
        let store = MemoryFleetStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.insert_vehicle(&new_vehicle("KA01AB1234", "MA3EWDE1S00123456")).await.unwrap();

        let plate = tx.insert_vehicle(&new_vehicle("KA01AB1234", "MA3EWDE1S00999999")).await;
        assert!(matches!(plate, Err(AppError::Conflict(_))));
        let vin = tx.insert_vehicle(&new_vehicle("KA01ZZ0001", "MA3EWDE1S00123456")).await;
        assert!(matches!(vin, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_documents_expiring_by_date() {
        use crate::models::NewDocument;
        use chrono::NaiveDate;

        let store = MemoryFleetStore::new();
        let vehicle = new_vehicle("KA01AB1234", "MA3EWDE1S00123456");
        let document = |number: &str, expiry: NaiveDate| {
            Document::create(
                NewDocument {
                    vehicle_id: vehicle.id,
                    document_type: "Permit".to_string(),
                    document_number: number.to_string(),
                    issue_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
                    expiry_date: expiry,
                    issuing_authority: None,
                    notes: String::new(),
                },
                Utc::now(),
            )
        };
        let late = document("P-2", NaiveDate::from_ymd_opt(2024, 9, 1).unwrap());
        let early = document("P-1", NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());

        let mut tx = store.begin().await.unwrap();
        tx.insert_vehicle(&vehicle).await.unwrap();
        tx.insert_document(&late).await.unwrap();
        tx.insert_document(&early).await.unwrap();
        let duplicate = tx.insert_document(&document("P-1", early.expiry_date)).await;
        assert!(matches!(duplicate, Err(AppError::Conflict(_))));
        tx.commit().await.unwrap();

        let due = store
            .documents_expiring_by(NaiveDate::from_ymd_opt(2024, 7, 1).unwrap())
            .await
            .unwrap();
        assert_eq!(due.iter().map(|d| d.id).collect::<Vec<_>>(), vec![early.id]);
        let all = store.documents_expiring_by(late.expiry_date).await.unwrap();
        assert_eq!(all.iter().map(|d| d.id).collect::<Vec<_>>(), vec![early.id, late.id]);
    }

    #[test]
    fn test_paginate() {
        let items: Vec<i32> = (0..10).collect();
        assert_eq!(paginate(items.clone(), Some(3), Some(2)), vec![2, 3, 4]);
        assert_eq!(paginate(items.clone(), None, Some(8)), vec![8, 9]);
        assert_eq!(paginate(items, Some(0), None), Vec::<i32>::new());
    }
}
