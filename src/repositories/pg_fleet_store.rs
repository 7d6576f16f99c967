//! Backend PostgreSQL
//!
//! Bloqueo pesimista con `SELECT ... FOR UPDATE` dentro de la transacción y
//! compare-and-swap sobre `vehicles.version` en cada escritura del vehículo.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{FleetStore, FleetTx};
use crate::lifecycle::{Hold, LifecycleError, VehicleHolds};
use crate::models::{
    Accident, AccidentFilters, Document, DocumentFilters, FuelFilters, FuelTransaction, Maintenance,
    MaintenanceFilters, Notification, Trip, TripFilters, User, UserFilters, Vehicle, VehicleFilters,
};
use crate::utils::errors::{not_found_error, AppError, AppResult};

const HOLDS_QUERY: &str = r#"
    SELECT 'trip' AS kind, id FROM trips
        WHERE vehicle_id = $1 AND status = 'ongoing'
    UNION ALL
    SELECT 'maintenance' AS kind, id FROM maintenance_records
        WHERE vehicle_id = $1 AND status = 'in_progress'
    UNION ALL
    SELECT 'accident' AS kind, id FROM accidents
        WHERE vehicle_id = $1 AND grounds_vehicle AND status <> 'resolved'
"#;

/// Violaciones de unicidad (23505) se traducen a `Conflict`
fn map_write_error(e: sqlx::Error, resource: &str) -> AppError {
    if let sqlx::Error::Database(db) = &e {
        if db.code().as_deref() == Some("23505") {
            return AppError::Conflict(format!(
                "{} violates unique constraint '{}'",
                resource,
                db.constraint().unwrap_or("unknown")
            ));
        }
    }
    AppError::Database(e)
}

fn holds_from_rows(rows: Vec<(String, Uuid)>) -> VehicleHolds {
    VehicleHolds::from_holds(rows.into_iter().filter_map(|(kind, id)| match kind.as_str() {
        "trip" => Some(Hold::Trip(id)),
        "maintenance" => Some(Hold::Maintenance(id)),
        "accident" => Some(Hold::Accident(id)),
        _ => None,
    }))
}

#[derive(Clone)]
pub struct PgFleetStore {
    pool: PgPool,
}

impl PgFleetStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl FleetStore for PgFleetStore {
    async fn begin(&self) -> AppResult<Box<dyn FleetTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgFleetTx { tx }))
    }

    async fn find_vehicle(&self, id: Uuid) -> AppResult<Option<Vehicle>> {
        let vehicle = sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(vehicle)
    }

    async fn list_vehicles(&self, filters: &VehicleFilters) -> AppResult<Vec<Vehicle>> {
        let vehicles = sqlx::query_as::<_, Vehicle>(
            r#"
            SELECT * FROM vehicles
            WHERE ($1::vehicle_status IS NULL OR status = $1)
            ORDER BY license_plate
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(filters.status)
        .bind(filters.limit)
        .bind(filters.offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(vehicles)
    }

    async fn vehicle_holds(&self, vehicle_id: Uuid) -> AppResult<VehicleHolds> {
        let rows = sqlx::query_as::<_, (String, Uuid)>(HOLDS_QUERY)
            .bind(vehicle_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(holds_from_rows(rows))
    }

    async fn find_trip(&self, id: Uuid) -> AppResult<Option<Trip>> {
        let trip = sqlx::query_as::<_, Trip>("SELECT * FROM trips WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(trip)
    }

    async fn list_trips(&self, filters: &TripFilters) -> AppResult<Vec<Trip>> {
        let trips = sqlx::query_as::<_, Trip>(
            r#"
            SELECT * FROM trips
            WHERE ($1::trip_status IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR vehicle_id = $2)
              AND ($3::uuid IS NULL OR driver_id = $3)
            ORDER BY start_time DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(filters.status)
        .bind(filters.vehicle_id)
        .bind(filters.driver_id)
        .bind(filters.limit)
        .bind(filters.offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(trips)
    }

    async fn stale_trips(&self, cutoff: DateTime<Utc>) -> AppResult<Vec<Trip>> {
        let trips = sqlx::query_as::<_, Trip>(
            "SELECT * FROM trips WHERE status = 'ongoing' AND start_time < $1 ORDER BY start_time",
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;
        Ok(trips)
    }

    async fn find_maintenance(&self, id: Uuid) -> AppResult<Option<Maintenance>> {
        let record = sqlx::query_as::<_, Maintenance>("SELECT * FROM maintenance_records WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    async fn list_maintenance(&self, filters: &MaintenanceFilters) -> AppResult<Vec<Maintenance>> {
        let records = sqlx::query_as::<_, Maintenance>(
            r#"
            SELECT * FROM maintenance_records
            WHERE ($1::maintenance_status IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR vehicle_id = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(filters.status)
        .bind(filters.vehicle_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    async fn find_accident(&self, id: Uuid) -> AppResult<Option<Accident>> {
        let accident = sqlx::query_as::<_, Accident>("SELECT * FROM accidents WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(accident)
    }

    async fn list_accidents(&self, filters: &AccidentFilters) -> AppResult<Vec<Accident>> {
        let accidents = sqlx::query_as::<_, Accident>(
            r#"
            SELECT * FROM accidents
            WHERE ($1::accident_status IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR vehicle_id = $2)
            ORDER BY occurred_at DESC
            "#,
        )
        .bind(filters.status)
        .bind(filters.vehicle_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(accidents)
    }

    async fn find_fuel_transaction(&self, id: Uuid) -> AppResult<Option<FuelTransaction>> {
        let transaction = sqlx::query_as::<_, FuelTransaction>("SELECT * FROM fuel_transactions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(transaction)
    }

    async fn list_fuel_transactions(&self, filters: &FuelFilters) -> AppResult<Vec<FuelTransaction>> {
        let transactions = sqlx::query_as::<_, FuelTransaction>(
            r#"
            SELECT * FROM fuel_transactions
            WHERE ($1::uuid IS NULL OR vehicle_id = $1)
              AND ($2::uuid IS NULL OR driver_id = $2)
            ORDER BY date DESC, created_at DESC
            "#,
        )
        .bind(filters.vehicle_id)
        .bind(filters.driver_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(transactions)
    }

    async fn find_document(&self, id: Uuid) -> AppResult<Option<Document>> {
        let document = sqlx::query_as::<_, Document>("SELECT * FROM vehicle_documents WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(document)
    }

    async fn list_documents(&self, filters: &DocumentFilters) -> AppResult<Vec<Document>> {
        let documents = sqlx::query_as::<_, Document>(
            r#"
            SELECT * FROM vehicle_documents
            WHERE ($1::uuid IS NULL OR vehicle_id = $1)
              AND ($2::text IS NULL OR LOWER(document_type) = LOWER($2))
            ORDER BY expiry_date
            "#,
        )
        .bind(filters.vehicle_id)
        .bind(&filters.document_type)
        .fetch_all(&self.pool)
        .await?;
        Ok(documents)
    }

    async fn documents_expiring_by(&self, date: NaiveDate) -> AppResult<Vec<Document>> {
        let documents =
            sqlx::query_as::<_, Document>("SELECT * FROM vehicle_documents WHERE expiry_date <= $1 ORDER BY expiry_date")
                .bind(date)
                .fetch_all(&self.pool)
                .await?;
        Ok(documents)
    }

    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn list_users(&self, filters: &UserFilters) -> AppResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE ($1::approval_status IS NULL OR approval_status = $1)
              AND ($2::user_type IS NULL OR user_type = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(filters.approval_status)
        .bind(filters.user_type)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn fleet_managers(&self) -> AppResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE is_active AND user_type IN ('admin', 'manager', 'vehicle_manager')
            ORDER BY username
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn list_notifications(&self, user_id: Uuid, unread_only: bool) -> AppResult<Vec<Notification>> {
        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT * FROM notifications
            WHERE user_id = $1 AND (NOT $2 OR NOT read)
            ORDER BY created_at DESC
            LIMIT 100
            "#,
        )
        .bind(user_id)
        .bind(unread_only)
        .fetch_all(&self.pool)
        .await?;
        Ok(notifications)
    }
}

pub struct PgFleetTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl FleetTx for PgFleetTx {
    async fn lock_vehicle(&mut self, id: Uuid) -> AppResult<Option<Vehicle>> {
        let vehicle = sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(vehicle)
    }

    async fn vehicle_holds(&mut self, vehicle_id: Uuid) -> AppResult<VehicleHolds> {
        let rows = sqlx::query_as::<_, (String, Uuid)>(HOLDS_QUERY)
            .bind(vehicle_id)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(holds_from_rows(rows))
    }

    async fn insert_vehicle(&mut self, vehicle: &Vehicle) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO vehicles (id, license_plate, vin, make, model, year, color, fuel_type, status,
                                  current_odometer, acquisition_date, notes, version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(vehicle.id)
        .bind(&vehicle.license_plate)
        .bind(&vehicle.vin)
        .bind(&vehicle.make)
        .bind(&vehicle.model)
        .bind(vehicle.year)
        .bind(&vehicle.color)
        .bind(&vehicle.fuel_type)
        .bind(vehicle.status)
        .bind(vehicle.current_odometer)
        .bind(vehicle.acquisition_date)
        .bind(&vehicle.notes)
        .bind(vehicle.version)
        .bind(vehicle.created_at)
        .bind(vehicle.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_write_error(e, "Vehicle"))?;
        Ok(())
    }

    async fn save_vehicle(&mut self, vehicle: &Vehicle, expected_version: i64) -> AppResult<Vehicle> {
        let updated = sqlx::query_as::<_, Vehicle>(
            r#"
            UPDATE vehicles
            SET license_plate = $3, vin = $4, make = $5, model = $6, year = $7, color = $8,
                fuel_type = $9, status = $10, current_odometer = $11, acquisition_date = $12,
                notes = $13, version = version + 1, updated_at = $14
            WHERE id = $1 AND version = $2
            RETURNING *
            "#,
        )
        .bind(vehicle.id)
        .bind(expected_version)
        .bind(&vehicle.license_plate)
        .bind(&vehicle.vin)
        .bind(&vehicle.make)
        .bind(&vehicle.model)
        .bind(vehicle.year)
        .bind(&vehicle.color)
        .bind(&vehicle.fuel_type)
        .bind(vehicle.status)
        .bind(vehicle.current_odometer)
        .bind(vehicle.acquisition_date)
        .bind(&vehicle.notes)
        .bind(Utc::now())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_write_error(e, "Vehicle"))?;

        if let Some(updated) = updated {
            return Ok(updated);
        }

        let current: Option<(i64,)> = sqlx::query_as("SELECT version FROM vehicles WHERE id = $1")
            .bind(vehicle.id)
            .fetch_optional(&mut *self.tx)
            .await?;
        match current {
            Some((found,)) => Err(LifecycleError::ConcurrencyConflict {
                vehicle_id: vehicle.id,
                expected: expected_version,
                found,
            }
            .into()),
            None => Err(not_found_error("Vehicle", vehicle.id)),
        }
    }

    async fn lock_trip(&mut self, id: Uuid) -> AppResult<Option<Trip>> {
        let trip = sqlx::query_as::<_, Trip>("SELECT * FROM trips WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(trip)
    }

    async fn insert_trip(&mut self, trip: &Trip) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO trips (id, vehicle_id, driver_id, status, origin, destination, purpose, start_time,
                               end_time, start_odometer, end_odometer, notes, auto_ended, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(trip.id)
        .bind(trip.vehicle_id)
        .bind(trip.driver_id)
        .bind(trip.status)
        .bind(&trip.origin)
        .bind(&trip.destination)
        .bind(&trip.purpose)
        .bind(trip.start_time)
        .bind(trip.end_time)
        .bind(trip.start_odometer)
        .bind(trip.end_odometer)
        .bind(&trip.notes)
        .bind(trip.auto_ended)
        .bind(trip.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_write_error(e, "Trip"))?;
        Ok(())
    }

    async fn update_trip(&mut self, trip: &Trip) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE trips
            SET status = $2, end_time = $3, end_odometer = $4, notes = $5, auto_ended = $6
            WHERE id = $1
            "#,
        )
        .bind(trip.id)
        .bind(trip.status)
        .bind(trip.end_time)
        .bind(trip.end_odometer)
        .bind(&trip.notes)
        .bind(trip.auto_ended)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn recent_trip_distances(&mut self, vehicle_id: Uuid, limit: i64) -> AppResult<Vec<i64>> {
        let rows: Vec<(i64,)> = sqlx::query_as(
            r#"
            SELECT end_odometer - start_odometer FROM trips
            WHERE vehicle_id = $1 AND status = 'completed' AND end_odometer IS NOT NULL
            ORDER BY end_time DESC
            LIMIT $2
            "#,
        )
        .bind(vehicle_id)
        .bind(limit)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(rows.into_iter().map(|(distance,)| distance).collect())
    }

    async fn lock_maintenance(&mut self, id: Uuid) -> AppResult<Option<Maintenance>> {
        let record = sqlx::query_as::<_, Maintenance>("SELECT * FROM maintenance_records WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(record)
    }

    async fn insert_maintenance(&mut self, record: &Maintenance) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO maintenance_records (id, vehicle_id, reported_by, maintenance_type, provider, description,
                                             odometer_reading, status, scheduled_date, completion_date, cost, notes,
                                             created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(record.id)
        .bind(record.vehicle_id)
        .bind(record.reported_by)
        .bind(&record.maintenance_type)
        .bind(&record.provider)
        .bind(&record.description)
        .bind(record.odometer_reading)
        .bind(record.status)
        .bind(record.scheduled_date)
        .bind(record.completion_date)
        .bind(record.cost)
        .bind(&record.notes)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_write_error(e, "Maintenance"))?;
        Ok(())
    }

    async fn update_maintenance(&mut self, record: &Maintenance) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE maintenance_records
            SET status = $2, completion_date = $3, cost = $4, notes = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(record.id)
        .bind(record.status)
        .bind(record.completion_date)
        .bind(record.cost)
        .bind(&record.notes)
        .bind(record.updated_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn lock_accident(&mut self, id: Uuid) -> AppResult<Option<Accident>> {
        let accident = sqlx::query_as::<_, Accident>("SELECT * FROM accidents WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(accident)
    }

    async fn lock_open_accidents(&mut self, vehicle_id: Uuid) -> AppResult<Vec<Accident>> {
        let accidents = sqlx::query_as::<_, Accident>(
            r#"
            SELECT * FROM accidents
            WHERE vehicle_id = $1 AND status <> 'resolved'
            ORDER BY occurred_at
            FOR UPDATE
            "#,
        )
        .bind(vehicle_id)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(accidents)
    }

    async fn insert_accident(&mut self, accident: &Accident) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO accidents (id, vehicle_id, driver_id, occurred_at, location, description, damage_description,
                                   third_party_involved, injuries, police_report_number, estimated_cost, actual_cost,
                                   status, grounds_vehicle, resolution_date, notes, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            "#,
        )
        .bind(accident.id)
        .bind(accident.vehicle_id)
        .bind(accident.driver_id)
        .bind(accident.occurred_at)
        .bind(&accident.location)
        .bind(&accident.description)
        .bind(&accident.damage_description)
        .bind(accident.third_party_involved)
        .bind(accident.injuries)
        .bind(&accident.police_report_number)
        .bind(accident.estimated_cost)
        .bind(accident.actual_cost)
        .bind(accident.status)
        .bind(accident.grounds_vehicle)
        .bind(accident.resolution_date)
        .bind(&accident.notes)
        .bind(accident.created_at)
        .bind(accident.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_write_error(e, "Accident"))?;
        Ok(())
    }

    async fn update_accident(&mut self, accident: &Accident) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE accidents
            SET status = $2, grounds_vehicle = $3, resolution_date = $4, actual_cost = $5, notes = $6, updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(accident.id)
        .bind(accident.status)
        .bind(accident.grounds_vehicle)
        .bind(accident.resolution_date)
        .bind(accident.actual_cost)
        .bind(&accident.notes)
        .bind(accident.updated_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn insert_fuel_transaction(&mut self, transaction: &FuelTransaction) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO fuel_transactions (id, vehicle_id, driver_id, date, fuel_type, quantity, cost_per_liter,
                                           energy_consumed, cost_per_kwh, total_cost, odometer_reading,
                                           station_name, notes, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(transaction.id)
        .bind(transaction.vehicle_id)
        .bind(transaction.driver_id)
        .bind(transaction.date)
        .bind(&transaction.fuel_type)
        .bind(transaction.quantity)
        .bind(transaction.cost_per_liter)
        .bind(transaction.energy_consumed)
        .bind(transaction.cost_per_kwh)
        .bind(transaction.total_cost)
        .bind(transaction.odometer_reading)
        .bind(&transaction.station_name)
        .bind(&transaction.notes)
        .bind(transaction.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_write_error(e, "FuelTransaction"))?;
        Ok(())
    }

    async fn lock_document(&mut self, id: Uuid) -> AppResult<Option<Document>> {
        let document = sqlx::query_as::<_, Document>("SELECT * FROM vehicle_documents WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(document)
    }

    async fn insert_document(&mut self, document: &Document) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO vehicle_documents (id, vehicle_id, document_type, document_number, issue_date, expiry_date,
                                           issuing_authority, notes, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(document.id)
        .bind(document.vehicle_id)
        .bind(&document.document_type)
        .bind(&document.document_number)
        .bind(document.issue_date)
        .bind(document.expiry_date)
        .bind(&document.issuing_authority)
        .bind(&document.notes)
        .bind(document.created_at)
        .bind(document.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_write_error(e, "Document"))?;
        Ok(())
    }

    async fn update_document(&mut self, document: &Document) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE vehicle_documents
            SET document_number = $2, issue_date = $3, expiry_date = $4, issuing_authority = $5, notes = $6,
                updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(document.id)
        .bind(&document.document_number)
        .bind(document.issue_date)
        .bind(document.expiry_date)
        .bind(&document.issuing_authority)
        .bind(&document.notes)
        .bind(document.updated_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn lock_user(&mut self, id: Uuid) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(user)
    }

    async fn lock_user_by_username(&mut self, username: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1 FOR UPDATE")
            .bind(username)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(user)
    }

    async fn insert_user(&mut self, user: &User) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, employee_id, email, full_name, user_type, approval_status, is_active,
                               hr_authenticated_at, approved_by, approved_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.employee_id)
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(user.user_type)
        .bind(user.approval_status)
        .bind(user.is_active)
        .bind(user.hr_authenticated_at)
        .bind(user.approved_by)
        .bind(user.approved_at)
        .bind(user.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_write_error(e, "User"))?;
        Ok(())
    }

    async fn update_user(&mut self, user: &User) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET email = $2, full_name = $3, user_type = $4, approval_status = $5, is_active = $6,
                hr_authenticated_at = $7, approved_by = $8, approved_at = $9
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(user.user_type)
        .bind(user.approval_status)
        .bind(user.is_active)
        .bind(user.hr_authenticated_at)
        .bind(user.approved_by)
        .bind(user.approved_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn insert_notifications(&mut self, notifications: &[Notification]) -> AppResult<()> {
        for notification in notifications {
            sqlx::query(
                r#"
                INSERT INTO notifications (id, user_id, text, link, icon, level, read, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(notification.id)
            .bind(notification.user_id)
            .bind(&notification.text)
            .bind(&notification.link)
            .bind(&notification.icon)
            .bind(notification.level)
            .bind(notification.read)
            .bind(notification.created_at)
            .execute(&mut *self.tx)
            .await?;
        }
        Ok(())
    }

    async fn mark_notifications_read(&mut self, user_id: Uuid, ids: Option<&[Uuid]>) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE notifications SET read = TRUE
            WHERE user_id = $1 AND NOT read AND ($2::uuid[] IS NULL OR id = ANY($2))
            "#,
        )
        .bind(user_id)
        .bind(ids.map(|ids| ids.to_vec()))
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let PgFleetTx { tx } = *self;
        tx.commit().await?;
        Ok(())
    }
}
