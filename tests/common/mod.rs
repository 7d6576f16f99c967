//! Fixtures compartidos por los tests de integración

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use uuid::Uuid;

use fleet_management::config::{EnvironmentConfig, StorageBackend};
use fleet_management::models::{ApprovalStatus, NewVehicle, User, UserType, Vehicle};
use fleet_management::repositories::{FleetStore, MemoryFleetStore};
use fleet_management::services::{
    AuthError, AuthenticatedIdentity, Authenticator, Credentials, IdentitySource, StartTrip, StoreNotifier,
};
use fleet_management::AppState;

pub const STAFF_PASSWORD: &str = "fleet-pass";
pub const DRIVER_PASSWORD: &str = "driver-pass";

/// Autenticador en memoria: `fleet` es cuenta local, los números son empleados de RRHH
pub struct StubAuthenticator;

#[async_trait]
impl Authenticator for StubAuthenticator {
    async fn authenticate(&self, credentials: &Credentials) -> Result<AuthenticatedIdentity, AuthError> {
        match (credentials.username.as_str(), credentials.password.as_str()) {
            ("fleet", STAFF_PASSWORD) => Ok(AuthenticatedIdentity {
                username: "fleet".to_string(),
                employee_id: None,
                email: None,
                full_name: Some("Fleet Desk".to_string()),
                user_type: UserType::Manager,
                source: IdentitySource::LocalAccount,
            }),
            (login, DRIVER_PASSWORD) if login.chars().all(|c| c.is_ascii_digit()) => Ok(AuthenticatedIdentity {
                username: login.to_string(),
                employee_id: Some(login.to_string()),
                email: Some(format!("{}@example.com", login)),
                full_name: Some(format!("Employee {}", login)),
                user_type: UserType::Driver,
                source: IdentitySource::HrSystem,
            }),
            _ => Err(AuthError::InvalidCredentials),
        }
    }
}

pub struct Fleet {
    pub store: Arc<dyn FleetStore>,
    pub state: AppState,
    pub manager: User,
    pub driver: User,
}

pub fn test_config() -> EnvironmentConfig {
    EnvironmentConfig {
        storage_backend: StorageBackend::Memory,
        jwt_secret: "integration-test-secret".to_string(),
        ..EnvironmentConfig::default()
    }
}

pub fn user(username: &str, user_type: UserType, approval_status: ApprovalStatus) -> User {
    User {
        id: Uuid::new_v4(),
        username: username.to_string(),
        employee_id: Some(username.to_string()),
        email: None,
        full_name: None,
        user_type,
        approval_status,
        is_active: true,
        hr_authenticated_at: None,
        approved_by: None,
        approved_at: None,
        created_at: Utc::now(),
    }
}

pub async fn insert_user(store: &Arc<dyn FleetStore>, user: &User) {
    let mut tx = store.begin().await.unwrap();
    tx.insert_user(user).await.unwrap();
    tx.commit().await.unwrap();
}

/// Flota vacía con un gestor y un conductor aprobado
pub async fn fleet() -> Fleet {
    let store: Arc<dyn FleetStore> = Arc::new(MemoryFleetStore::new());
    let state = AppState::new(
        test_config(),
        store.clone(),
        Arc::new(StubAuthenticator),
        Arc::new(StoreNotifier::new(store.clone())),
    );

    let manager = user("manager", UserType::Manager, ApprovalStatus::Approved);
    let driver = user("10051", UserType::Driver, ApprovalStatus::Approved);
    insert_user(&store, &manager).await;
    insert_user(&store, &driver).await;

    Fleet {
        store,
        state,
        manager,
        driver,
    }
}

pub fn new_vehicle(n: u32, odometer: i64) -> NewVehicle {
    NewVehicle {
        license_plate: format!("KA01AB{:04}", n),
        vin: format!("MA3EWDE1S00{:06}", n),
        make: "Tata".to_string(),
        model: "Ace".to_string(),
        year: 2021,
        color: None,
        fuel_type: Some("Diesel".to_string()),
        current_odometer: odometer,
        acquisition_date: None,
        notes: String::new(),
    }
}

impl Fleet {
    pub async fn vehicle(&self, n: u32, odometer: i64) -> Vehicle {
        self.state
            .vehicles
            .create(&self.manager, new_vehicle(n, odometer))
            .await
            .unwrap()
    }

    pub async fn reload(&self, vehicle: &Vehicle) -> Vehicle {
        self.store.find_vehicle(vehicle.id).await.unwrap().unwrap()
    }

    /// Mueve el inicio del viaje al pasado para el barrido
    pub async fn backdate_trip(&self, trip_id: Uuid, hours: i64) {
        let mut tx = self.store.begin().await.unwrap();
        let mut trip = tx.lock_trip(trip_id).await.unwrap().unwrap();
        trip.start_time = Utc::now() - Duration::hours(hours);
        tx.update_trip(&trip).await.unwrap();
        tx.commit().await.unwrap();
    }
}

pub fn start(vehicle: &Vehicle, start_odometer: i64) -> StartTrip {
    StartTrip {
        vehicle_id: vehicle.id,
        start_odometer,
        origin: "Depot".to_string(),
        destination: "Plant 2".to_string(),
        purpose: "Delivery".to_string(),
    }
}
