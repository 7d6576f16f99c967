//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum.

use std::sync::Arc;

use crate::config::environment::EnvironmentConfig;
use crate::repositories::FleetStore;
use crate::services::{
    AccidentService, AuthService, Authenticator, AutoEndService, DocumentService, FuelService, MaintenanceService,
    NotificationService, Notifier, ReportService, SweepOptions, TripService, UserService, VehicleService,
};
use crate::utils::jwt::JwtConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: EnvironmentConfig,
    pub jwt: JwtConfig,
    pub store: Arc<dyn FleetStore>,
    pub auth: AuthService,
    pub users: UserService,
    pub vehicles: VehicleService,
    pub trips: TripService,
    pub maintenance: MaintenanceService,
    pub accidents: AccidentService,
    pub fuel: FuelService,
    pub documents: DocumentService,
    pub notifications: NotificationService,
    pub reports: ReportService,
    pub auto_end: AutoEndService,
}

impl AppState {
    pub fn new(
        config: EnvironmentConfig,
        store: Arc<dyn FleetStore>,
        authenticator: Arc<dyn Authenticator>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let jwt = JwtConfig::from(&config);
        let notifications = NotificationService::new(store.clone(), notifier);
        let users = UserService::new(store.clone(), notifications.clone());
        let trips = TripService::new(store.clone(), notifications.clone());

        Self {
            auth: AuthService::new(authenticator, users.clone(), jwt.clone()),
            vehicles: VehicleService::new(store.clone()),
            maintenance: MaintenanceService::new(store.clone(), notifications.clone()),
            accidents: AccidentService::new(store.clone(), notifications.clone()),
            fuel: FuelService::new(store.clone()),
            documents: DocumentService::new(store.clone()),
            reports: ReportService::new(store.clone()),
            auto_end: AutoEndService::new(store.clone(), trips.clone(), notifications.clone()),
            trips,
            users,
            notifications,
            jwt,
            store,
            config,
        }
    }

    /// Opciones del barrido según la configuración
    pub fn sweep_options(&self, dry_run: bool) -> SweepOptions {
        SweepOptions {
            timeout_hours: self.config.trip_auto_end_hours,
            default_distance: self.config.trip_default_distance_km,
            dry_run,
        }
    }
}
