//! Services module
//!
//! Este módulo contiene la lógica de negocio de la aplicación. Cada servicio
//! orquesta una transacción del `FleetStore` alrededor de las reglas puras
//! de `lifecycle` y emite notificaciones después del commit.

pub mod accident_service;
pub mod auth_service;
pub mod auto_end_service;
pub mod document_service;
pub mod fuel_service;
pub mod maintenance_service;
pub mod notification_service;
pub mod report_service;
pub mod trip_service;
pub mod user_service;
pub mod vehicle_service;

pub use accident_service::{AccidentService, AccidentStatusChange, ReportAccident};
pub use auth_service::{
    AuthError, AuthService, AuthenticatedIdentity, Authenticator, ChainAuthenticator, Credentials,
    EmployeeIdentity, HrAuthClient, IdentitySource, LocalAccountAuthenticator, LoginOutcome,
};
pub use auto_end_service::{AutoEndService, SweepEntry, SweepOptions, SweepReport};
pub use document_service::{DocumentService, DocumentUpdate, MAX_EXPIRY_WINDOW_DAYS};
pub use fuel_service::{FuelService, RecordFuel};
pub use maintenance_service::{CreateMaintenance, MaintenanceService, MaintenanceStatusChange};
pub use notification_service::{NotificationMessage, NotificationService, Notifier, StoreNotifier, TracingNotifier};
pub use report_service::{DataQualityReport, FleetStatusReport, ReportService, StatusDrift};
pub use trip_service::{StartTrip, TripService};
pub use user_service::UserService;
pub use vehicle_service::{VehicleService, VehicleUpdate};

use crate::models::User;
use crate::utils::errors::{forbidden_error, AppResult};

pub(crate) fn require_fleet_manager(actor: &User, operation: &str) -> AppResult<()> {
    if actor.user_type.is_fleet_manager() {
        Ok(())
    } else {
        Err(forbidden_error(operation, "fleet manager role required"))
    }
}

/// Activo y, si es conductor, aprobado
pub(crate) fn require_approved(actor: &User, operation: &str) -> AppResult<()> {
    if actor.can_login() {
        Ok(())
    } else {
        Err(forbidden_error(operation, "account is inactive or pending approval"))
    }
}
