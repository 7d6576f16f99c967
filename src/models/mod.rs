//! Modelos del sistema
//!
//! Este módulo contiene todos los modelos de datos que mapean exactamente
//! al schema PostgreSQL de la flota.

pub mod accident;
pub mod document;
pub mod fuel;
pub mod maintenance;
pub mod notification;
pub mod trip;
pub mod user;
pub mod vehicle;

pub use accident::{Accident, AccidentFilters, AccidentStatus, NewAccident};
pub use document::{Document, DocumentFilters, ExpiryStatus, NewDocument, EXPIRY_WARNING_DAYS};
pub use fuel::{FuelFilters, FuelTransaction, NewFuelTransaction, ELECTRIC_FUEL_TYPE};
pub use maintenance::{Maintenance, MaintenanceFilters, MaintenanceStatus, NewMaintenance};
pub use notification::{Notification, NotificationLevel};
pub use trip::{NewTrip, Trip, TripFilters, TripStatus};
pub use user::{ApprovalStatus, User, UserFilters, UserType};
pub use vehicle::{NewVehicle, Vehicle, VehicleFilters, VehicleStatus};
