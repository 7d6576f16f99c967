//! Modelo de User
//!
//! Usuarios locales: personal de flota (cuentas locales) y empleados
//! autenticados contra el sistema de RRHH, que se reconcilian aquí.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Tipo de usuario - mapea al ENUM user_type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "user_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    Admin,
    Manager,
    VehicleManager,
    Driver,
}

impl UserType {
    /// Admin, manager y vehicle_manager gestionan la flota
    pub fn is_fleet_manager(&self) -> bool {
        matches!(self, UserType::Admin | UserType::Manager | UserType::VehicleManager)
    }

    /// Solo admin y manager aprueban conductores
    pub fn can_approve_drivers(&self) -> bool {
        matches!(self, UserType::Admin | UserType::Manager)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Admin => "admin",
            UserType::Manager => "manager",
            UserType::VehicleManager => "vehicle_manager",
            UserType::Driver => "driver",
        }
    }
}

impl std::str::FromStr for UserType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(UserType::Admin),
            "manager" => Ok(UserType::Manager),
            "vehicle_manager" => Ok(UserType::VehicleManager),
            "driver" => Ok(UserType::Driver),
            other => Err(format!("Unknown user type '{}'", other)),
        }
    }
}

/// Estado de aprobación - mapea al ENUM approval_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "approval_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub employee_id: Option<String>,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub user_type: UserType,
    pub approval_status: ApprovalStatus,
    pub is_active: bool,
    pub hr_authenticated_at: Option<DateTime<Utc>>,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Los conductores necesitan aprobación; el personal solo estar activo
    pub fn can_login(&self) -> bool {
        if self.user_type == UserType::Driver {
            self.is_active && self.approval_status == ApprovalStatus::Approved
        } else {
            self.is_active
        }
    }

    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.username)
    }
}

/// Filtros para búsqueda de usuarios
#[derive(Debug, Default, Clone, Deserialize)]
pub struct UserFilters {
    pub approval_status: Option<ApprovalStatus>,
    pub user_type: Option<UserType>,
}
