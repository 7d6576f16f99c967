//! DTOs de la API
//!
//! Requests validados con `validator` y envoltorio común de respuestas.

pub mod accident_dto;
pub mod auth_dto;
pub mod document_dto;
pub mod fuel_dto;
pub mod maintenance_dto;
pub mod notification_dto;
pub mod trip_dto;
pub mod vehicle_dto;

use serde::Serialize;

pub use accident_dto::*;
pub use auth_dto::*;
pub use document_dto::*;
pub use fuel_dto::*;
pub use maintenance_dto::*;
pub use notification_dto::*;
pub use trip_dto::*;
pub use vehicle_dto::*;

/// Respuesta estándar de la API
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        }
    }
}
