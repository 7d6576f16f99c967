//! Notificaciones de sistema por usuario

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "notification_level", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Danger,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub text: String,
    pub link: String,
    pub icon: String,
    pub level: NotificationLevel,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(user_id: Uuid, text: impl Into<String>, link: impl Into<String>, icon: &str, level: NotificationLevel) -> Self {
        let mut text = text.into();
        // La columna admite 255 caracteres
        if text.chars().count() > 255 {
            text = text.chars().take(255).collect();
        }
        Self {
            id: Uuid::new_v4(),
            user_id,
            text,
            link: link.into(),
            icon: icon.to_string(),
            level,
            read: false,
            created_at: Utc::now(),
        }
    }
}
