//! Modelo de Document
//!
//! Documentación del vehículo (permiso de circulación, seguro, ITV...) con
//! fecha de caducidad. Mapea a `vehicle_documents`.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

/// Días de antelación con los que un documento cuenta como "por caducar"
pub const EXPIRY_WARNING_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryStatus {
    Valid,
    ExpiringSoon,
    Expired,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Document {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub document_type: String,
    pub document_number: String,
    pub issue_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub issuing_authority: Option<String>,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewDocument {
    pub vehicle_id: Uuid,
    pub document_type: String,
    pub document_number: String,
    pub issue_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub issuing_authority: Option<String>,
    pub notes: String,
}

impl Document {
    pub fn create(new: NewDocument, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            vehicle_id: new.vehicle_id,
            document_type: new.document_type,
            document_number: new.document_number,
            issue_date: new.issue_date,
            expiry_date: new.expiry_date,
            issuing_authority: new.issuing_authority,
            notes: new.notes,
            created_at: now,
            updated_at: now,
        }
    }

    /// Negativo si ya caducó
    pub fn days_until_expiry(&self, today: NaiveDate) -> i64 {
        (self.expiry_date - today).num_days()
    }

    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expiry_date < today
    }

    /// Caduca hoy o dentro de los próximos `EXPIRY_WARNING_DAYS` días
    pub fn is_expiring_soon(&self, today: NaiveDate) -> bool {
        (0..=EXPIRY_WARNING_DAYS).contains(&self.days_until_expiry(today))
    }

    pub fn expiry_status(&self, today: NaiveDate) -> ExpiryStatus {
        if self.is_expired(today) {
            ExpiryStatus::Expired
        } else if self.is_expiring_soon(today) {
            ExpiryStatus::ExpiringSoon
        } else {
            ExpiryStatus::Valid
        }
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct DocumentFilters {
    pub vehicle_id: Option<Uuid>,
    pub document_type: Option<String>,
}
