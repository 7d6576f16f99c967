use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{Document, ExpiryStatus, NewDocument};
use crate::services::DocumentUpdate;
use crate::utils::validation::{clean_optional, validate_not_empty};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateDocumentRequest {
    pub vehicle_id: Uuid,
    #[validate(length(min = 1, max = 100), custom = "validate_not_empty")]
    pub document_type: String,
    #[validate(length(min = 1, max = 100), custom = "validate_not_empty")]
    pub document_number: String,
    pub issue_date: NaiveDate,
    pub expiry_date: NaiveDate,
    #[validate(length(max = 100))]
    pub issuing_authority: Option<String>,
    #[serde(default)]
    pub notes: String,
}

impl From<CreateDocumentRequest> for NewDocument {
    fn from(request: CreateDocumentRequest) -> Self {
        NewDocument {
            vehicle_id: request.vehicle_id,
            document_type: request.document_type.trim().to_string(),
            document_number: request.document_number.trim().to_string(),
            issue_date: request.issue_date,
            expiry_date: request.expiry_date,
            issuing_authority: clean_optional(request.issuing_authority),
            notes: request.notes,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateDocumentRequest {
    #[validate(length(min = 1, max = 100), custom = "validate_not_empty")]
    pub document_number: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    #[validate(length(max = 100))]
    pub issuing_authority: Option<String>,
    pub notes: Option<String>,
}

impl From<UpdateDocumentRequest> for DocumentUpdate {
    fn from(request: UpdateDocumentRequest) -> Self {
        DocumentUpdate {
            document_number: request.document_number.map(|n| n.trim().to_string()),
            issue_date: request.issue_date,
            expiry_date: request.expiry_date,
            issuing_authority: clean_optional(request.issuing_authority),
            notes: request.notes,
        }
    }
}

fn default_window() -> i64 {
    crate::models::EXPIRY_WARNING_DAYS
}

#[derive(Debug, Deserialize, Validate)]
pub struct ExpiringDocumentsQuery {
    #[serde(default = "default_window")]
    #[validate(range(min = 0, max = 3650))]
    pub days: i64,
}

/// Documento con su estado de caducidad a fecha de hoy
#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    #[serde(flatten)]
    pub document: Document,
    pub expiry_status: ExpiryStatus,
    pub days_until_expiry: i64,
}

impl DocumentResponse {
    pub fn new(document: Document, today: NaiveDate) -> Self {
        Self {
            expiry_status: document.expiry_status(today),
            days_until_expiry: document.days_until_expiry(today),
            document,
        }
    }
}
