//! Servicio de documentación de vehículos

use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use super::require_fleet_manager;
use crate::models::{Document, DocumentFilters, NewDocument, User};
use crate::repositories::FleetStore;
use crate::utils::errors::{not_found_error, AppError, AppResult};

/// Ventana máxima de la consulta de caducidades (días)
pub const MAX_EXPIRY_WINDOW_DAYS: i64 = 3650;

#[derive(Debug, Clone)]
pub struct DocumentUpdate {
    pub document_number: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub issuing_authority: Option<String>,
    pub notes: Option<String>,
}

fn ensure_dates(issue_date: NaiveDate, expiry_date: NaiveDate) -> AppResult<()> {
    if expiry_date < issue_date {
        return Err(AppError::BadRequest(format!(
            "expiry_date {} is before issue_date {}",
            expiry_date, issue_date
        )));
    }
    Ok(())
}

#[derive(Clone)]
pub struct DocumentService {
    store: Arc<dyn FleetStore>,
}

impl DocumentService {
    pub fn new(store: Arc<dyn FleetStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, actor: &User, new: NewDocument) -> AppResult<Document> {
        require_fleet_manager(actor, "register documents")?;
        ensure_dates(new.issue_date, new.expiry_date)?;

        let mut tx = self.store.begin().await?;
        let vehicle = tx
            .lock_vehicle(new.vehicle_id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", new.vehicle_id))?;
        let document = Document::create(new, Utc::now());
        tx.insert_document(&document).await?;
        tx.commit().await?;

        info!(
            "📄 Documento {} ({}) registrado para {}, caduca {}",
            document.document_number, document.document_type, vehicle.license_plate, document.expiry_date
        );
        Ok(document)
    }

    pub async fn update(&self, actor: &User, id: Uuid, update: DocumentUpdate) -> AppResult<Document> {
        require_fleet_manager(actor, "update documents")?;

        let mut tx = self.store.begin().await?;
        let mut document = tx
            .lock_document(id)
            .await?
            .ok_or_else(|| not_found_error("Document", id))?;
        if let Some(number) = update.document_number {
            document.document_number = number;
        }
        if let Some(issue_date) = update.issue_date {
            document.issue_date = issue_date;
        }
        if let Some(expiry_date) = update.expiry_date {
            document.expiry_date = expiry_date;
        }
        if update.issuing_authority.is_some() {
            document.issuing_authority = update.issuing_authority;
        }
        if let Some(notes) = update.notes {
            document.notes = notes;
        }
        ensure_dates(document.issue_date, document.expiry_date)?;
        document.updated_at = Utc::now();
        tx.update_document(&document).await?;
        tx.commit().await?;

        info!("📄 Documento {} actualizado, caduca {}", document.id, document.expiry_date);
        Ok(document)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Document> {
        self.store
            .find_document(id)
            .await?
            .ok_or_else(|| not_found_error("Document", id))
    }

    pub async fn list(&self, filters: &DocumentFilters) -> AppResult<Vec<Document>> {
        self.store.list_documents(filters).await
    }

    /// Documentos caducados o que caducan en los próximos `days` días
    pub async fn expiring(&self, today: NaiveDate, days: i64) -> AppResult<Vec<Document>> {
        if !(0..=MAX_EXPIRY_WINDOW_DAYS).contains(&days) {
            return Err(AppError::BadRequest(format!(
                "days must be between 0 and {}",
                MAX_EXPIRY_WINDOW_DAYS
            )));
        }
        let horizon = today
            .checked_add_signed(Duration::days(days))
            .unwrap_or(NaiveDate::MAX);
        let documents = self.store.documents_expiring_by(horizon).await?;
        let expired = documents.iter().filter(|d| d.is_expired(today)).count();
        if expired > 0 {
            warn!("📄 {} documento(s) caducado(s) a fecha {}", expired, today);
        }
        Ok(documents)
    }
}
