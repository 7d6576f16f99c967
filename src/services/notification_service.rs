//! Servicio de notificaciones
//!
//! Las notificaciones se emiten siempre después del `commit`: un fallo al
//! notificar se registra pero nunca deshace la transición.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};
use uuid::Uuid;

use crate::models::{Notification, NotificationLevel, User};
use crate::repositories::FleetStore;
use crate::utils::errors::AppResult;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notifications: Vec<Notification>);
}

/// Persiste una fila de notificación por usuario
pub struct StoreNotifier {
    store: Arc<dyn FleetStore>,
}

impl StoreNotifier {
    pub fn new(store: Arc<dyn FleetStore>) -> Self {
        Self { store }
    }

    async fn persist(&self, notifications: &[Notification]) -> AppResult<()> {
        let mut tx = self.store.begin().await?;
        tx.insert_notifications(notifications).await?;
        tx.commit().await
    }
}

#[async_trait]
impl Notifier for StoreNotifier {
    async fn notify(&self, notifications: Vec<Notification>) {
        if notifications.is_empty() {
            return;
        }
        if let Err(e) = self.persist(&notifications).await {
            error!("❌ No se pudieron guardar {} notificaciones: {}", notifications.len(), e);
        }
    }
}

/// Solo registra en el log
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, notifications: Vec<Notification>) {
        for n in notifications {
            info!("🔔 [{:?}] {} → {}", n.level, n.user_id, n.text);
        }
    }
}

/// Contenido de una notificación antes de elegir destinatarios
#[derive(Debug, Clone)]
pub struct NotificationMessage {
    pub text: String,
    pub link: String,
    pub icon: &'static str,
    pub level: NotificationLevel,
}

impl NotificationMessage {
    pub fn new(text: impl Into<String>, link: impl Into<String>, icon: &'static str, level: NotificationLevel) -> Self {
        Self {
            text: text.into(),
            link: link.into(),
            icon,
            level,
        }
    }

    fn for_user(&self, user_id: Uuid) -> Notification {
        Notification::new(user_id, self.text.clone(), self.link.clone(), self.icon, self.level)
    }
}

#[derive(Clone)]
pub struct NotificationService {
    store: Arc<dyn FleetStore>,
    notifier: Arc<dyn Notifier>,
}

impl NotificationService {
    pub fn new(store: Arc<dyn FleetStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    pub async fn notify_user(&self, user_id: Uuid, message: &NotificationMessage) {
        self.notifier.notify(vec![message.for_user(user_id)]).await;
    }

    /// Notifica a todos los gestores de flota activos, excepto a `exclude`
    pub async fn notify_fleet_managers(&self, message: &NotificationMessage, exclude: Option<Uuid>) {
        let managers = match self.store.fleet_managers().await {
            Ok(managers) => managers,
            Err(e) => {
                error!("❌ No se pudo obtener la lista de gestores: {}", e);
                return;
            }
        };
        let notifications = managers
            .iter()
            .filter(|m| Some(m.id) != exclude)
            .map(|m| message.for_user(m.id))
            .collect();
        self.notifier.notify(notifications).await;
    }

    pub async fn list_for_user(&self, user: &User, unread_only: bool) -> AppResult<Vec<Notification>> {
        self.store.list_notifications(user.id, unread_only).await
    }

    /// `ids = None` marca todas las del usuario
    pub async fn mark_read(&self, user: &User, ids: Option<Vec<Uuid>>) -> AppResult<u64> {
        let mut tx = self.store.begin().await?;
        let marked = tx.mark_notifications_read(user.id, ids.as_deref()).await?;
        tx.commit().await?;
        Ok(marked)
    }
}
