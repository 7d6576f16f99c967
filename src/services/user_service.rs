//! Servicio de usuarios
//!
//! Reconciliación de identidades autenticadas con usuarios locales y flujo
//! de aprobación de conductores.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use super::auth_service::{AuthenticatedIdentity, IdentitySource};
use super::notification_service::{NotificationMessage, NotificationService};
use crate::models::{ApprovalStatus, NotificationLevel, User, UserFilters, UserType};
use crate::repositories::FleetStore;
use crate::utils::errors::{forbidden_error, not_found_error, AppError, AppResult};

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn FleetStore>,
    notifications: NotificationService,
}

impl UserService {
    pub fn new(store: Arc<dyn FleetStore>, notifications: NotificationService) -> Self {
        Self { store, notifications }
    }

    /// Busca o crea el usuario local de una identidad autenticada.
    ///
    /// Los empleados de RRHH nuevos se crean como `driver` pendientes de
    /// aprobación; las cuentas locales de personal entran aprobadas.
    pub async fn reconcile(&self, identity: &AuthenticatedIdentity) -> AppResult<User> {
        let now = Utc::now();
        let mut tx = self.store.begin().await?;
        let existing = tx.lock_user_by_username(&identity.username).await?;

        let (user, created) = match existing {
            Some(mut user) => {
                if identity.email.is_some() {
                    user.email = identity.email.clone();
                }
                if identity.full_name.is_some() {
                    user.full_name = identity.full_name.clone();
                }
                match identity.source {
                    IdentitySource::HrSystem => user.hr_authenticated_at = Some(now),
                    // El rol de las cuentas locales lo define la configuración
                    IdentitySource::LocalAccount => user.user_type = identity.user_type,
                }
                tx.update_user(&user).await?;
                (user, false)
            }
            None => {
                let staff = identity.source == IdentitySource::LocalAccount;
                let user = User {
                    id: Uuid::new_v4(),
                    username: identity.username.clone(),
                    employee_id: identity.employee_id.clone(),
                    email: identity.email.clone(),
                    full_name: identity.full_name.clone(),
                    user_type: identity.user_type,
                    approval_status: if staff {
                        ApprovalStatus::Approved
                    } else {
                        ApprovalStatus::Pending
                    },
                    is_active: true,
                    hr_authenticated_at: (!staff).then_some(now),
                    approved_by: None,
                    approved_at: staff.then_some(now),
                    created_at: now,
                };
                tx.insert_user(&user).await?;
                (user, true)
            }
        };
        tx.commit().await?;

        if created {
            info!("👤 Usuario creado: {} ({}, {:?})", user.username, user.user_type.as_str(), user.approval_status);
            if user.approval_status == ApprovalStatus::Pending {
                self.notifications
                    .notify_fleet_managers(
                        &NotificationMessage::new(
                            format!("New driver {} is waiting for approval", user.display_name()),
                            format!("/users/{}", user.id),
                            "user-clock",
                            NotificationLevel::Info,
                        ),
                        None,
                    )
                    .await;
            }
        }
        Ok(user)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<User> {
        self.store.find_user(id).await?.ok_or_else(|| not_found_error("User", id))
    }

    pub async fn list(&self, actor: &User, filters: &UserFilters) -> AppResult<Vec<User>> {
        if !actor.user_type.is_fleet_manager() {
            return Err(forbidden_error("list users", "fleet manager role required"));
        }
        self.store.list_users(filters).await
    }

    pub async fn approve(&self, actor: &User, user_id: Uuid) -> AppResult<User> {
        self.set_approval(actor, user_id, ApprovalStatus::Approved).await
    }

    pub async fn reject(&self, actor: &User, user_id: Uuid) -> AppResult<User> {
        self.set_approval(actor, user_id, ApprovalStatus::Rejected).await
    }

    async fn set_approval(&self, actor: &User, user_id: Uuid, status: ApprovalStatus) -> AppResult<User> {
        if !actor.user_type.can_approve_drivers() {
            return Err(forbidden_error("change driver approval", "admin or manager role required"));
        }

        let mut tx = self.store.begin().await?;
        let mut user = tx.lock_user(user_id).await?.ok_or_else(|| not_found_error("User", user_id))?;
        if user.user_type != UserType::Driver {
            return Err(AppError::BadRequest(format!("User {} is not a driver", user.username)));
        }
        if user.approval_status == status {
            return Err(AppError::Conflict(format!(
                "User {} is already {:?}",
                user.username, status
            )));
        }

        let now = Utc::now();
        user.approval_status = status;
        user.approved_by = Some(actor.id);
        user.approved_at = Some(now);
        tx.update_user(&user).await?;
        tx.commit().await?;

        info!("✅ {} cambió la aprobación de {} a {:?}", actor.username, user.username, status);
        let (text, level) = match status {
            ApprovalStatus::Approved => ("Your account has been approved. You can now use the fleet system.", NotificationLevel::Success),
            _ => ("Your account request was rejected. Contact your fleet manager.", NotificationLevel::Danger),
        };
        self.notifications
            .notify_user(user.id, &NotificationMessage::new(text, "/", "user-check", level))
            .await;
        Ok(user)
    }
}
