//! Servicio de autenticación
//!
//! Los conductores se autentican contra el sistema de RRHH; el personal de
//! flota puede usar cuentas locales con hash bcrypt. `ChainAuthenticator`
//! prueba primero las cuentas locales y después RRHH.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{info, warn};

use super::user_service::UserService;
use crate::config::{EnvironmentConfig, LocalAccount};
use crate::models::{User, UserType};
use crate::utils::errors::{AppError, AppResult};
use crate::utils::jwt::{generate_token, JwtConfig};

/// Campos de los que al menos uno debe venir en una respuesta válida de RRHH
const EMPLOYEE_FIELDS: [&str; 5] = ["employee_id", "email", "id", "user_id", "username"];

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Authentication service unavailable: {0}")]
    Unavailable(String),
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials => AppError::Unauthorized(e.to_string()),
            AuthError::Unavailable(msg) => AppError::ServiceUnavailable(msg),
        }
    }
}

/// Empleado reconocido por el sistema de RRHH
#[derive(Debug, Clone, PartialEq)]
pub struct EmployeeIdentity {
    /// El identificador con el que inició sesión
    pub employee_id: String,
    pub email: Option<String>,
    /// RRHH devuelve el nombre del empleado en `username`
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentitySource {
    LocalAccount,
    HrSystem,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedIdentity {
    pub username: String,
    pub employee_id: Option<String>,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub user_type: UserType,
    pub source: IdentitySource,
}

impl From<EmployeeIdentity> for AuthenticatedIdentity {
    fn from(employee: EmployeeIdentity) -> Self {
        Self {
            username: employee.employee_id.clone(),
            employee_id: Some(employee.employee_id),
            email: employee.email,
            full_name: employee.display_name,
            user_type: UserType::Driver,
            source: IdentitySource::HrSystem,
        }
    }
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, credentials: &Credentials) -> Result<AuthenticatedIdentity, AuthError>;
}

/// Cliente del login de RRHH
#[derive(Clone)]
pub struct HrAuthClient {
    client: Client,
    url: String,
}

impl HrAuthClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, AuthError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthError::Unavailable(format!("HR client could not be built: {}", e)))?;
        Ok(Self { client, url: url.into() })
    }

    pub fn from_config(config: &EnvironmentConfig) -> Result<Self, AuthError> {
        Self::new(config.hr_auth_url.clone(), Duration::from_secs(config.hr_auth_timeout_secs))
    }

    pub async fn verify(&self, username: &str, password: &str) -> Result<EmployeeIdentity, AuthError> {
        let response = self
            .client
            .post(&self.url)
            .header(header::ACCEPT, "application/json")
            .json(&json!({ "email": username, "password": password }))
            .send()
            .await
            .map_err(|e| {
                log::error!("❌ Petición a RRHH fallida: {}", e);
                AuthError::Unavailable(e.to_string())
            })?;

        let status = response.status();
        if status.is_server_error() {
            return Err(AuthError::Unavailable(format!("HR system returned {}", status)));
        }
        if status != reqwest::StatusCode::OK {
            log::warn!("⚠️ RRHH rechazó a {} ({})", username, status);
            return Err(AuthError::InvalidCredentials);
        }

        let payload: Value = response.json().await.map_err(|_| AuthError::InvalidCredentials)?;
        parse_employee(username, &payload).ok_or(AuthError::InvalidCredentials)
    }
}

/// Interpreta la respuesta 200 de RRHH
pub fn parse_employee(login: &str, payload: &Value) -> Option<EmployeeIdentity> {
    let object = payload.as_object()?;
    let has_employee_data = EMPLOYEE_FIELDS.iter().any(|field| object.contains_key(*field));
    let is_error = payload.to_string().to_lowercase().contains("invalid username/password");
    if !has_employee_data || is_error {
        return None;
    }

    let text = |field: &str| {
        object
            .get(field)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    Some(EmployeeIdentity {
        employee_id: login.trim().to_string(),
        email: text("email"),
        display_name: text("username"),
    })
}

#[async_trait]
impl Authenticator for HrAuthClient {
    async fn authenticate(&self, credentials: &Credentials) -> Result<AuthenticatedIdentity, AuthError> {
        let employee = self.verify(&credentials.username, &credentials.password).await?;
        log::info!("✅ Empleado {} autenticado por RRHH", employee.employee_id);
        Ok(employee.into())
    }
}

/// Cuentas locales de personal (configuradas por entorno)
pub struct LocalAccountAuthenticator {
    accounts: Vec<LocalAccount>,
}

impl LocalAccountAuthenticator {
    pub fn new(accounts: Vec<LocalAccount>) -> Self {
        Self { accounts }
    }
}

#[async_trait]
impl Authenticator for LocalAccountAuthenticator {
    async fn authenticate(&self, credentials: &Credentials) -> Result<AuthenticatedIdentity, AuthError> {
        let account = self
            .accounts
            .iter()
            .find(|a| a.username == credentials.username.trim())
            .ok_or(AuthError::InvalidCredentials)?;

        match bcrypt::verify(&credentials.password, &account.password_hash) {
            Ok(true) => Ok(AuthenticatedIdentity {
                username: account.username.clone(),
                employee_id: None,
                email: None,
                full_name: None,
                user_type: account.user_type,
                source: IdentitySource::LocalAccount,
            }),
            Ok(false) => Err(AuthError::InvalidCredentials),
            Err(e) => {
                warn!("⚠️ Hash bcrypt inválido para la cuenta local {}: {}", account.username, e);
                Err(AuthError::InvalidCredentials)
            }
        }
    }
}

/// Prueba cada autenticador en orden; el primero que acepta gana
pub struct ChainAuthenticator {
    authenticators: Vec<Arc<dyn Authenticator>>,
}

impl ChainAuthenticator {
    pub fn new(authenticators: Vec<Arc<dyn Authenticator>>) -> Self {
        Self { authenticators }
    }

    /// Cuentas locales primero, RRHH después
    pub fn from_config(config: &EnvironmentConfig) -> Result<Self, AuthError> {
        Ok(Self::new(vec![
            Arc::new(LocalAccountAuthenticator::new(config.local_accounts.clone())),
            Arc::new(HrAuthClient::from_config(config)?),
        ]))
    }
}

#[async_trait]
impl Authenticator for ChainAuthenticator {
    async fn authenticate(&self, credentials: &Credentials) -> Result<AuthenticatedIdentity, AuthError> {
        let mut unavailable = None;
        for authenticator in &self.authenticators {
            match authenticator.authenticate(credentials).await {
                Ok(identity) => return Ok(identity),
                Err(AuthError::InvalidCredentials) => continue,
                Err(e @ AuthError::Unavailable(_)) => unavailable = Some(e),
            }
        }
        Err(unavailable.unwrap_or(AuthError::InvalidCredentials))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginOutcome {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
    pub user: User,
}

/// Login completo: autenticar, reconciliar usuario y emitir JWT
#[derive(Clone)]
pub struct AuthService {
    authenticator: Arc<dyn Authenticator>,
    users: UserService,
    jwt: JwtConfig,
}

impl AuthService {
    pub fn new(authenticator: Arc<dyn Authenticator>, users: UserService, jwt: JwtConfig) -> Self {
        Self {
            authenticator,
            users,
            jwt,
        }
    }

    pub async fn login(&self, credentials: &Credentials) -> AppResult<LoginOutcome> {
        if credentials.username.trim().is_empty() || credentials.password.is_empty() {
            return Err(AuthError::InvalidCredentials.into());
        }

        let identity = self.authenticator.authenticate(credentials).await?;
        let user = self.users.reconcile(&identity).await?;

        if !user.can_login() {
            warn!("🔒 Login bloqueado para {} ({:?})", user.username, user.approval_status);
            return Err(AppError::Forbidden(format!(
                "Account {} is not approved yet",
                user.username
            )));
        }

        let token = generate_token(user.id, user.user_type, &self.jwt)?;
        info!("🔑 Login correcto: {} ({})", user.username, user.user_type.as_str());
        Ok(LoginOutcome {
            token,
            token_type: "Bearer",
            expires_in: self.jwt.expiration,
            user,
        })
    }
}
