use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::User;
use crate::services::Credentials;

/// Request de login (empleado de RRHH o cuenta local)
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 150))]
    pub username: String,

    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

impl From<LoginRequest> for Credentials {
    fn from(request: LoginRequest) -> Self {
        Credentials {
            username: request.username.trim().to_string(),
            password: request.password,
        }
    }
}

/// Response de login exitoso
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub user: User,
}
