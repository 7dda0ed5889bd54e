use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
    pub manager_id: Uuid,
    pub manager_name: String,
}

impl LoginResponse {
    pub fn bearer(token: String, expires_in: u64, manager_id: Uuid, manager_name: String) -> Self {
        Self {
            success: true,
            token,
            token_type: "Bearer",
            expires_in,
            manager_id,
            manager_name,
        }
    }
}
