use bcrypt::verify;
use sqlx::PgPool;
use tracing::{info, warn};
use validator::Validate;

use crate::dto::auth_dto::{LoginRequest, LoginResponse};
use crate::repositories::ManagerRepository;
use crate::utils::errors::{AppError, AppResult};
use crate::utils::jwt::{generate_token, JwtConfig};

pub struct AuthController {
    repository: ManagerRepository,
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Credenciales inválidas".to_string())
}

impl AuthController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: ManagerRepository::new(pool),
        }
    }

    pub async fn login(&self, request: LoginRequest, jwt: &JwtConfig) -> AppResult<LoginResponse> {
        request.validate()?;

        let manager = match self.repository.find_by_email(request.email.trim()).await? {
            Some(manager) => manager,
            None => {
                warn!("🔐 Login fallido: email desconocido {}", request.email);
                return Err(invalid_credentials());
            }
        };

        let valid = verify(&request.password, &manager.password_hash)
            .map_err(|e| AppError::Hash(format!("Error verificando contraseña: {}", e)))?;
        if !valid {
            warn!("🔐 Login fallido: contraseña incorrecta para {}", manager.email);
            return Err(invalid_credentials());
        }

        let token = generate_token(manager.id, &manager.email, jwt)?;
        info!("🔓 Login de gestor {}", manager.email);

        Ok(LoginResponse::bearer(token, jwt.expiration, manager.id, manager.name))
    }
}
