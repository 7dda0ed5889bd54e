use bcrypt::{hash, DEFAULT_COST};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::dto::manager_dto::{CreateManagerRequest, UpdateManagerRequest};
use crate::dto::ApiResponse;
use crate::models::Manager;
use crate::repositories::{ManagerData, ManagerRepository};
use crate::utils::errors::{conflict_error, not_found_error, AppError, AppResult};

pub struct ManagerController {
    repository: ManagerRepository,
}

fn hash_password(password: &str) -> AppResult<String> {
    hash(password, DEFAULT_COST).map_err(|e| AppError::Hash(format!("Error hashing password: {}", e)))
}

fn normalize_phone(phone: Option<String>) -> Option<String> {
    phone.map(|p| p.trim().to_string()).filter(|p| !p.is_empty())
}

impl ManagerController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: ManagerRepository::new(pool),
        }
    }

    async fn find(&self, id: Uuid) -> AppResult<Manager> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Gestor", &id.to_string()))
    }

    pub async fn create(&self, request: CreateManagerRequest) -> AppResult<ApiResponse<Manager>> {
        request.validate()?;

        let email = request.email.trim().to_lowercase();
        if self.repository.email_exists(&email, None).await? {
            return Err(conflict_error("Gestor", "email", &email));
        }

        let manager = self
            .repository
            .create(&ManagerData {
                name: request.name.trim().to_string(),
                email,
                phone: normalize_phone(request.phone),
                password_hash: hash_password(&request.password)?,
            })
            .await?;

        info!("👤 Gestor creado: {} ({})", manager.email, manager.id);

        Ok(ApiResponse::success_with_message(manager, "Gestor creado exitosamente"))
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Manager> {
        self.find(id).await
    }

    pub async fn list(&self, pattern: Option<&str>) -> AppResult<Vec<Manager>> {
        self.repository.list(pattern).await
    }

    pub async fn update(&self, id: Uuid, request: UpdateManagerRequest) -> AppResult<ApiResponse<Manager>> {
        request.validate()?;
        let current = self.find(id).await?;

        let email = match request.email {
            Some(email) => {
                let email = email.trim().to_lowercase();
                if email != current.email && self.repository.email_exists(&email, Some(id)).await? {
                    return Err(conflict_error("Gestor", "email", &email));
                }
                email
            }
            None => current.email,
        };
        let password_hash = match request.password {
            Some(password) => hash_password(&password)?,
            None => current.password_hash,
        };

        let manager = self
            .repository
            .update(
                id,
                &ManagerData {
                    name: request.name.map(|n| n.trim().to_string()).unwrap_or(current.name),
                    email,
                    phone: match request.phone {
                        Some(phone) => normalize_phone(Some(phone)),
                        None => current.phone,
                    },
                    password_hash,
                },
            )
            .await?;

        Ok(ApiResponse::success_with_message(manager, "Gestor actualizado exitosamente"))
    }

    /// Un gestor con eventos registrados no se elimina (restricción FK)
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let manager = self.find(id).await?;
        self.repository.delete(id).await?;
        info!("🗑️  Gestor eliminado: {} ({})", manager.email, id);
        Ok(())
    }
}
