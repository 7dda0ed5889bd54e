use chrono::Utc;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::Manager;
use crate::utils::errors::AppResult;

/// Campos persistidos de un gestor; la contraseña ya viene hasheada
#[derive(Debug, Clone)]
pub struct ManagerData {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
}

pub struct ManagerRepository {
    pool: PgPool,
}

impl ManagerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, data: &ManagerData) -> AppResult<Manager> {
        let now = Utc::now();
        let manager = sqlx::query_as::<_, Manager>(
            r#"
            INSERT INTO managers (id, name, email, phone, password_hash, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&data.name)
        .bind(&data.email)
        .bind(&data.phone)
        .bind(&data.password_hash)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(manager)
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Manager>> {
        let manager = sqlx::query_as::<_, Manager>("SELECT * FROM managers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(manager)
    }

    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<Manager>> {
        let manager = sqlx::query_as::<_, Manager>("SELECT * FROM managers WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(manager)
    }

    pub async fn list(&self, pattern: Option<&str>) -> AppResult<Vec<Manager>> {
        let managers = sqlx::query_as::<_, Manager>(
            r#"
            SELECT * FROM managers
            WHERE $1::text IS NULL OR name ILIKE $1 OR email ILIKE $1
            ORDER BY name
            "#,
        )
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(managers)
    }

    pub async fn email_exists(&self, email: &str, except: Option<Uuid>) -> AppResult<bool> {
        let result: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM managers WHERE LOWER(email) = LOWER($1) AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(email)
        .bind(except)
        .fetch_one(&self.pool)
        .await?;

        Ok(result.0)
    }

    pub async fn update(&self, id: Uuid, data: &ManagerData) -> AppResult<Manager> {
        let manager = sqlx::query_as::<_, Manager>(
            r#"
            UPDATE managers
            SET name = $2, email = $3, phone = $4, password_hash = $5, updated_at = $6
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&data.name)
        .bind(&data.email)
        .bind(&data.phone)
        .bind(&data.password_hash)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(manager)
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM managers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Comprobación dentro de la transacción del gateway
    pub async fn exists(conn: &mut PgConnection, id: Uuid) -> AppResult<bool> {
        let result: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM managers WHERE id = $1)")
            .bind(id)
            .fetch_one(conn)
            .await?;

        Ok(result.0)
    }
}
