use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::{Driver, DriverStatus};
use crate::utils::errors::AppResult;

/// Campos editables de un conductor, ya validados
#[derive(Debug, Clone)]
pub struct DriverData {
    pub name: String,
    pub phone: String,
    pub license_number: String,
    pub license_expiry: NaiveDate,
    pub category: String,
    pub status: DriverStatus,
}

impl From<&Driver> for DriverData {
    fn from(driver: &Driver) -> Self {
        Self {
            name: driver.name.clone(),
            phone: driver.phone.clone(),
            license_number: driver.license_number.clone(),
            license_expiry: driver.license_expiry,
            category: driver.category.clone(),
            status: driver.status,
        }
    }
}

pub struct DriverRepository {
    pool: PgPool,
}

impl DriverRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, data: &DriverData) -> AppResult<Driver> {
        let now = Utc::now();
        let driver = sqlx::query_as::<_, Driver>(
            r#"
            INSERT INTO drivers (id, name, phone, license_number, license_expiry, category, status,
                                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&data.name)
        .bind(&data.phone)
        .bind(&data.license_number)
        .bind(data.license_expiry)
        .bind(&data.category)
        .bind(data.status)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(driver)
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Driver>> {
        let driver = sqlx::query_as::<_, Driver>("SELECT * FROM drivers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(driver)
    }

    /// Listado por nombre, teléfono o número de CNH
    pub async fn list(&self, pattern: Option<&str>) -> AppResult<Vec<Driver>> {
        let drivers = sqlx::query_as::<_, Driver>(
            r#"
            SELECT * FROM drivers
            WHERE $1::text IS NULL
               OR name ILIKE $1 OR phone ILIKE $1 OR license_number ILIKE $1
            ORDER BY name
            "#,
        )
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(drivers)
    }

    pub async fn find_all(&self) -> AppResult<Vec<Driver>> {
        self.list(None).await
    }

    pub async fn license_number_exists(&self, license_number: &str, except: Option<Uuid>) -> AppResult<bool> {
        let result: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM drivers WHERE license_number = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(license_number)
        .bind(except)
        .fetch_one(&self.pool)
        .await?;

        Ok(result.0)
    }

    /// Reescribe la fila bloqueada con `lock` en la misma transacción
    pub async fn update(conn: &mut PgConnection, id: Uuid, data: &DriverData) -> AppResult<Driver> {
        let driver = sqlx::query_as::<_, Driver>(
            r#"
            UPDATE drivers
            SET name = $2, phone = $3, license_number = $4, license_expiry = $5,
                category = $6, status = $7, updated_at = $8
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&data.name)
        .bind(&data.phone)
        .bind(&data.license_number)
        .bind(data.license_expiry)
        .bind(&data.category)
        .bind(data.status)
        .bind(Utc::now())
        .fetch_one(conn)
        .await?;

        Ok(driver)
    }

    pub async fn delete(conn: &mut PgConnection, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM drivers WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;

        Ok(())
    }

    /// Leer el conductor bloqueando su fila hasta el fin de la transacción
    pub async fn lock(conn: &mut PgConnection, id: Uuid) -> AppResult<Option<Driver>> {
        let driver = sqlx::query_as::<_, Driver>("SELECT * FROM drivers WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(conn)
            .await?;

        Ok(driver)
    }

    pub async fn set_last_event_at(
        conn: &mut PgConnection,
        id: Uuid,
        last_event_at: Option<DateTime<Utc>>,
    ) -> AppResult<()> {
        sqlx::query("UPDATE drivers SET last_event_at = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(last_event_at)
            .bind(Utc::now())
            .execute(conn)
            .await?;

        Ok(())
    }
}
