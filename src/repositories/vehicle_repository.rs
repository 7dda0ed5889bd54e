use chrono::{NaiveDate, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::{Vehicle, VehicleStatus};
use crate::utils::errors::AppResult;

/// Campos editables de un vehículo, ya validados y normalizados
#[derive(Debug, Clone)]
pub struct VehicleData {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub plate: String,
    pub odometer: i64,
    pub status: VehicleStatus,
    pub registration_expiry: Option<NaiveDate>,
    pub insurance_expiry: Option<NaiveDate>,
}

impl From<&Vehicle> for VehicleData {
    fn from(vehicle: &Vehicle) -> Self {
        Self {
            make: vehicle.make.clone(),
            model: vehicle.model.clone(),
            year: vehicle.year,
            plate: vehicle.plate.clone(),
            odometer: vehicle.odometer,
            status: vehicle.status,
            registration_expiry: vehicle.registration_expiry,
            insurance_expiry: vehicle.insurance_expiry,
        }
    }
}

pub struct VehicleRepository {
    pool: PgPool,
}

impl VehicleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, data: &VehicleData) -> AppResult<Vehicle> {
        let now = Utc::now();
        let vehicle = sqlx::query_as::<_, Vehicle>(
            r#"
            INSERT INTO vehicles (id, make, model, year, plate, odometer, status,
                                  registration_expiry, insurance_expiry, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&data.make)
        .bind(&data.model)
        .bind(data.year)
        .bind(&data.plate)
        .bind(data.odometer)
        .bind(data.status)
        .bind(data.registration_expiry)
        .bind(data.insurance_expiry)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(vehicle)
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Vehicle>> {
        let vehicle = sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(vehicle)
    }

    /// Listado por placa, marca o modelo
    pub async fn list(&self, pattern: Option<&str>) -> AppResult<Vec<Vehicle>> {
        let vehicles = sqlx::query_as::<_, Vehicle>(
            r#"
            SELECT * FROM vehicles
            WHERE $1::text IS NULL
               OR plate ILIKE $1 OR make ILIKE $1 OR model ILIKE $1
            ORDER BY plate
            "#,
        )
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(vehicles)
    }

    pub async fn find_all(&self) -> AppResult<Vec<Vehicle>> {
        self.list(None).await
    }

    /// La placa ya está registrada por otro vehículo
    pub async fn plate_exists(&self, plate: &str, except: Option<Uuid>) -> AppResult<bool> {
        let result: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM vehicles WHERE plate = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(plate)
        .bind(except)
        .fetch_one(&self.pool)
        .await?;

        Ok(result.0)
    }

    /// Reescribe la fila bloqueada con `lock` en la misma transacción
    pub async fn update(conn: &mut PgConnection, id: Uuid, data: &VehicleData) -> AppResult<Vehicle> {
        let vehicle = sqlx::query_as::<_, Vehicle>(
            r#"
            UPDATE vehicles
            SET make = $2, model = $3, year = $4, plate = $5, odometer = $6, status = $7,
                registration_expiry = $8, insurance_expiry = $9, updated_at = $10
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&data.make)
        .bind(&data.model)
        .bind(data.year)
        .bind(&data.plate)
        .bind(data.odometer)
        .bind(data.status)
        .bind(data.registration_expiry)
        .bind(data.insurance_expiry)
        .bind(Utc::now())
        .fetch_one(conn)
        .await?;

        Ok(vehicle)
    }

    pub async fn delete(conn: &mut PgConnection, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM vehicles WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;

        Ok(())
    }

    /// Leer el vehículo bloqueando su fila hasta el fin de la transacción
    pub async fn lock(conn: &mut PgConnection, id: Uuid) -> AppResult<Option<Vehicle>> {
        let vehicle = sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(conn)
            .await?;

        Ok(vehicle)
    }

    /// Estado y odómetro derivados del ledger
    pub async fn set_ledger_state(
        conn: &mut PgConnection,
        id: Uuid,
        status: VehicleStatus,
        odometer: i64,
    ) -> AppResult<Vehicle> {
        let vehicle = sqlx::query_as::<_, Vehicle>(
            "UPDATE vehicles SET status = $2, odometer = $3, updated_at = $4 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .bind(odometer)
        .bind(Utc::now())
        .fetch_one(conn)
        .await?;

        Ok(vehicle)
    }
}
