use chrono::Utc;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::dto::event_dto::{EventDetails, EventFilters};
use crate::models::{Event, NewEvent};
use crate::services::event_gateway::EventEdit;
use crate::utils::errors::AppResult;

const DEFAULT_LIMIT: i64 = 200;
const MAX_LIMIT: i64 = 1000;

pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Listado con nombres de conductor, vehículo y gestor, más reciente primero
    pub async fn list(&self, filters: &EventFilters, pattern: Option<&str>) -> AppResult<Vec<EventDetails>> {
        let limit = filters.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let offset = filters.offset.unwrap_or(0).max(0);

        let events = sqlx::query_as::<_, EventDetails>(
            r#"
            SELECT e.*, d.name AS driver_name, v.plate AS vehicle_plate, m.name AS manager_name
            FROM events e
            JOIN drivers d ON d.id = e.driver_id
            JOIN vehicles v ON v.id = e.vehicle_id
            JOIN managers m ON m.id = e.manager_id
            WHERE ($1::uuid IS NULL OR e.vehicle_id = $1)
              AND ($2::uuid IS NULL OR e.driver_id = $2)
              AND ($3::event_type IS NULL OR e.event_type = $3)
              AND ($4::text IS NULL
                   OR d.name ILIKE $4 OR v.plate ILIKE $4 OR m.name ILIKE $4
                   OR e.phone ILIKE $4 OR e.notes ILIKE $4)
            ORDER BY e.occurred_at DESC, e.created_at DESC
            LIMIT $5 OFFSET $6
            "#,
        )
        .bind(filters.vehicle_id)
        .bind(filters.driver_id)
        .bind(filters.event_type)
        .bind(pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Event>> {
        let event = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(event)
    }

    /// Ledger completo en orden cronológico
    pub async fn find_all(&self) -> AppResult<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>("SELECT * FROM events ORDER BY occurred_at, created_at")
            .fetch_all(&self.pool)
            .await?;

        Ok(events)
    }

    pub async fn find_for_vehicle(&self, vehicle_id: Uuid) -> AppResult<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(
            "SELECT * FROM events WHERE vehicle_id = $1 ORDER BY occurred_at, created_at",
        )
        .bind(vehicle_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    pub async fn find_for_driver(&self, driver_id: Uuid) -> AppResult<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(
            "SELECT * FROM events WHERE driver_id = $1 ORDER BY occurred_at, created_at",
        )
        .bind(driver_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    pub async fn update_details(&self, id: Uuid, edit: &EventEdit) -> AppResult<Event> {
        let event = sqlx::query_as::<_, Event>(
            r#"
            UPDATE events
            SET phone = COALESCE($2, phone), notes = COALESCE($3, notes)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&edit.phone)
        .bind(&edit.notes)
        .fetch_one(&self.pool)
        .await?;

        Ok(event)
    }

    /// Eventos del vehículo o del conductor, leídos con sus filas ya bloqueadas
    pub async fn find_for_parties(
        conn: &mut PgConnection,
        vehicle_id: Uuid,
        driver_id: Uuid,
    ) -> AppResult<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(
            r#"
            SELECT * FROM events
            WHERE vehicle_id = $1 OR driver_id = $2
            ORDER BY occurred_at, created_at
            "#,
        )
        .bind(vehicle_id)
        .bind(driver_id)
        .fetch_all(conn)
        .await?;

        Ok(events)
    }

    /// Ledger de un vehículo dentro de una transacción que ya bloqueó su fila
    pub async fn find_for_vehicle_in_tx(conn: &mut PgConnection, vehicle_id: Uuid) -> AppResult<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(
            "SELECT * FROM events WHERE vehicle_id = $1 ORDER BY occurred_at, created_at",
        )
        .bind(vehicle_id)
        .fetch_all(conn)
        .await?;

        Ok(events)
    }

    pub async fn find_for_driver_in_tx(conn: &mut PgConnection, driver_id: Uuid) -> AppResult<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(
            "SELECT * FROM events WHERE driver_id = $1 ORDER BY occurred_at, created_at",
        )
        .bind(driver_id)
        .fetch_all(conn)
        .await?;

        Ok(events)
    }

    pub async fn find_in_tx(conn: &mut PgConnection, id: Uuid) -> AppResult<Option<Event>> {
        let event = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
            .bind(id)
            .fetch_optional(conn)
            .await?;

        Ok(event)
    }

    pub async fn insert(conn: &mut PgConnection, event: &NewEvent) -> AppResult<Event> {
        let inserted = sqlx::query_as::<_, Event>(
            r#"
            INSERT INTO events (id, event_type, driver_id, vehicle_id, manager_id, odometer,
                                phone, occurred_at, notes, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(event.id)
        .bind(event.event_type)
        .bind(event.driver_id)
        .bind(event.vehicle_id)
        .bind(event.manager_id)
        .bind(event.odometer)
        .bind(&event.phone)
        .bind(event.occurred_at)
        .bind(&event.notes)
        .bind(Utc::now())
        .fetch_one(conn)
        .await?;

        Ok(inserted)
    }

    pub async fn delete(conn: &mut PgConnection, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;

        Ok(())
    }
}
