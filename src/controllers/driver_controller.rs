use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::dto::driver_dto::{CreateDriverRequest, DriverResponse, UpdateDriverRequest};
use crate::dto::ApiResponse;
use crate::models::{Driver, DriverStatus};
use crate::repositories::{DriverData, DriverRepository, EventRepository};
use crate::services::availability::{resolve, resolve_all, Availability, Party, PartyKind};
use crate::utils::errors::{conflict_error, field_error, not_found_error, AppError, AppResult};
use crate::utils::validation::validate_not_expired;

pub struct DriverController {
    pool: PgPool,
    repository: DriverRepository,
    events: EventRepository,
}

fn check_license_expiry(expiry: NaiveDate, today: NaiveDate) -> AppResult<()> {
    validate_not_expired(expiry, today)
        .map_err(|_| field_error("license_expiry", format!("La CNH venció el {}", expiry)))
}

impl DriverController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: DriverRepository::new(pool.clone()),
            events: EventRepository::new(pool.clone()),
            pool,
        }
    }

    async fn find(&self, id: Uuid) -> AppResult<Driver> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Conductor", &id.to_string()))
    }

    async fn availability(&self, id: Uuid) -> AppResult<Availability> {
        let events = self.events.find_for_driver(id).await?;
        Ok(resolve(&events, Party::Driver(id)))
    }

    pub async fn create(&self, request: CreateDriverRequest) -> AppResult<ApiResponse<DriverResponse>> {
        request.validate()?;
        check_license_expiry(request.license_expiry, Utc::now().date_naive())?;

        let license_number = request.license_number.trim().to_string();
        if self.repository.license_number_exists(&license_number, None).await? {
            return Err(conflict_error("Conductor", "CNH", &license_number));
        }

        let driver = self
            .repository
            .create(&DriverData {
                name: request.name.trim().to_string(),
                phone: request.phone.trim().to_string(),
                license_number,
                license_expiry: request.license_expiry,
                category: request.category.trim().to_uppercase(),
                status: request.status.unwrap_or(DriverStatus::Active),
            })
            .await?;

        info!("🧑‍✈️ Conductor registrado: {} ({})", driver.name, driver.id);

        Ok(ApiResponse::success_with_message(
            DriverResponse::new(driver, &Availability::Available),
            "Conductor registrado exitosamente",
        ))
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<DriverResponse> {
        let driver = self.find(id).await?;
        let availability = self.availability(id).await?;
        Ok(DriverResponse::new(driver, &availability))
    }

    pub async fn list(&self, pattern: Option<&str>) -> AppResult<Vec<DriverResponse>> {
        let drivers = self.repository.list(pattern).await?;
        let events = self.events.find_all().await?;
        let index = resolve_all(&events, PartyKind::Driver);

        Ok(drivers
            .into_iter()
            .map(|d| {
                let availability = index.get(d.id);
                DriverResponse::new(d, &availability)
            })
            .collect())
    }

    /// Misma disciplina de bloqueo que el registro de eventos: la fila del
    /// conductor se bloquea antes de leer su ledger.
    pub async fn update(&self, id: Uuid, request: UpdateDriverRequest) -> AppResult<ApiResponse<DriverResponse>> {
        request.validate()?;

        let mut tx = self.pool.begin().await?;
        let current = DriverRepository::lock(&mut *tx, id)
            .await?
            .ok_or_else(|| not_found_error("Conductor", &id.to_string()))?;
        let mut data = DriverData::from(&current);

        if let Some(name) = request.name {
            data.name = name.trim().to_string();
        }
        if let Some(phone) = request.phone {
            data.phone = phone.trim().to_string();
        }
        if let Some(license_number) = request.license_number {
            let license_number = license_number.trim().to_string();
            if license_number != current.license_number
                && self.repository.license_number_exists(&license_number, Some(id)).await?
            {
                return Err(conflict_error("Conductor", "CNH", &license_number));
            }
            data.license_number = license_number;
        }
        if let Some(expiry) = request.license_expiry.filter(|e| *e != current.license_expiry) {
            check_license_expiry(expiry, Utc::now().date_naive())?;
            data.license_expiry = expiry;
        }
        if let Some(category) = request.category {
            data.category = category.trim().to_uppercase();
        }
        if let Some(status) = request.status {
            data.status = status;
        }

        let driver = DriverRepository::update(&mut *tx, id, &data).await?;
        let events = EventRepository::find_for_driver_in_tx(&mut *tx, id).await?;
        tx.commit().await?;

        Ok(ApiResponse::success_with_message(
            DriverResponse::new(driver, &resolve(&events, Party::Driver(id))),
            "Conductor actualizado exitosamente",
        ))
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        let driver = DriverRepository::lock(&mut *tx, id)
            .await?
            .ok_or_else(|| not_found_error("Conductor", &id.to_string()))?;
        let events = EventRepository::find_for_driver_in_tx(&mut *tx, id).await?;
        if resolve(&events, Party::Driver(id)).is_in_use() {
            return Err(AppError::Conflict(format!(
                "El conductor {} está en viaje y no se puede eliminar",
                driver.name
            )));
        }

        DriverRepository::delete(&mut *tx, id).await?;
        tx.commit().await?;
        info!("🗑️  Conductor eliminado: {} ({})", driver.name, id);
        Ok(())
    }
}
