use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::dto::vehicle_dto::{CreateVehicleRequest, UpdateVehicleRequest, VehicleResponse};
use crate::dto::ApiResponse;
use crate::models::{Vehicle, VehicleStatus};
use crate::repositories::{EventRepository, VehicleData, VehicleRepository};
use crate::services::availability::{resolve, resolve_all, Availability, Party, PartyKind};
use crate::utils::errors::{conflict_error, field_error, not_found_error, AppError, AppResult};
use crate::utils::validation::{normalize_plate, validate_vehicle_year};

pub struct VehicleController {
    pool: PgPool,
    repository: VehicleRepository,
    events: EventRepository,
}

fn check_year(year: i32, today: NaiveDate) -> AppResult<()> {
    validate_vehicle_year(year, today)
        .map_err(|_| field_error("year", "El año debe estar entre 1900 y el año próximo"))
}

fn check_assignable(status: VehicleStatus) -> AppResult<()> {
    if !status.is_manually_assignable() {
        return Err(field_error(
            "status",
            "El estado 'in_use' solo se asigna al registrar una salida",
        ));
    }
    Ok(())
}

impl VehicleController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: VehicleRepository::new(pool.clone()),
            events: EventRepository::new(pool.clone()),
            pool,
        }
    }

    async fn find(&self, id: Uuid) -> AppResult<Vehicle> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Vehículo", &id.to_string()))
    }

    async fn availability(&self, id: Uuid) -> AppResult<Availability> {
        let events = self.events.find_for_vehicle(id).await?;
        Ok(resolve(&events, Party::Vehicle(id)))
    }

    pub async fn create(&self, request: CreateVehicleRequest) -> AppResult<ApiResponse<VehicleResponse>> {
        request.validate()?;
        check_year(request.year, Utc::now().date_naive())?;

        let status = request.status.unwrap_or(VehicleStatus::Available);
        check_assignable(status)?;

        let plate = normalize_plate(&request.plate);
        if self.repository.plate_exists(&plate, None).await? {
            return Err(conflict_error("Vehículo", "placa", &plate));
        }

        let vehicle = self
            .repository
            .create(&VehicleData {
                make: request.make.trim().to_string(),
                model: request.model.trim().to_string(),
                year: request.year,
                plate,
                odometer: request.odometer.unwrap_or(0),
                status,
                registration_expiry: request.registration_expiry,
                insurance_expiry: request.insurance_expiry,
            })
            .await?;

        info!("🚗 Vehículo creado: {} ({})", vehicle.plate, vehicle.id);

        Ok(ApiResponse::success_with_message(
            VehicleResponse::new(vehicle, &Availability::Available),
            "Vehículo creado exitosamente",
        ))
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<VehicleResponse> {
        let vehicle = self.find(id).await?;
        let availability = self.availability(id).await?;
        Ok(VehicleResponse::new(vehicle, &availability))
    }

    pub async fn list(&self, pattern: Option<&str>) -> AppResult<Vec<VehicleResponse>> {
        let vehicles = self.repository.list(pattern).await?;
        let events = self.events.find_all().await?;
        let index = resolve_all(&events, PartyKind::Vehicle);

        Ok(vehicles
            .into_iter()
            .map(|v| {
                let availability = index.get(v.id);
                VehicleResponse::new(v, &availability)
            })
            .collect())
    }

    /// La fila se bloquea antes de leer el ledger, como en el registro de
    /// eventos, para que una llegada concurrente no quede pisada.
    pub async fn update(&self, id: Uuid, request: UpdateVehicleRequest) -> AppResult<ApiResponse<VehicleResponse>> {
        request.validate()?;
        if let Some(year) = request.year {
            check_year(year, Utc::now().date_naive())?;
        }

        let mut tx = self.pool.begin().await?;
        let current = VehicleRepository::lock(&mut *tx, id)
            .await?
            .ok_or_else(|| not_found_error("Vehículo", &id.to_string()))?;
        let events = EventRepository::find_for_vehicle_in_tx(&mut *tx, id).await?;
        let availability = resolve(&events, Party::Vehicle(id));
        let mut data = VehicleData::from(&current);

        if let Some(make) = request.make {
            data.make = make.trim().to_string();
        }
        if let Some(model) = request.model {
            data.model = model.trim().to_string();
        }
        if let Some(year) = request.year {
            data.year = year;
        }
        if let Some(plate) = request.plate {
            let plate = normalize_plate(&plate);
            if plate != current.plate && self.repository.plate_exists(&plate, Some(id)).await? {
                return Err(conflict_error("Vehículo", "placa", &plate));
            }
            data.plate = plate;
        }
        if let Some(status) = request.status.filter(|s| *s != current.status) {
            check_assignable(status)?;
            if availability.is_in_use() {
                return Err(AppError::Conflict(
                    "El vehículo está en uso; registre la llegada antes de cambiar su estado".to_string(),
                ));
            }
            data.status = status;
        }
        if let Some(odometer) = request.odometer.filter(|o| *o != current.odometer) {
            if availability.is_in_use() {
                return Err(AppError::Conflict(
                    "El odómetro de un vehículo en uso se actualiza al registrar la llegada".to_string(),
                ));
            }
            data.odometer = odometer;
        }
        if request.registration_expiry.is_some() {
            data.registration_expiry = request.registration_expiry;
        }
        if request.insurance_expiry.is_some() {
            data.insurance_expiry = request.insurance_expiry;
        }

        let vehicle = VehicleRepository::update(&mut *tx, id, &data).await?;
        tx.commit().await?;

        Ok(ApiResponse::success_with_message(
            VehicleResponse::new(vehicle, &availability),
            "Vehículo actualizado exitosamente",
        ))
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        let vehicle = VehicleRepository::lock(&mut *tx, id)
            .await?
            .ok_or_else(|| not_found_error("Vehículo", &id.to_string()))?;
        let events = EventRepository::find_for_vehicle_in_tx(&mut *tx, id).await?;
        if resolve(&events, Party::Vehicle(id)).is_in_use() {
            return Err(AppError::Conflict(format!(
                "El vehículo {} está en uso y no se puede eliminar",
                vehicle.plate
            )));
        }

        VehicleRepository::delete(&mut *tx, id).await?;
        tx.commit().await?;
        info!("🗑️  Vehículo eliminado: {} ({})", vehicle.plate, id);
        Ok(())
    }
}
