use chrono::Utc;
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::dto::event_dto::{EventDetails, EventFilters, EventRegistered, RegisterEventRequest, UpdateEventRequest};
use crate::dto::{search_pattern, ApiResponse};
use crate::models::Event;
use crate::repositories::{DriverRepository, EventRepository, ManagerRepository, VehicleRepository};
use crate::services::event_gateway::{plan_event, plan_removal, validate_edit, validate_request, LedgerContext};
use crate::services::ledger_audit::{audit, LedgerAuditReport};
use crate::utils::errors::{not_found_error, AppResult};

pub struct EventController {
    pool: PgPool,
    repository: EventRepository,
    vehicles: VehicleRepository,
}

impl EventController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: EventRepository::new(pool.clone()),
            vehicles: VehicleRepository::new(pool.clone()),
            pool,
        }
    }

    /// Registrar una salida o llegada.
    ///
    /// Las filas del conductor y del vehículo se bloquean (siempre en ese
    /// orden) antes de leer el ledger, de modo que dos registros
    /// concurrentes sobre la misma entidad se serializan.
    pub async fn register(&self, request: RegisterEventRequest) -> AppResult<ApiResponse<EventRegistered>> {
        let draft = validate_request(&request, Utc::now())?;

        let mut tx = self.pool.begin().await?;
        let driver = DriverRepository::lock(&mut *tx, draft.driver_id).await?;
        let vehicle = VehicleRepository::lock(&mut *tx, draft.vehicle_id).await?;
        let manager_exists = ManagerRepository::exists(&mut *tx, draft.manager_id).await?;
        let events = EventRepository::find_for_parties(&mut *tx, draft.vehicle_id, draft.driver_id).await?;

        let plan = plan_event(
            draft,
            LedgerContext {
                driver: driver.as_ref(),
                vehicle: vehicle.as_ref(),
                manager_exists,
                events: &events,
            },
        )?;

        let event = EventRepository::insert(&mut *tx, &plan.event).await?;
        let vehicle =
            VehicleRepository::set_ledger_state(&mut *tx, event.vehicle_id, plan.vehicle_status, plan.vehicle_odometer)
                .await?;
        DriverRepository::set_last_event_at(&mut *tx, event.driver_id, Some(plan.driver_last_event_at)).await?;
        tx.commit().await?;

        info!(
            "📋 Evento {} registrado: vehículo {} conductor {} odómetro {}",
            event.event_type, vehicle.plate, event.driver_id, event.odometer
        );

        let message = format!("Evento '{}' registrado exitosamente", event.event_type);
        Ok(ApiResponse::success_with_message(EventRegistered { event, vehicle }, message))
    }

    pub async fn list(&self, filters: EventFilters) -> AppResult<Vec<EventDetails>> {
        let pattern = search_pattern(filters.search.as_deref());
        let events = self.repository.list(&filters, pattern.as_deref()).await?;
        debug!("📋 {} eventos listados", events.len());
        Ok(events)
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Event> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Evento", &id.to_string()))
    }

    /// Solo notas y teléfono
    pub async fn update(&self, id: Uuid, request: UpdateEventRequest) -> AppResult<ApiResponse<Event>> {
        let edit = validate_edit(&request)?;
        self.get_by_id(id).await?;

        let event = self.repository.update_details(id, &edit).await?;
        Ok(ApiResponse::success_with_message(event, "Evento actualizado exitosamente"))
    }

    /// Eliminar el último evento y recalcular el estado del vehículo
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        let target = EventRepository::find_in_tx(&mut *tx, id)
            .await?
            .ok_or_else(|| not_found_error("Evento", &id.to_string()))?;

        DriverRepository::lock(&mut *tx, target.driver_id).await?;
        let vehicle = VehicleRepository::lock(&mut *tx, target.vehicle_id)
            .await?
            .ok_or_else(|| not_found_error("Vehículo", &target.vehicle_id.to_string()))?;
        let events = EventRepository::find_for_parties(&mut *tx, target.vehicle_id, target.driver_id).await?;
        if !events.iter().any(|e| e.id == target.id) {
            return Err(not_found_error("Evento", &id.to_string()));
        }

        let plan = plan_removal(&target, &vehicle, &events)?;

        EventRepository::delete(&mut *tx, plan.event_id).await?;
        VehicleRepository::set_ledger_state(&mut *tx, plan.vehicle_id, plan.vehicle_status, plan.vehicle_odometer)
            .await?;
        DriverRepository::set_last_event_at(&mut *tx, plan.driver_id, plan.driver_last_event_at).await?;
        tx.commit().await?;

        info!("🗑️  Evento {} eliminado; vehículo {} queda {}", id, vehicle.plate, plan.vehicle_status.as_str());
        Ok(())
    }

    pub async fn audit(&self) -> AppResult<LedgerAuditReport> {
        let vehicles = self.vehicles.find_all().await?;
        let events = self.repository.find_all().await?;
        let report = audit(&vehicles, &events);

        if !report.is_consistent() {
            info!(
                "⚠️  Auditoría del ledger: {} violaciones, {} vehículos con estado inconsistente",
                report.violations.len(),
                report.status_mismatches.len()
            );
        }
        Ok(report)
    }
}
