//! Gateway de mutaciones del ledger
//!
//! Valida el registro de una salida o llegada y calcula sus efectos sobre el
//! registro de flota. Todo aquí es puro: el controlador carga el contexto
//! dentro de una transacción con bloqueo de filas, llama a `plan_event` y
//! solo escribe si el plan es válido. Un error en cualquier paso implica
//! que no hubo escrituras.

use chrono::{DateTime, SubsecRound, Utc};
use uuid::Uuid;

use crate::{
    dto::event_dto::{RegisterEventRequest, UpdateEventRequest},
    models::{Driver, Event, EventType, NewEvent, Vehicle, VehicleStatus},
    services::availability::{latest_event_at, resolve, Availability, Party},
    utils::{
        errors::{field_error, required_field, AppError, AppResult},
        validation::{
            validate_contact_phone, validate_datetime, validate_positive, validate_uuid,
            MAX_PHONE_LENGTH, MIN_PHONE_DIGITS,
        },
    },
};

/// Solicitud ya validada sintácticamente (pasos 1 a 3)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDraft {
    pub event_type: EventType,
    pub driver_id: Uuid,
    pub vehicle_id: Uuid,
    pub manager_id: Uuid,
    pub phone: String,
    pub odometer: Option<i64>,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Estado cargado (y bloqueado) para decidir sobre un borrador
pub struct LedgerContext<'a> {
    pub driver: Option<&'a Driver>,
    pub vehicle: Option<&'a Vehicle>,
    pub manager_exists: bool,
    /// Eventos del vehículo y del conductor implicados
    pub events: &'a [Event],
}

/// Efectos a aplicar en una única transacción
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventPlan {
    pub event: NewEvent,
    pub vehicle_status: VehicleStatus,
    pub vehicle_odometer: i64,
    pub driver_last_event_at: DateTime<Utc>,
}

/// Efectos de eliminar el último evento de un vehículo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalPlan {
    pub event_id: Uuid,
    pub vehicle_id: Uuid,
    pub vehicle_status: VehicleStatus,
    pub vehicle_odometer: i64,
    pub driver_id: Uuid,
    pub driver_last_event_at: Option<DateTime<Utc>>,
}

/// Cambios permitidos sobre un evento existente
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventEdit {
    pub phone: Option<String>,
    pub notes: Option<String>,
}

fn required<'a>(value: &'a Option<String>, field: &'static str) -> AppResult<&'a str> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(required_field(field)),
    }
}

fn parse_id(value: &str, field: &'static str) -> AppResult<Uuid> {
    validate_uuid(value).map_err(|_| field_error(field, format!("'{}' no es un identificador válido", value)))
}

fn phone_error() -> AppError {
    field_error(
        "phone",
        format!(
            "El teléfono debe tener al menos {} dígitos y como máximo {} caracteres",
            MIN_PHONE_DIGITS, MAX_PHONE_LENGTH
        ),
    )
}

/// Pasos 1 a 3: campos requeridos, tipo y teléfono
pub fn validate_request(request: &RegisterEventRequest, now: DateTime<Utc>) -> AppResult<EventDraft> {
    let driver_id = required(&request.driver_id, "driver_id")?;
    let vehicle_id = required(&request.vehicle_id, "vehicle_id")?;
    let manager_id = required(&request.manager_id, "manager_id")?;
    let event_type = required(&request.event_type, "type")?;
    let phone = required(&request.phone, "phone")?;

    let driver_id = parse_id(driver_id, "driver_id")?;
    let vehicle_id = parse_id(vehicle_id, "vehicle_id")?;
    let manager_id = parse_id(manager_id, "manager_id")?;

    let event_type: EventType = event_type
        .parse()
        .map_err(|_| field_error("type", "El tipo debe ser 'checkout' (saída) o 'check_in' (chegada)"))?;

    validate_contact_phone(phone).map_err(|_| phone_error())?;

    let occurred_at = match request.timestamp.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => validate_datetime(raw)
            .map_err(|_| field_error("timestamp", "La fecha debe estar en formato RFC 3339"))?,
        _ => now,
    };
    // TIMESTAMPTZ guarda microsegundos; el orden del ledger se decide con
    // el mismo instante que se persiste
    let occurred_at = occurred_at.trunc_subsecs(6);

    Ok(EventDraft {
        event_type,
        driver_id,
        vehicle_id,
        manager_id,
        phone: phone.to_string(),
        odometer: request.odometer,
        notes: request
            .notes
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string),
        occurred_at,
    })
}

/// Pasos 4 a 7: existencia, reglas por tipo y efectos
pub fn plan_event(draft: EventDraft, ctx: LedgerContext<'_>) -> AppResult<EventPlan> {
    let driver = ctx
        .driver
        .filter(|d| d.id == draft.driver_id)
        .ok_or_else(|| AppError::NotFound("Conductor no encontrado".to_string()))?;
    let vehicle = ctx
        .vehicle
        .filter(|v| v.id == draft.vehicle_id)
        .ok_or_else(|| AppError::NotFound("Vehículo no encontrado".to_string()))?;
    if !ctx.manager_exists {
        return Err(AppError::NotFound("Gestor no encontrado".to_string()));
    }

    let vehicle_party = Party::Vehicle(vehicle.id);
    let driver_party = Party::Driver(driver.id);

    let latest = latest_event_at(ctx.events, vehicle_party)
        .into_iter()
        .chain(latest_event_at(ctx.events, driver_party))
        .max();
    if let Some(latest) = latest {
        if draft.occurred_at <= latest {
            return Err(field_error(
                "timestamp",
                format!(
                    "El evento debe ser posterior al último registro ({})",
                    latest.to_rfc3339()
                ),
            ));
        }
    }

    let (odometer, vehicle_status, vehicle_odometer) = match draft.event_type {
        EventType::Checkout => {
            if !driver.is_active() {
                return Err(AppError::Conflict(format!(
                    "El conductor está {} y no puede registrar salidas",
                    driver.status.as_str()
                )));
            }
            if resolve(ctx.events, vehicle_party).is_in_use() {
                return Err(AppError::Conflict(
                    "El vehículo ya tiene una salida sin llegada registrada".to_string(),
                ));
            }
            if resolve(ctx.events, driver_party).is_in_use() {
                return Err(AppError::Conflict(
                    "El conductor ya tiene una salida sin llegada registrada".to_string(),
                ));
            }
            if vehicle.status != VehicleStatus::Available {
                return Err(AppError::Conflict(format!(
                    "El vehículo no está disponible para salida (estado: {})",
                    vehicle.status.as_str()
                )));
            }
            (vehicle.odometer, VehicleStatus::InUse, vehicle.odometer)
        }
        EventType::CheckIn => {
            let open = match resolve(ctx.events, vehicle_party) {
                Availability::InUse(open) => open,
                Availability::Available => {
                    return Err(AppError::NotFound(
                        "No se encontró un registro de salida para este vehículo".to_string(),
                    ))
                }
            };
            if open.driver_id != driver.id {
                return Err(AppError::Conflict(
                    "El conductor no coincide con el de la salida registrada".to_string(),
                ));
            }
            if vehicle.status != VehicleStatus::InUse {
                return Err(AppError::Conflict(format!(
                    "El estado del vehículo ({}) no corresponde a una salida abierta",
                    vehicle.status.as_str()
                )));
            }
            let odometer = draft
                .odometer
                .ok_or_else(|| field_error("odometer", "El odómetro es requerido en la llegada"))?;
            validate_positive(odometer)
                .map_err(|_| field_error("odometer", "El odómetro debe ser un entero positivo"))?;
            if odometer <= vehicle.odometer {
                return Err(field_error(
                    "odometer",
                    format!(
                        "El odómetro debe ser mayor que el actual del vehículo ({})",
                        vehicle.odometer
                    ),
                ));
            }
            (odometer, VehicleStatus::Available, odometer)
        }
    };

    Ok(EventPlan {
        event: NewEvent {
            id: Uuid::new_v4(),
            event_type: draft.event_type,
            driver_id: driver.id,
            vehicle_id: vehicle.id,
            manager_id: draft.manager_id,
            odometer,
            phone: draft.phone,
            occurred_at: draft.occurred_at,
            notes: draft.notes,
        },
        vehicle_status,
        vehicle_odometer,
        driver_last_event_at: draft.occurred_at,
    })
}

/// Solo se elimina el evento más reciente del vehículo y del conductor;
/// el estado derivado del vehículo se recalcula con el ledger restante.
pub fn plan_removal(target: &Event, vehicle: &Vehicle, events: &[Event]) -> AppResult<RemovalPlan> {
    let superseded = |party: Party| {
        events
            .iter()
            .any(|e| e.id != target.id && party.matches(e) && e.occurred_at >= target.occurred_at)
    };
    if superseded(Party::Vehicle(target.vehicle_id)) || superseded(Party::Driver(target.driver_id)) {
        return Err(AppError::Conflict(
            "Solo se puede eliminar el último evento del vehículo y del conductor".to_string(),
        ));
    }

    let remaining: Vec<Event> = events.iter().filter(|e| e.id != target.id).cloned().collect();
    let availability = resolve(&remaining, Party::Vehicle(vehicle.id));

    let vehicle_status = match (&availability, vehicle.status) {
        (Availability::InUse(_), _) => VehicleStatus::InUse,
        (Availability::Available, VehicleStatus::InUse) => VehicleStatus::Available,
        (Availability::Available, status) => status,
    };
    let vehicle_odometer = match (target.event_type, availability.open_checkout()) {
        (EventType::CheckIn, Some(open)) => open.odometer,
        _ => vehicle.odometer,
    };

    Ok(RemovalPlan {
        event_id: target.id,
        vehicle_id: vehicle.id,
        vehicle_status,
        vehicle_odometer,
        driver_id: target.driver_id,
        driver_last_event_at: latest_event_at(&remaining, Party::Driver(target.driver_id)),
    })
}

/// Los campos del ledger son inmutables; solo notas y teléfono cambian
pub fn validate_edit(request: &UpdateEventRequest) -> AppResult<EventEdit> {
    let immutable = [
        ("type", request.event_type.is_some()),
        ("driver_id", request.driver_id.is_some()),
        ("vehicle_id", request.vehicle_id.is_some()),
        ("manager_id", request.manager_id.is_some()),
        ("odometer", request.odometer.is_some()),
        ("timestamp", request.timestamp.is_some()),
    ];
    if let Some(&(field, _)) = immutable.iter().find(|(_, present)| *present) {
        return Err(field_error(
            field,
            format!(
                "El campo '{}' no se puede editar; elimine el último evento y regístrelo de nuevo",
                field
            ),
        ));
    }

    if let Some(phone) = &request.phone {
        validate_contact_phone(phone).map_err(|_| phone_error())?;
    }

    Ok(EventEdit {
        phone: request.phone.as_ref().map(|p| p.trim().to_string()),
        notes: request.notes.as_ref().map(|n| n.trim().to_string()),
    })
}
