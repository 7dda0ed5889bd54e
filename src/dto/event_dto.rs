use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::{Event, EventType, Vehicle};

// Registro de salida/llegada. Todo llega como opcional para que el gateway
// pueda informar qué campo falta.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterEventRequest {
    pub driver_id: Option<String>,
    pub vehicle_id: Option<String>,
    pub manager_id: Option<String>,
    #[serde(rename = "type", alias = "event_type")]
    pub event_type: Option<String>,
    pub phone: Option<String>,
    pub odometer: Option<i64>,
    pub notes: Option<String>,
    /// RFC 3339; por defecto el instante del registro
    pub timestamp: Option<String>,
}

// Edición de un evento. Los campos del ledger se aceptan solo para
// rechazarlos con un mensaje explícito.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateEventRequest {
    pub phone: Option<String>,
    pub notes: Option<String>,
    #[serde(rename = "type", alias = "event_type")]
    pub event_type: Option<String>,
    pub driver_id: Option<String>,
    pub vehicle_id: Option<String>,
    pub manager_id: Option<String>,
    pub odometer: Option<i64>,
    pub timestamp: Option<String>,
}

// Filtros del listado de eventos
#[derive(Debug, Default, Deserialize)]
pub struct EventFilters {
    pub search: Option<String>,
    pub vehicle_id: Option<Uuid>,
    pub driver_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub event_type: Option<EventType>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

// Evento con los nombres de sus participantes, para listados
#[derive(Debug, Serialize, FromRow)]
pub struct EventDetails {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub event: Event,
    pub driver_name: String,
    pub vehicle_plate: String,
    pub manager_name: String,
}

// Resultado del registro: el evento y el vehículo actualizado
#[derive(Debug, Serialize)]
pub struct EventRegistered {
    pub event: Event,
    pub vehicle: Vehicle,
}
