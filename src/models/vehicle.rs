//! Modelo de Vehicle
//!
//! Mapea exactamente a la tabla `vehicles`. El estado `InUse` solo lo
//! escribe el gateway de eventos; las ediciones directas eligen entre
//! los estados administrativos.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Estado del vehículo - mapea al ENUM vehicle_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "vehicle_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VehicleStatus {
    Available,
    InUse,
    Maintenance,
    Unavailable,
}

impl VehicleStatus {
    pub const ALL: [VehicleStatus; 4] = [
        VehicleStatus::Available,
        VehicleStatus::InUse,
        VehicleStatus::Maintenance,
        VehicleStatus::Unavailable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleStatus::Available => "available",
            VehicleStatus::InUse => "in_use",
            VehicleStatus::Maintenance => "maintenance",
            VehicleStatus::Unavailable => "unavailable",
        }
    }

    /// Estados que se pueden fijar con una edición directa
    pub fn is_manually_assignable(&self) -> bool {
        !matches!(self, VehicleStatus::InUse)
    }
}

/// Vehicle principal - mapea a la tabla vehicles
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Vehicle {
    pub id: Uuid,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub plate: String,
    pub odometer: i64,
    pub status: VehicleStatus,
    pub registration_expiry: Option<NaiveDate>,
    pub insurance_expiry: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Vehicle {
    /// Etiqueta legible para alertas y listados
    pub fn label(&self) -> String {
        format!("{} {} ({})", self.make, self.model, self.plate)
    }
}
