//! Modelo de Event
//!
//! Entradas del ledger de salidas ("saída") y llegadas ("chegada").
//! El ledger es de solo anexado: solo notas y teléfono son editables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use std::{fmt, str::FromStr};
use uuid::Uuid;

/// Tipo de evento - mapea al ENUM event_type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "event_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    #[serde(alias = "saida")]
    Checkout,
    #[serde(alias = "chegada")]
    CheckIn,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Checkout => "checkout",
            EventType::CheckIn => "check_in",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "checkout" | "check_out" | "saida" | "saída" => Ok(EventType::Checkout),
            "checkin" | "check_in" | "chegada" => Ok(EventType::CheckIn),
            other => Err(format!("Tipo de evento desconocido: '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub event_type: EventType,
    pub driver_id: Uuid,
    pub vehicle_id: Uuid,
    pub manager_id: Uuid,
    pub odometer: i64,
    pub phone: String,
    pub occurred_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Evento listo para insertar, producido por el gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub id: Uuid,
    pub event_type: EventType,
    pub driver_id: Uuid,
    pub vehicle_id: Uuid,
    pub manager_id: Uuid,
    pub odometer: i64,
    pub phone: String,
    pub occurred_at: DateTime<Utc>,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_accepts_portuguese_names() {
        assert_eq!("Saída".parse::<EventType>().unwrap(), EventType::Checkout);
        assert_eq!("chegada".parse::<EventType>().unwrap(), EventType::CheckIn);
        assert_eq!("check_in".parse::<EventType>().unwrap(), EventType::CheckIn);
        assert!("manutencao".parse::<EventType>().is_err());
    }

    #[test]
    fn test_event_type_serde() {
        assert_eq!(serde_json::to_string(&EventType::CheckIn).unwrap(), "\"check_in\"");
        let parsed: EventType = serde_json::from_str("\"saida\"").unwrap();
        assert_eq!(parsed, EventType::Checkout);
    }
}
