//! Services module
//!
//! Lógica de negocio pura: no toca la base de datos. Los controladores
//! cargan los datos, delegan aquí las decisiones y persisten el resultado.

pub mod availability;
pub mod dashboard_service;
pub mod event_gateway;
pub mod ledger_audit;

pub use availability::{Availability, AvailabilityIndex, Party, PartyKind};
