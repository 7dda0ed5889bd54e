//! Modelos del sistema
//!
//! Este módulo contiene los modelos de datos que mapean exactamente
//! al schema PostgreSQL.

pub mod driver;
pub mod event;
pub mod manager;
pub mod vehicle;

pub use driver::{Driver, DriverStatus};
pub use event::{Event, EventType, NewEvent};
pub use manager::Manager;
pub use vehicle::{Vehicle, VehicleStatus};
