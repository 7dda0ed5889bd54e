use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{Vehicle, VehicleStatus};
use crate::services::Availability;
use crate::utils::validation::validate_license_plate;

// Request para crear un vehículo
#[derive(Debug, Deserialize, Validate)]
pub struct CreateVehicleRequest {
    #[validate(length(min = 1, max = 50))]
    pub make: String,

    #[validate(length(min = 1, max = 50))]
    pub model: String,

    pub year: i32,

    #[validate(custom = "validate_license_plate")]
    pub plate: String,

    #[validate(range(min = 0))]
    pub odometer: Option<i64>,

    pub status: Option<VehicleStatus>,
    pub registration_expiry: Option<NaiveDate>,
    pub insurance_expiry: Option<NaiveDate>,
}

// Request para actualizar un vehículo
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateVehicleRequest {
    #[validate(length(min = 1, max = 50))]
    pub make: Option<String>,

    #[validate(length(min = 1, max = 50))]
    pub model: Option<String>,

    pub year: Option<i32>,

    #[validate(custom = "validate_license_plate")]
    pub plate: Option<String>,

    #[validate(range(min = 0))]
    pub odometer: Option<i64>,

    pub status: Option<VehicleStatus>,
    pub registration_expiry: Option<NaiveDate>,
    pub insurance_expiry: Option<NaiveDate>,
}

// Response de vehículo con su estado derivado del ledger
#[derive(Debug, Serialize)]
pub struct VehicleResponse {
    #[serde(flatten)]
    pub vehicle: Vehicle,
    pub in_use: bool,
    pub current_driver_id: Option<Uuid>,
    pub in_use_since: Option<DateTime<Utc>>,
}

impl VehicleResponse {
    pub fn new(vehicle: Vehicle, availability: &Availability) -> Self {
        let open = availability.open_checkout();
        Self {
            vehicle,
            in_use: open.is_some(),
            current_driver_id: open.map(|o| o.counterpart_id),
            in_use_since: open.map(|o| o.since),
        }
    }
}
