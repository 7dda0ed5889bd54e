use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{Driver, DriverStatus};
use crate::services::availability::{driver_available_for_checkout, Availability};
use crate::utils::validation::{validate_driver_phone, validate_license_category, validate_license_number};

// Request para registrar un conductor
#[derive(Debug, Deserialize, Validate)]
pub struct CreateDriverRequest {
    #[validate(length(min = 2, max = 120))]
    pub name: String,

    #[validate(custom = "validate_driver_phone")]
    pub phone: String,

    #[validate(custom = "validate_license_number")]
    pub license_number: String,

    pub license_expiry: NaiveDate,

    #[validate(custom = "validate_license_category")]
    pub category: String,

    pub status: Option<DriverStatus>,
}

// Request para actualizar un conductor
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateDriverRequest {
    #[validate(length(min = 2, max = 120))]
    pub name: Option<String>,

    #[validate(custom = "validate_driver_phone")]
    pub phone: Option<String>,

    #[validate(custom = "validate_license_number")]
    pub license_number: Option<String>,

    pub license_expiry: Option<NaiveDate>,

    #[validate(custom = "validate_license_category")]
    pub category: Option<String>,

    pub status: Option<DriverStatus>,
}

// Response de conductor con su viaje en curso, si lo hay
#[derive(Debug, Serialize)]
pub struct DriverResponse {
    #[serde(flatten)]
    pub driver: Driver,
    pub traveling: bool,
    pub current_vehicle_id: Option<Uuid>,
    pub traveling_since: Option<DateTime<Utc>>,
    pub available_for_checkout: bool,
}

impl DriverResponse {
    pub fn new(driver: Driver, availability: &Availability) -> Self {
        let open = availability.open_checkout();
        let available_for_checkout = driver_available_for_checkout(&driver, availability);
        Self {
            traveling: open.is_some(),
            current_vehicle_id: open.map(|o| o.counterpart_id),
            traveling_since: open.map(|o| o.since),
            available_for_checkout,
            driver,
        }
    }
}
