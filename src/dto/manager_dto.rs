use serde::Deserialize;
use validator::Validate;

use crate::utils::validation::validate_contact_phone;

// Request para crear un gestor
#[derive(Debug, Deserialize, Validate)]
pub struct CreateManagerRequest {
    #[validate(length(min = 2, max = 120))]
    pub name: String,

    #[validate(email)]
    pub email: String,

    #[validate(custom = "validate_contact_phone")]
    pub phone: Option<String>,

    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

// Request para actualizar un gestor
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateManagerRequest {
    #[validate(length(min = 2, max = 120))]
    pub name: Option<String>,

    #[validate(email)]
    pub email: Option<String>,

    #[validate(custom = "validate_contact_phone")]
    pub phone: Option<String>,

    #[validate(length(min = 8, max = 128))]
    pub password: Option<String>,
}
