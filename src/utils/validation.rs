//! Utilidades de validación
//!
//! Este módulo contiene funciones helper para validación de datos
//! y conversión de tipos. Las funciones con firma `fn(&str) -> Result<(), ValidationError>`
//! se usan también desde `#[validate(custom = ...)]` en los DTOs.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use uuid::Uuid;
use validator::ValidationError;

/// Categorías de CNH aceptadas
pub const LICENSE_CATEGORIES: [&str; 9] = ["A", "B", "C", "D", "E", "AB", "AC", "AD", "AE"];

/// Dígitos mínimos de un teléfono de contacto en un evento
pub const MIN_PHONE_DIGITS: usize = 10;

/// Longitud máxima de un teléfono de contacto (columnas VARCHAR(20))
pub const MAX_PHONE_LENGTH: usize = 20;

lazy_static! {
    // Placa antigua (ABC1234) o Mercosul (ABC1D23), ya normalizada
    static ref PLATE_REGEX: Regex = Regex::new(r"^[A-Z]{3}[0-9][A-Z0-9][0-9]{2}$").unwrap();
    static ref LICENSE_NUMBER_REGEX: Regex = Regex::new(r"^[0-9]{11}$").unwrap();
    // (11) 98765-4321, 11 98765-4321, 1198765432...
    static ref DRIVER_PHONE_REGEX: Regex =
        Regex::new(r"^\(?[0-9]{2}\)?\s?[0-9]{4,5}-?[0-9]{4}$").unwrap();
}

/// Validar y convertir string a UUID
pub fn validate_uuid(value: &str) -> Result<Uuid, ValidationError> {
    Uuid::parse_str(value.trim()).map_err(|_| {
        let mut error = ValidationError::new("uuid");
        error.add_param("value".into(), &value.to_string());
        error
    })
}

/// Validar y convertir string a datetime
pub fn validate_datetime(value: &str) -> Result<DateTime<Utc>, ValidationError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            let mut error = ValidationError::new("datetime");
            error.add_param("value".into(), &value.to_string());
            error.add_param("format".into(), &"RFC3339".to_string());
            error
        })
}

/// Dígitos de un teléfono, sin puntuación
pub fn phone_digits(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Teléfono de contacto: al menos 10 dígitos y como mucho 20 caracteres
pub fn validate_contact_phone(value: &str) -> Result<(), ValidationError> {
    if phone_digits(value).len() < MIN_PHONE_DIGITS || value.trim().chars().count() > MAX_PHONE_LENGTH {
        let mut error = ValidationError::new("phone");
        error.add_param("value".into(), &value.to_string());
        error.add_param("min_digits".into(), &MIN_PHONE_DIGITS);
        error.add_param("max_length".into(), &MAX_PHONE_LENGTH);
        return Err(error);
    }
    Ok(())
}

/// Teléfono de un conductor: patrón fijo (DD) DDDDD-DDDD
pub fn validate_driver_phone(value: &str) -> Result<(), ValidationError> {
    if !DRIVER_PHONE_REGEX.is_match(value.trim()) {
        let mut error = ValidationError::new("phone");
        error.add_param("value".into(), &value.to_string());
        error.add_param("format".into(), &"(DD) DDDDD-DDDD".to_string());
        return Err(error);
    }
    Ok(())
}

/// Número de CNH: 11 dígitos
pub fn validate_license_number(value: &str) -> Result<(), ValidationError> {
    if !LICENSE_NUMBER_REGEX.is_match(value.trim()) {
        let mut error = ValidationError::new("license_number");
        error.add_param("value".into(), &value.to_string());
        error.add_param("format".into(), &"11 digits".to_string());
        return Err(error);
    }
    Ok(())
}

/// Categoría de CNH
pub fn validate_license_category(value: &str) -> Result<(), ValidationError> {
    let normalized = value.trim().to_uppercase();
    validate_enum(normalized.as_str(), &LICENSE_CATEGORIES)
}

/// Normalizar placa: mayúsculas, sin espacios ni guiones
pub fn normalize_plate(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .collect::<String>()
        .to_uppercase()
}

/// Validar formato de placa de vehículo
pub fn validate_license_plate(value: &str) -> Result<(), ValidationError> {
    if !PLATE_REGEX.is_match(&normalize_plate(value)) {
        let mut error = ValidationError::new("license_plate");
        error.add_param("value".into(), &value.to_string());
        error.add_param("format".into(), &"ABC-1234 or ABC1D23".to_string());
        return Err(error);
    }
    Ok(())
}

/// Año de fabricación: entre 1900 y el año siguiente al actual
pub fn validate_vehicle_year(year: i32, today: NaiveDate) -> Result<(), ValidationError> {
    validate_range(year, 1900, today.year() + 1)
}

/// La fecha no puede estar en el pasado
pub fn validate_not_expired(date: NaiveDate, today: NaiveDate) -> Result<(), ValidationError> {
    if date < today {
        let mut error = ValidationError::new("expired");
        error.add_param("value".into(), &date.to_string());
        error.add_param("today".into(), &today.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar que un valor esté en un rango específico
pub fn validate_range<T: PartialOrd + std::fmt::Display + Serialize>(
    value: T,
    min: T,
    max: T,
) -> Result<(), ValidationError> {
    if value < min || value > max {
        let mut error = ValidationError::new("range");
        error.add_param("min".into(), &min);
        error.add_param("max".into(), &max);
        error.add_param("actual".into(), &value);
        return Err(error);
    }
    Ok(())
}

/// Validar que un valor esté en una lista de valores permitidos
pub fn validate_enum<T: PartialEq + std::fmt::Display + std::fmt::Debug + Serialize>(
    value: T,
    allowed_values: &[T],
) -> Result<(), ValidationError> {
    if !allowed_values.contains(&value) {
        let mut error = ValidationError::new("enum");
        error.add_param("value".into(), &value);
        error.add_param("allowed_values".into(), &format!("{:?}", allowed_values));
        return Err(error);
    }
    Ok(())
}

/// Validar que un valor sea positivo
pub fn validate_positive<T: PartialOrd + std::fmt::Display + num_traits::Zero + Serialize>(
    value: T,
) -> Result<(), ValidationError> {
    if value <= T::zero() {
        let mut error = ValidationError::new("positive");
        error.add_param("value".into(), &value);
        return Err(error);
    }
    Ok(())
}
