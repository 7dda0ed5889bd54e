//! Sistema de manejo de errores
//!
//! Este módulo define los errores de la aplicación y su conversión a
//! respuestas HTTP. Validación y conflicto se detectan antes de cualquier
//! escritura; los errores de servidor se registran y se devuelven con un
//! mensaje genérico.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Código SQLSTATE de violación de unicidad
const UNIQUE_VIOLATION: &str = "23505";
/// Código SQLSTATE de violación de clave foránea
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Invalid field '{field}': {message}")]
    InvalidField { field: &'static str, message: String },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("JWT error: {0}")]
    Jwt(String),

    #[error("Hash error: {0}")]
    Hash(String),
}

/// Respuesta de error para la API
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
}

impl ErrorResponse {
    fn new(error: &str, message: String, code: &str) -> Self {
        Self {
            error: error.to_string(),
            message,
            details: None,
            code: Some(code.to_string()),
        }
    }

    fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl AppError {
    /// Código SQLSTATE cuando el error viene de Postgres
    fn sql_state(&self) -> Option<String> {
        match self {
            AppError::Database(e) => e
                .as_database_error()
                .and_then(|db| db.code())
                .map(|code| code.into_owned()),
            _ => None,
        }
    }

    /// Estado HTTP que corresponde a este error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(_) => match self.sql_state().as_deref() {
                Some(UNIQUE_VIOLATION) | Some(FOREIGN_KEY_VIOLATION) => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Validation(_) | AppError::InvalidField { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) | AppError::Jwt(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) | AppError::Hash(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let sql_state = self.sql_state();

        let body = match self {
            AppError::Database(e) => match sql_state.as_deref() {
                Some(UNIQUE_VIOLATION) => {
                    warn!("Unique violation: {}", e);
                    ErrorResponse::new(
                        "Conflict",
                        "El registro ya existe con un valor único duplicado".to_string(),
                        "CONFLICT",
                    )
                }
                Some(FOREIGN_KEY_VIOLATION) => {
                    warn!("Foreign key violation: {}", e);
                    ErrorResponse::new(
                        "Conflict",
                        "El registro está referenciado por otros datos".to_string(),
                        "CONFLICT",
                    )
                }
                _ => {
                    error!("Database error: {}", e);
                    ErrorResponse::new(
                        "Database Error",
                        "An error occurred while accessing the database".to_string(),
                        "DB_ERROR",
                    )
                }
            },

            AppError::Validation(e) => {
                warn!("Validation error: {}", e);
                ErrorResponse::new(
                    "Validation Error",
                    "The provided data is invalid".to_string(),
                    "VALIDATION_ERROR",
                )
                .with_details(json!(e))
            }

            AppError::InvalidField { field, message } => {
                warn!("Invalid field {}: {}", field, message);
                ErrorResponse::new("Validation Error", message, "VALIDATION_ERROR")
                    .with_details(json!({ "field": field }))
            }

            AppError::Unauthorized(msg) => {
                warn!("Unauthorized access: {}", msg);
                ErrorResponse::new("Unauthorized", msg, "UNAUTHORIZED")
            }

            AppError::Jwt(msg) => {
                warn!("JWT error: {}", msg);
                ErrorResponse::new("JWT Error", msg, "JWT_ERROR")
            }

            AppError::NotFound(msg) => {
                warn!("Resource not found: {}", msg);
                ErrorResponse::new("Not Found", msg, "NOT_FOUND")
            }

            AppError::Conflict(msg) => {
                warn!("Conflict: {}", msg);
                ErrorResponse::new("Conflict", msg, "CONFLICT")
            }

            AppError::Internal(msg) => {
                error!("Internal error: {}", msg);
                ErrorResponse::new(
                    "Internal Server Error",
                    "An unexpected error occurred".to_string(),
                    "INTERNAL_ERROR",
                )
            }

            AppError::Hash(msg) => {
                error!("Hash error: {}", msg);
                ErrorResponse::new(
                    "Hash Error",
                    "An error occurred while processing credentials".to_string(),
                    "HASH_ERROR",
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

/// Error de validación asociado a un campo concreto
pub fn field_error(field: &'static str, message: impl Into<String>) -> AppError {
    AppError::InvalidField {
        field,
        message: message.into(),
    }
}

/// Error de campo requerido ausente
pub fn required_field(field: &'static str) -> AppError {
    field_error(field, format!("El campo '{}' es requerido", field))
}

/// Función helper para crear errores de recurso no encontrado
pub fn not_found_error(resource: &str, id: &str) -> AppError {
    AppError::NotFound(format!("{} con id '{}' no encontrado", resource, id))
}

/// Función helper para crear errores de conflicto
pub fn conflict_error(resource: &str, field: &str, value: &str) -> AppError {
    AppError::Conflict(format!("{} con {} '{}' ya existe", resource, field, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(required_field("phone").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            conflict_error("Vehículo", "placa", "ABC1234").status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            not_found_error("Conductor", "x").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Database(sqlx::Error::RowNotFound).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Jwt("expirado".to_string()).status_code(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_required_field_names_the_field() {
        match required_field("driver_id") {
            AppError::InvalidField { field, message } => {
                assert_eq!(field, "driver_id");
                assert!(message.contains("driver_id"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_internal_error_hides_details() {
        let response = AppError::Internal("pool exhausted at 10.0.0.3".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], "INTERNAL_ERROR");
        assert!(!json.to_string().contains("10.0.0.3"));
    }
}
