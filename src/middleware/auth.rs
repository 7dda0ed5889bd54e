//! Middleware de autenticación JWT
//!
//! Verifica el token bearer de los gestores e inyecta el gestor autenticado
//! en las extensions de la request. La verificación es solo criptográfica:
//! no consulta la base de datos.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{
    state::AppState,
    utils::{
        errors::AppError,
        jwt::{extract_token_from_header, verify_token},
    },
};

/// Gestor autenticado que se inyecta en las requests
#[derive(Debug, Clone)]
pub struct AuthenticatedManager {
    pub manager_id: Uuid,
    pub email: String,
}

/// Middleware de autenticación JWT
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Token de autorización requerido".to_string()))?;

    let token = extract_token_from_header(auth_header)?;
    let claims = verify_token(token, &state.jwt)?;

    let manager_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::Unauthorized("ID de gestor inválido".to_string()))?;

    request.extensions_mut().insert(AuthenticatedManager {
        manager_id,
        email: claims.email,
    });

    Ok(next.run(request).await)
}
