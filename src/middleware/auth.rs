//! Middleware de autenticación JWT
//!
//! Este módulo maneja la autenticación JWT, extracción de tokens
//! y verificación de usuarios autenticados.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use http::header;
use uuid::Uuid;

use crate::{
    models::user::{User, UserType},
    state::AppState,
    utils::{
        errors::AppError,
        jwt::{extract_token_from_header, verify_token, TokenKind},
    },
};

/// Usuario autenticado que se inyecta en las requests
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub user_type: UserType,
    pub is_staff: bool,
}

impl AuthenticatedUser {
    pub fn is_staff_member(&self) -> bool {
        self.is_staff || self.user_type == UserType::Staff
    }
}

impl From<&User> for AuthenticatedUser {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            user_type: user.user_type,
            is_staff: user.is_staff,
        }
    }
}

/// Middleware de autenticación JWT
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Extraer token del header Authorization
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Token de autorización requerido".to_string()))?;

    let token = extract_token_from_header(auth_header)?;
    let claims = verify_token(token, TokenKind::Access, &state.jwt_config())
        .map_err(|_| AppError::Unauthorized("Token inválido".to_string()))?;

    // El usuario debe seguir existiendo y estar activo
    let user = state
        .users
        .find_by_id(claims.user_id()?)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Usuario no encontrado".to_string()))?;

    if !user.is_active {
        return Err(AppError::Unauthorized("Usuario inactivo".to_string()));
    }

    request.extensions_mut().insert(AuthenticatedUser::from(&user));

    Ok(next.run(request).await)
}
