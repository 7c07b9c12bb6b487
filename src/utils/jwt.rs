//! Utilidades JWT
//!
//! Este módulo contiene funciones helper para emitir y verificar los tokens
//! de acceso y refresh.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{config::environment::EnvironmentConfig, models::user::UserType, utils::errors::AppError};

/// Tipo de token emitido
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Claims del JWT
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,         // user_id
    pub user_type: UserType,
    pub token_type: TokenKind,
    pub exp: usize,          // expiration timestamp
    pub iat: usize,          // issued at timestamp
}

impl JwtClaims {
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.sub).map_err(|_| AppError::Unauthorized("ID de usuario inválido".to_string()))
    }
}

/// Configuración de JWT
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration: u64,
    pub refresh_expiration: u64,
}

impl From<&EnvironmentConfig> for JwtConfig {
    fn from(config: &EnvironmentConfig) -> Self {
        Self {
            secret: config.jwt_secret.clone(),
            expiration: config.jwt_expiration,
            refresh_expiration: config.jwt_refresh_expiration,
        }
    }
}

/// Generar JWT token para un usuario
pub fn generate_token(
    user_id: Uuid,
    user_type: UserType,
    kind: TokenKind,
    config: &JwtConfig,
) -> Result<String, AppError> {
    let now = chrono::Utc::now();
    let lifetime = match kind {
        TokenKind::Access => config.expiration,
        TokenKind::Refresh => config.refresh_expiration,
    };
    let expires_at = now + chrono::Duration::seconds(lifetime as i64);

    let claims = JwtClaims {
        sub: user_id.to_string(),
        user_type,
        token_type: kind,
        exp: expires_at.timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    let encoding_key = EncodingKey::from_secret(config.secret.as_ref());

    encode(&Header::default(), &claims, &encoding_key)
        .map_err(|e| AppError::Internal(format!("Error generando token: {}", e)))
}

/// Verificar y decodificar JWT token del tipo esperado
pub fn verify_token(token: &str, expected: TokenKind, config: &JwtConfig) -> Result<JwtClaims, AppError> {
    let decoding_key = DecodingKey::from_secret(config.secret.as_ref());

    let token_data = decode::<JwtClaims>(token, &decoding_key, &Validation::default())
        .map_err(|e| AppError::Jwt(format!("Token inválido: {}", e)))?;

    if token_data.claims.token_type != expected {
        return Err(AppError::Jwt("Tipo de token incorrecto".to_string()));
    }

    Ok(token_data.claims)
}

/// Extraer token del header Authorization
pub fn extract_token_from_header(auth_header: &str) -> Result<&str, AppError> {
    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Header Authorization debe comenzar con 'Bearer '".to_string()))?
        .trim();

    if token.is_empty() {
        return Err(AppError::Unauthorized("Token no puede estar vacío".to_string()));
    }

    Ok(token)
}
