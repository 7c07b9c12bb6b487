//! Sistema de manejo de errores
//!
//! Este módulo define todos los tipos de errores del sistema
//! y su conversión a respuestas HTTP apropiadas.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("JWT error: {0}")]
    Jwt(String),

    #[error("Hash error: {0}")]
    Hash(String),

    #[error("External API error: {0}")]
    ExternalApi(String),
}

/// Respuesta de error para la API
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
    code: String,
}

impl ErrorResponse {
    fn new(error: &str, message: String, code: &str) -> Self {
        Self {
            error: error.to_string(),
            message,
            details: None,
            code: code.to_string(),
        }
    }

    fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl AppError {
    /// Código HTTP asociado al error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::Internal(_) | AppError::Hash(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) | AppError::Jwt(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::ExternalApi(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!("❌ {}", self);
        } else {
            tracing::warn!("⚠️ {}", self);
        }

        let body = match self {
            AppError::Database(e) => ErrorResponse::new(
                "Database Error",
                "An error occurred while accessing the database".to_string(),
                "DB_ERROR",
            )
            .with_details(json!({ "sql_error": e.to_string() })),

            AppError::Validation(e) => ErrorResponse::new(
                "Validation Error",
                "The provided data is invalid".to_string(),
                "VALIDATION_ERROR",
            )
            .with_details(json!(e)),

            AppError::Unauthorized(msg) => ErrorResponse::new("Unauthorized", msg, "UNAUTHORIZED"),

            AppError::Forbidden(msg) => ErrorResponse::new("Forbidden", msg, "FORBIDDEN"),

            AppError::NotFound(msg) => ErrorResponse::new("Not Found", msg, "NOT_FOUND"),

            AppError::Conflict(msg) => ErrorResponse::new("Conflict", msg, "CONFLICT"),

            AppError::BadRequest(msg) => ErrorResponse::new("Bad Request", msg, "BAD_REQUEST"),

            AppError::Internal(msg) => ErrorResponse::new(
                "Internal Server Error",
                "An unexpected error occurred".to_string(),
                "INTERNAL_ERROR",
            )
            .with_details(json!({ "internal_error": msg })),

            AppError::ServiceUnavailable(msg) => {
                ErrorResponse::new("Service Unavailable", msg, "SERVICE_UNAVAILABLE")
            }

            AppError::Jwt(msg) => ErrorResponse::new("JWT Error", msg, "JWT_ERROR"),

            AppError::Hash(msg) => ErrorResponse::new(
                "Hash Error",
                "An error occurred while processing credentials".to_string(),
                "HASH_ERROR",
            )
            .with_details(json!({ "hash_error": msg })),

            AppError::ExternalApi(msg) => ErrorResponse::new(
                "External API Error",
                "An error occurred while communicating with external service".to_string(),
                "EXTERNAL_API_ERROR",
            )
            .with_details(json!({ "external_api_error": msg })),
        };

        (status, Json(body)).into_response()
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(e: bcrypt::BcryptError) -> Self {
        AppError::Hash(e.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::ExternalApi(e.to_string())
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

/// Función helper para crear errores de validación
pub fn validation_error(field: &'static str, message: &'static str) -> AppError {
    use validator::ValidationError;

    let mut error = ValidationError::new("custom");
    error.message = Some(message.into());

    let mut errors = validator::ValidationErrors::new();
    errors.add(field, error);

    AppError::Validation(errors)
}

/// Envuelve un `ValidationError` de un campo suelto
pub fn invalid_field(field: &'static str, error: validator::ValidationError) -> AppError {
    let mut errors = validator::ValidationErrors::new();
    errors.add(field, error);
    AppError::Validation(errors)
}

/// Función helper para crear errores de recurso no encontrado
pub fn not_found_error(resource: &str, id: &str) -> AppError {
    AppError::NotFound(format!("{} with id '{}' not found", resource, id))
}

/// Función helper para crear errores de conflicto
pub fn conflict_error(resource: &str, field: &str, value: &str) -> AppError {
    AppError::Conflict(format!("{} with {} '{}' already exists", resource, field, value))
}

/// Traduce una violación de unicidad (SQLSTATE 23505) en un conflicto;
/// cualquier otro error sigue siendo de base de datos
pub fn map_unique_violation(error: sqlx::Error, conflict: impl FnOnce() -> AppError) -> AppError {
    let unique = error
        .as_database_error()
        .map_or(false, |db| db.is_unique_violation());
    if unique {
        conflict()
    } else {
        AppError::Database(error)
    }
}

/// Función helper para crear errores de acceso prohibido
pub fn forbidden_error(operation: &str, reason: &str) -> AppError {
    AppError::Forbidden(format!("Cannot {}: {}", operation, reason))
}
