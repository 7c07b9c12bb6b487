//! Data Transfer Objects
//!
//! Requests y responses de la API. Los requests se validan con `validator`.

pub mod auth_dto;
pub mod booking_dto;
pub mod payment_dto;
pub mod vehicle_dto;
pub mod verification_dto;

use serde::Serialize;

/// Envoltorio estándar de respuestas exitosas
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
        }
    }
}
