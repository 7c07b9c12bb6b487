use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::user::{UserType, VerificationMethod};
use crate::utils::validation::{validate_otp_code, validate_phone};

/// Registro de usuario
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    #[validate(custom = "validate_phone")]
    pub phone_number: Option<String>,
    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub password: String,
    pub verification_method: VerificationMethod,
    pub user_type: UserType,
    #[validate(length(max = 150))]
    pub first_name: Option<String>,
    #[validate(length(max = 150))]
    pub last_name: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyOtpRequest {
    #[validate(length(min = 1, message = "Email or phone is required"))]
    pub email_or_phone: String,
    #[validate(custom = "validate_otp_code")]
    pub otp: String,
}

// Login
#[derive(Debug, Deserialize, Validate)]
pub struct TokenRequest {
    #[validate(length(min = 1, message = "Email or phone is required"))]
    pub email_or_phone: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RefreshRequest {
    #[validate(length(min = 1))]
    pub refresh: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccessTokenResponse {
    pub access: String,
}
