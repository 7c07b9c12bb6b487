//! Controller de cuentas
//!
//! Registro con OTP, activación, login con JWT y refresh de tokens.

use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::dto::auth_dto::{
    AccessTokenResponse, RefreshRequest, RegisterRequest, TokenRequest, TokenResponse,
    VerifyOtpRequest,
};
use crate::dto::ApiResponse;
use crate::models::user::{User, UserType, VerificationMethod};
use crate::repositories::UserRepository;
use crate::services::OtpService;
use crate::state::AppState;
use crate::utils::errors::{conflict_error, validation_error, AppError, AppResult};
use crate::utils::jwt::{generate_token, verify_token, JwtConfig, TokenKind};
use crate::utils::validation::normalize_email;

pub struct AuthController {
    users: Arc<dyn UserRepository>,
    otp_service: OtpService,
    jwt: JwtConfig,
    bcrypt_cost: u32,
}

impl AuthController {
    pub fn new(state: &AppState) -> Self {
        Self {
            users: state.users.clone(),
            otp_service: state.otp_service(),
            jwt: state.jwt_config(),
            bcrypt_cost: state.config.bcrypt_cost,
        }
    }

    /// Busca por email si el valor contiene '@', si no por teléfono
    async fn find_by_contact(&self, email_or_phone: &str) -> AppResult<Option<User>> {
        let value = email_or_phone.trim();
        if value.contains('@') {
            self.users.find_by_email(&normalize_email(value)).await
        } else {
            self.users.find_by_phone(value).await
        }
    }

    pub async fn register(&self, request: RegisterRequest) -> AppResult<ApiResponse<User>> {
        request.validate()?;

        let email = request.email.as_deref().map(normalize_email);
        let phone_number = request.phone_number.as_deref().map(|p| p.trim().to_string());

        if email.is_none() && phone_number.is_none() {
            return Err(validation_error("email", "Email or phone number is required"));
        }
        match request.verification_method {
            VerificationMethod::Email if email.is_none() => {
                return Err(validation_error("email", "Email is required for Email verification"));
            }
            VerificationMethod::Sms if phone_number.is_none() => {
                return Err(validation_error(
                    "phone_number",
                    "Phone number is required for SMS verification",
                ));
            }
            _ => {}
        }
        if request.user_type == UserType::Staff {
            return Err(AppError::BadRequest(
                "Staff accounts cannot be self-registered".to_string(),
            ));
        }

        if let Some(email) = &email {
            if self.users.find_by_email(email).await?.is_some() {
                return Err(conflict_error("User", "email", email));
            }
        }
        if let Some(phone) = &phone_number {
            if self.users.find_by_phone(phone).await?.is_some() {
                return Err(conflict_error("User", "phone_number", phone));
            }
        }

        let password_hash = bcrypt::hash(&request.password, self.bcrypt_cost)?;
        let user = self
            .users
            .create(User {
                id: Uuid::new_v4(),
                email,
                phone_number,
                password_hash,
                first_name: request.first_name,
                last_name: request.last_name,
                user_type: request.user_type,
                verification_method: request.verification_method,
                is_staff: false,
                is_active: false,
                is_verified: false,
                date_joined: Utc::now(),
            })
            .await?;

        // Sin OTP entregado la cuenta no puede activarse: se deshace el alta
        if let Err(e) = self.otp_service.issue(&user).await {
            self.users.delete(user.id).await?;
            return Err(e);
        }

        info!("👤 Usuario {} registrado ({})", user.id, user.user_type);
        let message = format!("OTP sent via {}", user.verification_method);
        Ok(ApiResponse::success_with_message(user, message))
    }

    pub async fn verify_otp(&self, request: VerifyOtpRequest) -> AppResult<ApiResponse<()>> {
        request.validate()?;

        let mut user = self
            .find_by_contact(&request.email_or_phone)
            .await?
            .ok_or_else(|| AppError::BadRequest("User not found".to_string()))?;

        self.otp_service.verify(user.id, &request.otp).await?;

        user.is_active = true;
        self.users.update(&user).await?;

        info!("✅ Cuenta {} activada", user.id);
        Ok(ApiResponse::message("Account verified successfully"))
    }

    pub async fn token(&self, request: TokenRequest) -> AppResult<TokenResponse> {
        request.validate()?;

        let invalid = || AppError::Unauthorized("Invalid credentials".to_string());
        let user = self
            .find_by_contact(&request.email_or_phone)
            .await?
            .ok_or_else(invalid)?;

        if !bcrypt::verify(&request.password, &user.password_hash)? {
            return Err(invalid());
        }
        if !user.is_active {
            return Err(AppError::Unauthorized("Account is not active".to_string()));
        }

        Ok(TokenResponse {
            access: generate_token(user.id, user.user_type, TokenKind::Access, &self.jwt)?,
            refresh: generate_token(user.id, user.user_type, TokenKind::Refresh, &self.jwt)?,
        })
    }

    pub async fn refresh(&self, request: RefreshRequest) -> AppResult<AccessTokenResponse> {
        request.validate()?;

        let claims = verify_token(&request.refresh, TokenKind::Refresh, &self.jwt)?;
        let user = self
            .users
            .find_by_id(claims.user_id()?)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| AppError::Unauthorized("User not found or inactive".to_string()))?;

        Ok(AccessTokenResponse {
            access: generate_token(user.id, user.user_type, TokenKind::Access, &self.jwt)?,
        })
    }
}
