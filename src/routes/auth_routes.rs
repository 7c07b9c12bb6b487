use axum::{extract::State, http::StatusCode, routing::post, Json, Router};

use crate::controllers::AuthController;
use crate::dto::auth_dto::{
    AccessTokenResponse, RefreshRequest, RegisterRequest, TokenRequest, TokenResponse,
    VerifyOtpRequest,
};
use crate::dto::ApiResponse;
use crate::models::user::User;
use crate::state::AppState;
use crate::utils::errors::AppError;

/// Rutas públicas de cuentas
pub fn create_auth_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/verify-otp", post(verify_otp))
        .route("/token", post(token))
        .route("/token/refresh", post(refresh_token))
}

async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<User>>), AppError> {
    let controller = AuthController::new(&state);
    let response = controller.register(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn verify_otp(
    State(state): State<AppState>,
    Json(request): Json<VerifyOtpRequest>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = AuthController::new(&state);
    Ok(Json(controller.verify_otp(request).await?))
}

async fn token(
    State(state): State<AppState>,
    Json(request): Json<TokenRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let controller = AuthController::new(&state);
    Ok(Json(controller.token(request).await?))
}

async fn refresh_token(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<AccessTokenResponse>, AppError> {
    let controller = AuthController::new(&state);
    Ok(Json(controller.refresh(request).await?))
}
