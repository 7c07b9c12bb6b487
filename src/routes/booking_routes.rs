use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::BookingController;
use crate::dto::booking_dto::CreateBookingRequest;
use crate::dto::ApiResponse;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::booking::{Booking, BookingAction, BookingStatusLog};
use crate::state::AppState;
use crate::utils::errors::AppError;

type BookingResult = Result<Json<ApiResponse<Booking>>, AppError>;

/// Rutas de reservas (requieren autenticación, ver `routes::create_router`)
pub fn create_booking_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_booking).get(list_bookings))
        .route("/:id", get(get_booking))
        .route("/:id/history", get(booking_history))
        .route("/:id/cancel", post(cancel_booking))
        .route("/:id/confirm", post(confirm_booking))
        .route("/:id/delivered", post(deliver_booking))
        .route("/:id/start-driving", post(start_driving))
        .route("/:id/return", post(return_booking))
}

async fn create_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Booking>>), AppError> {
    let controller = BookingController::new(&state);
    let response = controller.create(&user, request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn list_bookings(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let controller = BookingController::new(&state);
    Ok(Json(controller.list(&user).await?))
}

async fn get_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    let controller = BookingController::new(&state);
    Ok(Json(controller.get(&user, id).await?))
}

async fn booking_history(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<BookingStatusLog>>, AppError> {
    let controller = BookingController::new(&state);
    Ok(Json(controller.history(&user, id).await?))
}

async fn apply_action(state: &AppState, user: &AuthenticatedUser, id: Uuid, action: BookingAction) -> BookingResult {
    let controller = BookingController::new(state);
    Ok(Json(controller.apply(user, id, action).await?))
}

async fn cancel_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> BookingResult {
    apply_action(&state, &user, id, BookingAction::Cancel).await
}

async fn confirm_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> BookingResult {
    apply_action(&state, &user, id, BookingAction::Confirm).await
}

async fn deliver_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> BookingResult {
    apply_action(&state, &user, id, BookingAction::Deliver).await
}

async fn start_driving(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> BookingResult {
    apply_action(&state, &user, id, BookingAction::StartDriving).await
}

async fn return_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> BookingResult {
    apply_action(&state, &user, id, BookingAction::Return).await
}
