use axum::{
    extract::{Path, State},
    routing::post,
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::PaymentController;
use crate::dto::payment_dto::CreatePaymentRequest;
use crate::dto::ApiResponse;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::payment::Payment;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_payment_router() -> Router<AppState> {
    Router::new().route("/:booking_id", post(pay_booking).get(list_payments))
}

async fn pay_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(booking_id): Path<Uuid>,
    Json(request): Json<CreatePaymentRequest>,
) -> Result<Json<ApiResponse<Payment>>, AppError> {
    let controller = PaymentController::new(&state);
    Ok(Json(controller.pay(&user, booking_id, request).await?))
}

async fn list_payments(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Vec<Payment>>, AppError> {
    let controller = PaymentController::new(&state);
    Ok(Json(controller.list(&user, booking_id).await?))
}
