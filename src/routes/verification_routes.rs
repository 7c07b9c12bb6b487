use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::VerificationController;
use crate::dto::verification_dto::{ReviewRequest, UploadDocumentRequest, VerificationStatusResponse};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::verification::DocumentKind;
use crate::state::AppState;
use crate::utils::errors::AppError;

type StatusResult = Result<Json<VerificationStatusResponse>, AppError>;

pub fn create_verification_router() -> Router<AppState> {
    Router::new()
        .route("/upload-selfie", post(upload_selfie))
        .route("/upload-id", post(upload_id))
        .route("/upload-selfie-with-id", post(upload_selfie_with_id))
        .route("/status", get(verification_status))
        .route("/images/:kind", get(verification_image))
        .route("/:user_id/review", post(review_verification))
}

async fn upload(
    state: &AppState,
    user: &AuthenticatedUser,
    kind: DocumentKind,
    request: UploadDocumentRequest,
) -> StatusResult {
    let controller = VerificationController::new(state);
    Ok(Json(controller.upload(user, kind, request).await?))
}

async fn upload_selfie(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<UploadDocumentRequest>,
) -> StatusResult {
    upload(&state, &user, DocumentKind::Selfie, request).await
}

async fn upload_id(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<UploadDocumentRequest>,
) -> StatusResult {
    upload(&state, &user, DocumentKind::IdCard, request).await
}

async fn upload_selfie_with_id(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<UploadDocumentRequest>,
) -> StatusResult {
    upload(&state, &user, DocumentKind::SelfieWithId, request).await
}

async fn verification_status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> StatusResult {
    let controller = VerificationController::new(&state);
    Ok(Json(controller.status(&user).await?))
}

async fn verification_image(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(kind): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let controller = VerificationController::new(&state);
    let bytes = controller.image(&user, &kind).await?;
    Ok(([(header::CONTENT_TYPE, "image/jpeg")], bytes))
}

async fn review_verification(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(user_id): Path<Uuid>,
    Json(request): Json<ReviewRequest>,
) -> StatusResult {
    let controller = VerificationController::new(&state);
    Ok(Json(controller.review(&user, user_id, request).await?))
}
