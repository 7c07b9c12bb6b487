use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::VehicleController;
use crate::dto::vehicle_dto::{CreateManufacturerRequest, CreateVehicleRequest, UpdateVehicleRequest};
use crate::dto::ApiResponse;
use crate::middleware::auth::{auth_middleware, AuthenticatedUser};
use crate::models::vehicle::{Manufacturer, Vehicle, VehicleFilters};
use crate::state::AppState;
use crate::utils::errors::AppError;

/// `/cars`: lectura pública, escritura autenticada
pub fn create_vehicle_router(state: AppState) -> Router<AppState> {
    let auth = from_fn_with_state(state, auth_middleware);

    Router::new()
        .route("/", post(create_vehicle).route_layer(auth.clone()).get(list_vehicles))
        .route("/mine", get(list_my_vehicles).route_layer(auth.clone()))
        .route(
            "/:id",
            put(update_vehicle)
                .delete(delete_vehicle)
                .route_layer(auth)
                .get(get_vehicle),
        )
}

/// `/manufacturers`: listado público, alta solo staff
pub fn create_manufacturer_router(state: AppState) -> Router<AppState> {
    let auth = from_fn_with_state(state, auth_middleware);

    Router::new().route(
        "/",
        post(create_manufacturer).route_layer(auth).get(list_manufacturers),
    )
}

async fn list_vehicles(
    State(state): State<AppState>,
    Query(filters): Query<VehicleFilters>,
) -> Result<Json<Vec<Vehicle>>, AppError> {
    let controller = VehicleController::new(&state);
    Ok(Json(controller.list_available(filters).await?))
}

async fn get_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vehicle>, AppError> {
    let controller = VehicleController::new(&state);
    Ok(Json(controller.get_by_id(id).await?))
}

async fn list_my_vehicles(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<Vehicle>>, AppError> {
    let controller = VehicleController::new(&state);
    Ok(Json(controller.list_mine(&user).await?))
}

async fn create_vehicle(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<CreateVehicleRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Vehicle>>), AppError> {
    let controller = VehicleController::new(&state);
    let response = controller.create(&user, request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn update_vehicle(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateVehicleRequest>,
) -> Result<Json<ApiResponse<Vehicle>>, AppError> {
    let controller = VehicleController::new(&state);
    Ok(Json(controller.update(&user, id, request).await?))
}

async fn delete_vehicle(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let controller = VehicleController::new(&state);
    controller.delete(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_manufacturers(
    State(state): State<AppState>,
) -> Result<Json<Vec<Manufacturer>>, AppError> {
    let controller = VehicleController::new(&state);
    Ok(Json(controller.list_manufacturers().await?))
}

async fn create_manufacturer(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<CreateManufacturerRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Manufacturer>>), AppError> {
    let controller = VehicleController::new(&state);
    let response = controller.create_manufacturer(&user, request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}
