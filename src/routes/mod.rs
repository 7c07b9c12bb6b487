//! Routes
//!
//! Composición del router de la API. Cada recurso tiene su propio router
//! anidado bajo `/api`.

pub mod auth_routes;
pub mod booking_routes;
pub mod payment_routes;
pub mod vehicle_routes;
pub mod verification_routes;

use axum::{
    extract::DefaultBodyLimit, middleware::from_fn_with_state, response::Json, routing::get,
    Router,
};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use crate::middleware::auth::auth_middleware;
use crate::middleware::cors::cors_for;
use crate::state::AppState;

/// Holgura para el resto del JSON alrededor de la imagen en base64
const BODY_LIMIT_SLACK: usize = 64 * 1024;

/// Límite de body: una imagen en base64 (4/3 del tamaño binario) más holgura
fn body_limit(max_document_bytes: usize) -> usize {
    (max_document_bytes + 2) / 3 * 4 + BODY_LIMIT_SLACK
}

pub fn create_router(state: AppState) -> Router {
    let auth = from_fn_with_state(state.clone(), auth_middleware);

    let protected = Router::new()
        .nest("/bookings", booking_routes::create_booking_router())
        .nest("/payments", payment_routes::create_payment_router())
        .nest("/verification", verification_routes::create_verification_router())
        .route_layer(auth);

    let api = Router::new()
        .merge(auth_routes::create_auth_router())
        .nest("/cars", vehicle_routes::create_vehicle_router(state.clone()))
        .nest(
            "/manufacturers",
            vehicle_routes::create_manufacturer_router(state.clone()),
        )
        .merge(protected);

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors_for(&state.config))
                .layer(DefaultBodyLimit::max(body_limit(state.config.max_document_bytes))),
        )
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_limit_fits_base64_document() {
        let max = 5 * 1024 * 1024;
        assert!(body_limit(max) >= max * 4 / 3);
    }
}
