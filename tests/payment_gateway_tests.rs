mod common;

use async_trait::async_trait;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use drive_rental::config::{EnvironmentConfig, PaypalConfig, StripeConfig};
use drive_rental::models::payment::{Payment, PaymentMethod};
use drive_rental::services::payments::{CashGateway, PaymentGateway, PaymentGatewayRegistry};
use drive_rental::utils::errors::{AppError, AppResult};
use drive_rental::AppState;

use common::{create_test_app_with, test_config, RecordingNotifier, TestApp};

/// Levanta un servidor axum local y devuelve su dirección
async fn spawn_mock(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

async fn stripe_mock(accept: bool) -> SocketAddr {
    let router = Router::new().route(
        "/v1/payment_intents",
        post(move |headers: HeaderMap| async move {
            let authorized = headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .map_or(false, |v| v == "Bearer sk_test_123");
            if !accept || !authorized {
                return (
                    StatusCode::PAYMENT_REQUIRED,
                    Json(json!({ "error": { "message": "Your card was declined." } })),
                );
            }
            (
                StatusCode::OK,
                Json(json!({
                    "id": "pi_test_1",
                    "status": "requires_payment_method",
                    "client_secret": "pi_test_1_secret",
                    "capture_method": "automatic",
                    "confirmation_method": "automatic",
                })),
            )
        }),
    );
    spawn_mock(router).await
}

#[derive(Clone, Default)]
struct PaypalCalls {
    tokens: Arc<AtomicUsize>,
    orders: Arc<AtomicUsize>,
}

async fn paypal_mock(calls: PaypalCalls, capture_status: &'static str) -> SocketAddr {
    let router = Router::new()
        .route(
            "/v1/oauth2/token",
            post(|State(calls): State<PaypalCalls>| async move {
                calls.tokens.fetch_add(1, Ordering::SeqCst);
                Json(json!({ "access_token": "A21AA-test", "token_type": "Bearer", "expires_in": 32400 }))
            }),
        )
        .route(
            "/v2/checkout/orders",
            post(|State(calls): State<PaypalCalls>, Json(body): Json<Value>| async move {
                calls.orders.fetch_add(1, Ordering::SeqCst);
                assert_eq!(body["intent"], "CAPTURE");
                (StatusCode::CREATED, Json(json!({ "id": "ORDER-1", "status": "CREATED" })))
            }),
        )
        .route(
            "/v2/checkout/orders/:id/capture",
            post(move |Path(id): Path<String>| async move {
                (
                    StatusCode::CREATED,
                    Json(json!({
                        "id": id,
                        "status": capture_status,
                        "payer": { "email_address": "buyer@example.com" },
                        "payment_source": { "paypal": {} },
                        "links": [],
                    })),
                )
            }),
        )
        .with_state(calls);
    spawn_mock(router).await
}

fn app_with_config(config: EnvironmentConfig) -> TestApp {
    create_test_app_with(AppState::in_memory(config).unwrap(), RecordingNotifier::default())
}

/// Cliente con una reserva y su token
async fn booked(app: &TestApp) -> (Uuid, String, String) {
    let (_, staff) = app.staff("staff@mail.com").await;
    let (_, owner) = app.signup("owner@mail.com", "car_owner").await;
    let (_, customer) = app.signup("cust@mail.com", "customer").await;
    let manufacturer_id = app.manufacturer(&staff).await;
    let car_id = app.car(&owner, manufacturer_id, "PAY0001", "10.00").await;

    let start = Utc::now() + Duration::days(1);
    let response = app
        .post(
            "/api/bookings",
            Some(&customer),
            json!({
                "vehicle_id": car_id,
                "start_time": start.to_rfc3339(),
                "end_time": (start + Duration::hours(3)).to_rfc3339(),
            }),
        )
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let booking_id = response.json()["data"]["id"].as_str().unwrap().parse().unwrap();
    (booking_id, customer, owner)
}

async fn pay(app: &TestApp, token: &str, booking_id: Uuid, method: &str) -> (StatusCode, Value) {
    let response = app
        .post(
            &format!("/api/payments/{}", booking_id),
            Some(token),
            json!({ "amount": "30.00", "method": method }),
        )
        .await;
    (response.status_code(), response.json())
}

#[tokio::test]
async fn test_cash_payment_completes() {
    let app = app_with_config(test_config());
    let (booking_id, customer, owner) = booked(&app).await;

    let (status, body) = pay(&app, &customer, booking_id, "cash").await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["message"], "Payment successful");
    assert_eq!(body["data"]["status"], "completed");
    assert_eq!(body["data"]["method"], "cash");
    assert!(body["data"]["transaction_id"].as_str().is_some());

    // El propietario ve los pagos de reservas de sus coches
    let response = app.get(&format!("/api/payments/{}", booking_id), Some(&owner)).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json().as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_payment_request_errors() {
    let app = app_with_config(test_config());
    let (booking_id, customer, owner) = booked(&app).await;

    let (status, body) = pay(&app, &customer, booking_id, "bitcoin").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid payment method");

    // Stripe sin credenciales no está registrado
    let (status, _) = pay(&app, &customer, booking_id, "stripe").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = pay(&app, &owner, booking_id, "cash").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = pay(&app, &customer, Uuid::new_v4(), "cash").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let response = app
        .post(
            &format!("/api/payments/{}", booking_id),
            Some(&customer),
            json!({ "amount": "-5.00", "method": "cash" }),
        )
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let response = app.get(&format!("/api/payments/{}", booking_id), Some(&customer)).await;
    assert!(response.json().as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_stripe_payment_against_local_server() {
    let addr = stripe_mock(true).await;
    let config = EnvironmentConfig {
        stripe: Some(StripeConfig {
            secret_key: "sk_test_123".to_string(),
            base_url: format!("http://{}", addr),
        }),
        ..test_config()
    };
    let app = app_with_config(config);
    let (booking_id, customer, _) = booked(&app).await;

    let (status, body) = pay(&app, &customer, booking_id, "stripe").await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["transaction_id"], "pi_test_1");
    assert_eq!(body["data"]["provider_details"]["provider"], "stripe");
    assert_eq!(body["data"]["provider_details"]["client_secret"], "pi_test_1_secret");
}

#[tokio::test]
async fn test_stripe_decline_is_recorded_as_failed() {
    let addr = stripe_mock(false).await;
    let config = EnvironmentConfig {
        stripe: Some(StripeConfig {
            secret_key: "sk_test_123".to_string(),
            base_url: format!("http://{}", addr),
        }),
        ..test_config()
    };
    let app = app_with_config(config);
    let (booking_id, customer, _) = booked(&app).await;

    let (status, body) = pay(&app, &customer, booking_id, "stripe").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Payment failed");

    let payments = app.get(&format!("/api/payments/{}", booking_id), Some(&customer)).await.json();
    assert_eq!(payments[0]["status"], "failed");
}

#[tokio::test]
async fn test_paypal_order_is_captured_and_token_reused() {
    let calls = PaypalCalls::default();
    let addr = paypal_mock(calls.clone(), "COMPLETED").await;
    let config = EnvironmentConfig {
        paypal: Some(PaypalConfig {
            client_id: "client".to_string(),
            secret: "secret".to_string(),
            base_url: format!("http://{}", addr),
        }),
        ..test_config()
    };
    let app = app_with_config(config);
    let (booking_id, customer, _) = booked(&app).await;

    let (status, body) = pay(&app, &customer, booking_id, "paypal").await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["transaction_id"], "ORDER-1");
    assert_eq!(body["data"]["provider_details"]["capture_status"], "COMPLETED");
    assert_eq!(
        body["data"]["provider_details"]["payer"]["email_address"],
        "buyer@example.com"
    );

    let (status, _) = pay(&app, &customer, booking_id, "paypal").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(calls.tokens.load(Ordering::SeqCst), 1);
    assert_eq!(calls.orders.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_paypal_incomplete_capture_fails_payment() {
    let addr = paypal_mock(PaypalCalls::default(), "PENDING").await;
    let config = EnvironmentConfig {
        paypal: Some(PaypalConfig {
            client_id: "client".to_string(),
            secret: "secret".to_string(),
            base_url: format!("http://{}", addr),
        }),
        ..test_config()
    };
    let app = app_with_config(config);
    let (booking_id, customer, _) = booked(&app).await;

    let (status, body) = pay(&app, &customer, booking_id, "paypal").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Payment failed");
}

struct OfflineGateway;

#[async_trait]
impl PaymentGateway for OfflineGateway {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::Gcash
    }

    async fn process_payment(&self, _payment: &mut Payment) -> AppResult<bool> {
        Err(AppError::ExternalApi("connection refused".to_string()))
    }
}

#[tokio::test]
async fn test_provider_error_maps_to_bad_gateway() {
    let registry = PaymentGatewayRegistry::new()
        .with_gateway(Arc::new(CashGateway))
        .with_gateway(Arc::new(OfflineGateway));
    let state = AppState::in_memory(test_config()).unwrap().with_gateways(registry);
    let app = create_test_app_with(state, RecordingNotifier::default());
    let (booking_id, customer, _) = booked(&app).await;

    let (status, _) = pay(&app, &customer, booking_id, "gcash").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    let payments = app.get(&format!("/api/payments/{}", booking_id), Some(&customer)).await.json();
    assert_eq!(payments[0]["status"], "failed");
    assert_eq!(payments[0]["method"], "gcash");
}

#[tokio::test]
async fn test_stalled_provider_times_out_as_bad_gateway() {
    let router = Router::new().route(
        "/v1/payment_intents",
        post(|| async {
            tokio::time::sleep(std::time::Duration::from_secs(5)).await;
            Json(json!({ "id": "pi_late" }))
        }),
    );
    let addr = spawn_mock(router).await;
    let config = EnvironmentConfig {
        http_timeout_secs: 1,
        stripe: Some(StripeConfig {
            secret_key: "sk_test_123".to_string(),
            base_url: format!("http://{}", addr),
        }),
        ..test_config()
    };
    let app = app_with_config(config);
    let (booking_id, customer, _) = booked(&app).await;

    let (status, _) = pay(&app, &customer, booking_id, "stripe").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    let payments = app.get(&format!("/api/payments/{}", booking_id), Some(&customer)).await.json();
    assert_eq!(payments[0]["status"], "failed");
}

#[tokio::test]
async fn test_amount_above_storable_maximum_is_rejected() {
    let app = app_with_config(test_config());
    let (booking_id, customer, _) = booked(&app).await;

    let response = app
        .post(
            &format!("/api/payments/{}", booking_id),
            Some(&customer),
            json!({ "amount": "100000000", "method": "cash" }),
        )
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let response = app
        .post(
            &format!("/api/payments/{}", booking_id),
            Some(&customer),
            json!({ "amount": "99999999.99", "method": "cash" }),
        )
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
}
