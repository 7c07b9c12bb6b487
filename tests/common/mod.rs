//! Helpers compartidos por los tests de integración
//!
//! Levanta el router completo con el backend en memoria y expone un cliente
//! mínimo sobre `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use uuid::Uuid;

use drive_rental::config::EnvironmentConfig;
use drive_rental::models::user::{User, UserType, VerificationMethod};
use drive_rental::services::OtpNotifier;
use drive_rental::utils::errors::{AppError, AppResult};
use drive_rental::{create_router, AppState};

pub const PASSWORD: &str = "s3cure-pass";

/// Guarda el último OTP enviado a cada usuario
#[derive(Default)]
pub struct RecordingNotifier {
    codes: Mutex<HashMap<Uuid, String>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            codes: Mutex::new(HashMap::new()),
            fail: true,
        }
    }

    pub fn code_for(&self, user_id: Uuid) -> Option<String> {
        self.codes.lock().unwrap().get(&user_id).cloned()
    }
}

#[async_trait]
impl OtpNotifier for RecordingNotifier {
    async fn send_otp(&self, user: &User, code: &str) -> AppResult<()> {
        if self.fail {
            return Err(AppError::ExternalApi("gateway offline".to_string()));
        }
        self.codes.lock().unwrap().insert(user.id, code.to_string());
        Ok(())
    }
}

pub struct TestResponse {
    status: StatusCode,
    headers: axum::http::HeaderMap,
    body: Vec<u8>,
}

impl TestResponse {
    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn bytes(&self) -> &[u8] {
        &self.body
    }

    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn test_config() -> EnvironmentConfig {
    EnvironmentConfig {
        bcrypt_cost: 4,
        ..EnvironmentConfig::default()
    }
}

pub fn create_test_app() -> TestApp {
    create_test_app_with(AppState::in_memory(test_config()).unwrap(), RecordingNotifier::default())
}

pub fn create_test_app_with(state: AppState, notifier: RecordingNotifier) -> TestApp {
    let notifier = Arc::new(notifier);
    let state = state.with_notifier(notifier.clone());
    TestApp {
        router: create_router(state.clone()),
        state,
        notifier,
    }
}

impl TestApp {
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec();
        TestResponse { status, headers, body }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::DELETE, uri, token, None).await
    }

    /// Registra, activa con el OTP recibido y devuelve (user_id, access token)
    pub async fn signup(&self, email: &str, user_type: &str) -> (Uuid, String) {
        let response = self
            .post(
                "/api/register",
                None,
                json!({
                    "email": email,
                    "password": PASSWORD,
                    "verification_method": "Email",
                    "user_type": user_type,
                }),
            )
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED, "{:?}", response.json());
        let user_id: Uuid = response.json()["data"]["id"].as_str().unwrap().parse().unwrap();

        let code = self.notifier.code_for(user_id).unwrap();
        let response = self
            .post("/api/verify-otp", None, json!({ "email_or_phone": email, "otp": code }))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);

        (user_id, self.login(email).await)
    }

    pub async fn login(&self, email: &str) -> String {
        let response = self
            .post("/api/token", None, json!({ "email_or_phone": email, "password": PASSWORD }))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK, "{:?}", response.json());
        response.json()["access"].as_str().unwrap().to_string()
    }

    /// Staff no puede auto-registrarse: se inserta directamente
    pub async fn staff(&self, email: &str) -> (Uuid, String) {
        let user = User {
            id: Uuid::new_v4(),
            email: Some(email.to_string()),
            phone_number: None,
            password_hash: bcrypt::hash(PASSWORD, 4).unwrap(),
            first_name: Some("Staff".to_string()),
            last_name: None,
            user_type: UserType::Staff,
            verification_method: VerificationMethod::Email,
            is_staff: true,
            is_active: true,
            is_verified: true,
            date_joined: Utc::now(),
        };
        let user = self.state.users.create(user).await.unwrap();
        (user.id, self.login(email).await)
    }

    pub async fn manufacturer(&self, staff_token: &str) -> Uuid {
        let response = self
            .post(
                "/api/manufacturers",
                Some(staff_token),
                json!({ "name": "Toyota", "country": "Japan" }),
            )
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED);
        response.json()["data"]["id"].as_str().unwrap().parse().unwrap()
    }

    pub async fn car(&self, owner_token: &str, manufacturer_id: Uuid, plate: &str, price: &str) -> Uuid {
        let response = self
            .post(
                "/api/cars",
                Some(owner_token),
                json!({
                    "manufacturer_id": manufacturer_id,
                    "license_plate": plate,
                    "model": "Vios",
                    "year": 2021,
                    "passenger_capacity": 5,
                    "price_per_hour": price,
                }),
            )
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED, "{:?}", response.json());
        response.json()["data"]["id"].as_str().unwrap().parse().unwrap()
    }
}
