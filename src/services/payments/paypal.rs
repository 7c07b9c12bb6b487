//! Gateway de PayPal (Orders v2)
//!
//! Flujo: token OAuth2 (cacheado hasta su expiración) → crear orden → capturar.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::PaypalConfig;
use crate::models::payment::{Payment, PaymentMethod, ProviderDetails};
use crate::services::payments::PaymentGateway;
use crate::utils::errors::{AppError, AppResult};

/// Margen antes de la expiración real del token
const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Deserialize)]
struct OrderResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct CaptureResponse {
    status: String,
    payer: Option<Value>,
    payment_source: Option<Value>,
    links: Option<Value>,
}

/// Token de acceso con su expiración
#[derive(Debug, Clone)]
struct AccessToken {
    token: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

pub struct PaypalGateway {
    client: Client,
    config: PaypalConfig,
    token: RwLock<Option<AccessToken>>,
}

impl PaypalGateway {
    pub fn new(client: Client, config: PaypalConfig) -> Self {
        Self {
            client,
            config,
            token: RwLock::new(None),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn access_token(&self) -> AppResult<String> {
        if let Some(cached) = self.token.read().await.as_ref() {
            if !cached.is_expired() {
                return Ok(cached.token.clone());
            }
        }

        let mut slot = self.token.write().await;
        if let Some(cached) = slot.as_ref() {
            if !cached.is_expired() {
                return Ok(cached.token.clone());
            }
        }

        log::info!("🔐 Solicitando token OAuth2 a PayPal");
        let response = self
            .client
            .post(self.url("/v1/oauth2/token"))
            .basic_auth(&self.config.client_id, Some(&self.config.secret))
            .header("Accept", "application/json")
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::ExternalApi(format!(
                "PayPal token request failed with status {}",
                response.status()
            )));
        }

        let body: TokenResponse = response.json().await?;
        let lifetime = (body.expires_in - TOKEN_EXPIRY_MARGIN_SECS).max(0);
        let token = AccessToken {
            token: body.access_token,
            expires_at: Utc::now() + Duration::seconds(lifetime),
        };
        let value = token.token.clone();
        *slot = Some(token);

        Ok(value)
    }

    async fn create_order(&self, token: &str, payment: &Payment, request_id: &str) -> AppResult<Option<String>> {
        let body = json!({
            "intent": "CAPTURE",
            "purchase_units": [{
                "amount": {
                    "currency_code": "USD",
                    "value": format!("{:.2}", payment.amount),
                },
                "description": "Car rental payment",
            }],
        });

        let response = self
            .client
            .post(self.url("/v2/checkout/orders"))
            .bearer_auth(token)
            .header("PayPal-Request-Id", request_id)
            .json(&body)
            .send()
            .await?;

        if response.status() != StatusCode::CREATED {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            log::warn!("⚠️ Error creando orden PayPal ({}): {}", status, text);
            return Ok(None);
        }

        let order: OrderResponse = response.json().await?;
        Ok(Some(order.id))
    }

    async fn capture_order(&self, token: &str, order_id: &str, request_id: &str) -> AppResult<Option<CaptureResponse>> {
        let response = self
            .client
            .post(self.url(&format!("/v2/checkout/orders/{}/capture", order_id)))
            .bearer_auth(token)
            .header("PayPal-Request-Id", request_id)
            .json(&json!({}))
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK && status != StatusCode::CREATED {
            let text = response.text().await.unwrap_or_default();
            log::warn!("⚠️ Error capturando orden PayPal {} ({}): {}", order_id, status, text);
            return Ok(None);
        }

        Ok(Some(response.json().await?))
    }
}

#[async_trait]
impl PaymentGateway for PaypalGateway {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::Paypal
    }

    async fn process_payment(&self, payment: &mut Payment) -> AppResult<bool> {
        let token = self.access_token().await?;
        let request_id = Uuid::new_v4().to_string();

        payment.provider_details = ProviderDetails::Paypal {
            paypal_request_id: request_id.clone(),
            order_id: None,
            payer: None,
            payment_source: None,
            links: None,
            capture_status: None,
        };

        let Some(order_id) = self.create_order(&token, payment, &request_id).await? else {
            return Ok(false);
        };
        payment.transaction_id = Some(order_id.clone());
        if let ProviderDetails::Paypal { order_id: slot, .. } = &mut payment.provider_details {
            *slot = Some(order_id.clone());
        }

        let Some(capture) = self.capture_order(&token, &order_id, &request_id).await? else {
            return Ok(false);
        };

        let completed = capture.status == "COMPLETED";
        if !completed {
            log::warn!("⚠️ Orden PayPal {} no completada: {}", order_id, capture.status);
        }

        if let ProviderDetails::Paypal {
            payer,
            payment_source,
            links,
            capture_status,
            ..
        } = &mut payment.provider_details
        {
            *payer = capture.payer;
            *payment_source = capture.payment_source;
            *links = capture.links;
            *capture_status = Some(capture.status);
        }

        Ok(completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_expiry() {
        let fresh = AccessToken {
            token: "t".into(),
            expires_at: Utc::now() + Duration::minutes(5),
        };
        let stale = AccessToken {
            token: "t".into(),
            expires_at: Utc::now() - Duration::seconds(1),
        };
        assert!(!fresh.is_expired());
        assert!(stale.is_expired());
    }

    #[test]
    fn test_url_joins_base_and_path() {
        let gateway = PaypalGateway::new(
            Client::new(),
            PaypalConfig {
                client_id: "id".into(),
                secret: "secret".into(),
                base_url: "https://api-m.sandbox.paypal.com/".into(),
            },
        );
        assert_eq!(
            gateway.url("/v2/checkout/orders"),
            "https://api-m.sandbox.paypal.com/v2/checkout/orders"
        );
    }
}
