//! Gateway de Stripe (PaymentIntents)

use async_trait::async_trait;
use num_traits::ToPrimitive;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::config::StripeConfig;
use crate::models::payment::{Payment, PaymentMethod, ProviderDetails};
use crate::services::payments::PaymentGateway;
use crate::utils::errors::{AppError, AppResult};

const CURRENCY: &str = "usd";
const DESCRIPTION: &str = "Car rental payment";

#[derive(Debug, Deserialize)]
struct PaymentIntent {
    id: String,
    status: Option<String>,
    client_secret: Option<String>,
    capture_method: Option<String>,
    confirmation_method: Option<String>,
}

pub struct StripeGateway {
    client: Client,
    config: StripeConfig,
}

impl StripeGateway {
    pub fn new(client: Client, config: StripeConfig) -> Self {
        Self { client, config }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/payment_intents", self.config.base_url.trim_end_matches('/'))
    }
}

/// Importe en centavos enteros
fn amount_in_cents(amount: Decimal) -> AppResult<i64> {
    (amount * Decimal::from(100))
        .round()
        .to_i64()
        .ok_or_else(|| AppError::BadRequest(format!("Amount {} out of range", amount)))
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::Stripe
    }

    async fn process_payment(&self, payment: &mut Payment) -> AppResult<bool> {
        let cents = amount_in_cents(payment.amount)?;
        let form = [
            ("amount", cents.to_string()),
            ("currency", CURRENCY.to_string()),
            ("description", DESCRIPTION.to_string()),
            ("automatic_payment_methods[enabled]", "true".to_string()),
        ];

        log::info!("💳 Creando PaymentIntent de {} centavos en Stripe", cents);
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.secret_key)
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::warn!("⚠️ Stripe rechazó el pago ({}): {}", status, body);
            return Ok(false);
        }

        let intent: PaymentIntent = response.json().await?;
        payment.transaction_id = Some(intent.id);
        payment.provider_details = ProviderDetails::Stripe {
            client_secret: intent.client_secret,
            capture_method: intent.capture_method,
            confirmation_method: intent.confirmation_method,
            intent_status: intent.status,
        };

        Ok(true)
    }
}
