//! Capa de despacho de pagos
//!
//! Cada proveedor implementa `PaymentGateway`. El registro mapea el método
//! de pago (`"cash"`, `"stripe"`, ...) a su gateway.
//!
//! Contrato de `process_payment`:
//! - `Ok(true)`: pago aceptado
//! - `Ok(false)`: el proveedor lo rechazó
//! - `Err(_)`: fallo de transporte o del proveedor

pub mod cash;
pub mod gcash;
pub mod paypal;
pub mod stripe;

use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::config::EnvironmentConfig;
use crate::models::payment::{Payment, PaymentMethod};
use crate::utils::errors::{AppError, AppResult};

pub use cash::CashGateway;
pub use gcash::GcashGateway;
pub use paypal::PaypalGateway;
pub use stripe::StripeGateway;

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    fn method(&self) -> PaymentMethod;

    async fn process_payment(&self, payment: &mut Payment) -> AppResult<bool>;
}

#[derive(Clone, Default)]
pub struct PaymentGatewayRegistry {
    gateways: HashMap<PaymentMethod, Arc<dyn PaymentGateway>>,
}

impl PaymentGatewayRegistry {
    /// Registro vacío
    pub fn new() -> Self {
        Self::default()
    }

    /// Cash y GCash siempre; Stripe y PayPal solo si hay credenciales
    pub fn from_config(config: &EnvironmentConfig, client: Client) -> Self {
        let mut registry = Self::new()
            .with_gateway(Arc::new(CashGateway))
            .with_gateway(Arc::new(GcashGateway));

        if let Some(stripe) = &config.stripe {
            registry.register(Arc::new(StripeGateway::new(client.clone(), stripe.clone())));
        }
        if let Some(paypal) = &config.paypal {
            registry.register(Arc::new(PaypalGateway::new(client, paypal.clone())));
        }

        info!("💳 Métodos de pago habilitados: {}", registry.methods().join(", "));
        registry
    }

    pub fn register(&mut self, gateway: Arc<dyn PaymentGateway>) {
        self.gateways.insert(gateway.method(), gateway);
    }

    pub fn with_gateway(mut self, gateway: Arc<dyn PaymentGateway>) -> Self {
        self.register(gateway);
        self
    }

    pub fn get_payment_gateway(&self, method: &str) -> AppResult<Arc<dyn PaymentGateway>> {
        method
            .parse::<PaymentMethod>()
            .ok()
            .and_then(|m| self.gateways.get(&m).cloned())
            .ok_or_else(|| AppError::BadRequest("Invalid payment method".to_string()))
    }

    pub fn methods(&self) -> Vec<&'static str> {
        let mut methods: Vec<&'static str> = self.gateways.keys().map(|m| m.as_str()).collect();
        methods.sort_unstable();
        methods
    }
}
