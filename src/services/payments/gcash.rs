use async_trait::async_trait;
use uuid::Uuid;

use crate::models::payment::{Payment, PaymentMethod};
use crate::services::payments::PaymentGateway;
use crate::utils::errors::AppResult;

/// Integración simulada con GCash
#[derive(Debug, Default, Clone, Copy)]
pub struct GcashGateway;

#[async_trait]
impl PaymentGateway for GcashGateway {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::Gcash
    }

    async fn process_payment(&self, payment: &mut Payment) -> AppResult<bool> {
        payment.transaction_id = Some(format!("GCASH-{}", Uuid::new_v4()));
        log::info!(
            "📱 Pago GCash (mock) de {} para reserva {}",
            payment.amount,
            payment.booking_id
        );
        Ok(true)
    }
}
