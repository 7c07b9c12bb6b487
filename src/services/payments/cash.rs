use async_trait::async_trait;
use uuid::Uuid;

use crate::models::payment::{Payment, PaymentMethod};
use crate::services::payments::PaymentGateway;
use crate::utils::errors::AppResult;

/// Pago en efectivo: sin llamada externa, siempre aceptado
#[derive(Debug, Default, Clone, Copy)]
pub struct CashGateway;

#[async_trait]
impl PaymentGateway for CashGateway {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::Cash
    }

    async fn process_payment(&self, payment: &mut Payment) -> AppResult<bool> {
        payment.transaction_id = Some(format!("CASH-{}", Uuid::new_v4()));
        log::info!("💵 Pago en efectivo registrado para reserva {}", payment.booking_id);
        Ok(true)
    }
}
