//! Controller de pagos
//!
//! Persiste el pago en `pending`, lo despacha al gateway del método elegido
//! y guarda el resultado (`completed` o `failed`).

use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::dto::payment_dto::CreatePaymentRequest;
use crate::dto::ApiResponse;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::payment::{Payment, PaymentStatus};
use crate::repositories::{BookingRepository, PaymentRepository};
use crate::services::{BookingService, PaymentGatewayRegistry};
use crate::state::AppState;
use crate::utils::errors::{forbidden_error, invalid_field, not_found_error, AppError, AppResult};
use crate::utils::validation::validate_amount;

pub struct PaymentController {
    bookings: Arc<dyn BookingRepository>,
    payments: Arc<dyn PaymentRepository>,
    gateways: Arc<PaymentGatewayRegistry>,
    booking_service: BookingService,
}

impl PaymentController {
    pub fn new(state: &AppState) -> Self {
        Self {
            bookings: state.bookings.clone(),
            payments: state.payments.clone(),
            gateways: state.gateways.clone(),
            booking_service: state.booking_service(),
        }
    }

    pub async fn pay(
        &self,
        actor: &AuthenticatedUser,
        booking_id: Uuid,
        request: CreatePaymentRequest,
    ) -> AppResult<ApiResponse<Payment>> {
        let booking = self
            .bookings
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| not_found_error("Booking", &booking_id.to_string()))?;

        if booking.user_id != actor.user_id {
            return Err(forbidden_error("pay booking", "only the customer can pay"));
        }

        request.validate()?;
        validate_amount(&request.amount).map_err(|e| invalid_field("amount", e))?;
        let gateway = self.gateways.get_payment_gateway(&request.method)?;

        let mut payment = self
            .payments
            .create(Payment::new(booking.id, request.amount, gateway.method()))
            .await?;

        let outcome = gateway.process_payment(&mut payment).await;
        let status = match &outcome {
            Ok(true) => PaymentStatus::Completed,
            Ok(false) | Err(_) => PaymentStatus::Failed,
        };
        payment.mark(status);
        self.payments.update(&payment).await?;

        match outcome {
            Ok(true) => {
                info!(
                    "💰 Pago {} completado vía {} para reserva {}",
                    payment.id, payment.method, booking.id
                );
                Ok(ApiResponse::success_with_message(payment, "Payment successful"))
            }
            Ok(false) => {
                warn!("⚠️ Pago {} rechazado por {}", payment.id, payment.method);
                Err(AppError::BadRequest("Payment failed".to_string()))
            }
            Err(e) => {
                error!("❌ Error del proveedor {} en pago {}: {}", payment.method, payment.id, e);
                Err(e)
            }
        }
    }

    pub async fn list(&self, actor: &AuthenticatedUser, booking_id: Uuid) -> AppResult<Vec<Payment>> {
        let booking = self.booking_service.get_visible(actor, booking_id).await?;
        self.payments.list_for_booking(booking.id).await
    }
}
