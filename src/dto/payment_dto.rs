use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

/// `method` se resuelve contra el registro de gateways
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePaymentRequest {
    pub amount: Decimal,
    #[validate(length(min = 1, max = 20))]
    pub method: String,
}
