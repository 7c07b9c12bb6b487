//! Modelo de Payment
//!
//! Pagos de reservas (`booking_payments`). Los campos propios de cada proveedor
//! viven en `provider_details`, serializado como JSONB.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::Type;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Método de pago - mapea al ENUM payment_method
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "payment_method", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Gcash,
    Stripe,
    Paypal,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 4] = [
        PaymentMethod::Cash,
        PaymentMethod::Gcash,
        PaymentMethod::Stripe,
        PaymentMethod::Paypal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Gcash => "gcash",
            PaymentMethod::Stripe => "stripe",
            PaymentMethod::Paypal => "paypal",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| format!("Invalid payment method '{}'", s))
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Estado del pago - mapea al ENUM payment_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

/// Datos específicos del proveedor
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum ProviderDetails {
    #[default]
    None,
    Stripe {
        client_secret: Option<String>,
        capture_method: Option<String>,
        confirmation_method: Option<String>,
        intent_status: Option<String>,
    },
    Paypal {
        paypal_request_id: String,
        order_id: Option<String>,
        payer: Option<serde_json::Value>,
        payment_source: Option<serde_json::Value>,
        links: Option<serde_json::Value>,
        capture_status: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Payment {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub transaction_id: Option<String>,
    pub status: PaymentStatus,
    pub provider_details: ProviderDetails,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    pub fn new(booking_id: Uuid, amount: Decimal, method: PaymentMethod) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            booking_id,
            amount,
            method,
            transaction_id: None,
            status: PaymentStatus::Pending,
            provider_details: ProviderDetails::None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn mark(&mut self, status: PaymentStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_method_from_str() {
        assert_eq!("paypal".parse::<PaymentMethod>().unwrap(), PaymentMethod::Paypal);
        assert_eq!("gcash".parse::<PaymentMethod>().unwrap(), PaymentMethod::Gcash);
        assert!("bitcoin".parse::<PaymentMethod>().is_err());
        assert!("Stripe".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_provider_details_tagging() {
        let details = ProviderDetails::Stripe {
            client_secret: Some("pi_1_secret".to_string()),
            capture_method: Some("automatic".to_string()),
            confirmation_method: None,
            intent_status: Some("requires_payment_method".to_string()),
        };
        let value = serde_json::to_value(&details).unwrap();
        assert_eq!(value["provider"], "stripe");
        assert_eq!(value["client_secret"], "pi_1_secret");

        let none: ProviderDetails = serde_json::from_str(r#"{"provider":"none"}"#).unwrap();
        assert_eq!(none, ProviderDetails::None);
    }
}
