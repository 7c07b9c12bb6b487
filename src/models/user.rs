//! Modelo de User
//!
//! Usuarios del marketplace (clientes, propietarios y staff) y sus códigos OTP
//! de activación. Mapea a las tablas `users` y `otps`.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Tipo de usuario - mapea al ENUM user_type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "user_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    Customer,
    CarOwner,
    Staff,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Customer => "customer",
            UserType::CarOwner => "car_owner",
            UserType::Staff => "staff",
        }
    }
}

impl FromStr for UserType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(UserType::Customer),
            "car_owner" => Ok(UserType::CarOwner),
            "staff" => Ok(UserType::Staff),
            other => Err(format!("Invalid user type '{}'", other)),
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canal por el que se envía el OTP - mapea al ENUM verification_method
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "verification_method", rename_all = "snake_case")]
pub enum VerificationMethod {
    #[serde(rename = "SMS", alias = "sms")]
    Sms,
    #[serde(rename = "Email", alias = "email")]
    Email,
}

impl fmt::Display for VerificationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerificationMethod::Sms => f.write_str("SMS"),
            VerificationMethod::Email => f.write_str("Email"),
        }
    }
}

/// User - mapea exactamente a la tabla users
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub user_type: UserType,
    pub verification_method: VerificationMethod,
    pub is_staff: bool,
    pub is_active: bool,
    pub is_verified: bool,
    pub date_joined: DateTime<Utc>,
}

impl User {
    /// Nombre completo, o el contacto si no hay nombre
    pub fn display_name(&self) -> String {
        let full_name = format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or(""),
            self.last_name.as_deref().unwrap_or("")
        );
        let full_name = full_name.trim();
        if !full_name.is_empty() {
            return full_name.to_string();
        }
        self.email
            .clone()
            .or_else(|| self.phone_number.clone())
            .unwrap_or_else(|| self.id.to_string())
    }

    pub fn is_car_owner(&self) -> bool {
        self.user_type == UserType::CarOwner
    }

    pub fn is_staff_member(&self) -> bool {
        self.is_staff || self.user_type == UserType::Staff
    }
}

/// Código de un solo uso para activar la cuenta
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Otp {
    pub id: Uuid,
    pub user_id: Uuid,
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Otp {
    pub fn new(user_id: Uuid, code: String, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            code,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }
}
