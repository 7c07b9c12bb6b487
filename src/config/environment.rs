//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno y variables de configuración.

use anyhow::{anyhow, Result};
use std::env;
use std::str::FromStr;

/// Backend de persistencia
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" | "in-memory" => Ok(StorageBackend::Memory),
            other => Err(anyhow!("STORAGE desconocido: '{}'", other)),
        }
    }
}

/// Credenciales de Stripe
#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub secret_key: String,
    pub base_url: String,
}

/// Credenciales de PayPal
#[derive(Debug, Clone)]
pub struct PaypalConfig {
    pub client_id: String,
    pub secret: String,
    pub base_url: String,
}

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub jwt_secret: String,
    /// Segundos de validez del access token
    pub jwt_expiration: u64,
    /// Segundos de validez del refresh token
    pub jwt_refresh_expiration: u64,
    pub cors_origins: Vec<String>,
    pub otp_ttl_minutes: i64,
    pub bcrypt_cost: u32,
    pub max_document_bytes: usize,
    /// Timeout de las llamadas a proveedores de pago
    pub http_timeout_secs: u64,
    pub storage: StorageBackend,
    pub database_url: Option<String>,
    pub stripe: Option<StripeConfig>,
    pub paypal: Option<PaypalConfig>,
}

/// Valores de desarrollo, sin leer variables de entorno
impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            port: 3000,
            host: "0.0.0.0".to_string(),
            jwt_secret: "dev-secret-change-me".to_string(),
            jwt_expiration: 3600,
            jwt_refresh_expiration: 7 * 24 * 3600,
            cors_origins: Vec::new(),
            otp_ttl_minutes: 5,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            max_document_bytes: 5 * 1024 * 1024,
            http_timeout_secs: 15,
            storage: StorageBackend::Memory,
            database_url: None,
            stripe: None,
            paypal: None,
        }
    }
}

fn var_or<T: FromStr>(name: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow!("{} inválido ('{}'): {}", name, raw, e)),
        Err(_) => Ok(default),
    }
}

fn non_empty(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl EnvironmentConfig {
    /// Leer la configuración desde variables de entorno
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let environment = non_empty("ENVIRONMENT").unwrap_or(defaults.environment);
        let is_development = environment == "development";

        let jwt_secret = match non_empty("JWT_SECRET") {
            Some(secret) => secret,
            None if is_development => defaults.jwt_secret,
            None => return Err(anyhow!("JWT_SECRET must be set outside development")),
        };

        let storage = match non_empty("STORAGE") {
            Some(raw) => raw.parse()?,
            None => StorageBackend::Postgres,
        };
        let database_url = non_empty("DATABASE_URL");
        if storage == StorageBackend::Postgres && database_url.is_none() {
            return Err(anyhow!("DATABASE_URL must be set when STORAGE=postgres"));
        }

        let stripe = non_empty("STRIPE_SECRET_KEY").map(|secret_key| StripeConfig {
            secret_key,
            base_url: non_empty("STRIPE_BASE_URL")
                .unwrap_or_else(|| "https://api.stripe.com".to_string()),
        });

        let paypal = match (non_empty("PAYPAL_CLIENT_ID"), non_empty("PAYPAL_SECRET")) {
            (Some(client_id), Some(secret)) => Some(PaypalConfig {
                client_id,
                secret,
                base_url: non_empty("PAYPAL_BASE_URL")
                    .unwrap_or_else(|| "https://api-m.sandbox.paypal.com".to_string()),
            }),
            _ => None,
        };

        Ok(Self {
            environment,
            port: var_or("PORT", defaults.port)?,
            host: non_empty("HOST").unwrap_or(defaults.host),
            jwt_secret,
            jwt_expiration: var_or("JWT_EXPIRATION", defaults.jwt_expiration)?,
            jwt_refresh_expiration: var_or("JWT_REFRESH_EXPIRATION", defaults.jwt_refresh_expiration)?,
            cors_origins: non_empty("CORS_ORIGINS")
                .map(|raw| {
                    raw.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            otp_ttl_minutes: var_or("OTP_TTL_MINUTES", defaults.otp_ttl_minutes)?,
            bcrypt_cost: var_or("BCRYPT_COST", defaults.bcrypt_cost)?,
            max_document_bytes: var_or("MAX_DOCUMENT_BYTES", defaults.max_document_bytes)?,
            http_timeout_secs: var_or("HTTP_TIMEOUT_SECS", defaults.http_timeout_secs)?,
            storage,
            database_url,
            stripe,
            paypal,
        })
    }

    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Verificar si estamos en modo producción
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Obtener la URL del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
